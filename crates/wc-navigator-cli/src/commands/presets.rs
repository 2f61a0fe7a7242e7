use clap::Args;
use serde_json::{json, Value};

use wc_navigator_core::Preset;

/// Arguments for listing presets
#[derive(Args)]
pub struct PresetsArgs {
    /// Preset to print in full; lists all presets when omitted
    pub name: Option<String>,
}

pub fn run_presets(args: PresetsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    match args.name {
        Some(ref name) => {
            let preset: Preset = name.parse()?;
            Ok(json!({
                "preset": preset.name(),
                "description": preset.description(),
                "result": preset.config(),
            }))
        }
        None => {
            let presets: Vec<Value> = Preset::ALL
                .iter()
                .map(|p| {
                    let config = p.config();
                    json!({
                        "name": p.name(),
                        "description": p.description(),
                        "starting_revenue": config.starting_revenue,
                        "dso_days": config.dso_days,
                        "dpo_days": config.dpo_days,
                        "dio_days": config.dio_days,
                    })
                })
                .collect();
            Ok(json!({ "results": presets }))
        }
    }
}
