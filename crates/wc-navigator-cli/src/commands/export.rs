use clap::Args;
use log::info;
use serde_json::{json, Value};
use std::fs::File;
use std::io::BufWriter;

use wc_navigator_core::export;
use wc_navigator_core::variants::families::{self, FamilyInput, ScenarioFamily};

use super::variants::FamilyOptionArgs;
use super::BaseArgs;

/// Arguments for exporting a family to CSV
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub base: BaseArgs,

    /// Scenario family to export: wc, growth, risk, debt
    #[arg(long, default_value = "wc")]
    pub family: String,

    #[command(flatten)]
    pub options: FamilyOptionArgs,

    /// Destination file (default wc_analysis_<YYYYMMDD_HHMM>.csv)
    #[arg(long)]
    pub out: Option<String>,
}

fn default_filename() -> String {
    format!("wc_analysis_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M"))
}

pub fn run_export(args: ExportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let family: ScenarioFamily = args.family.parse()?;
    let input = FamilyInput {
        base: args.base.load()?,
        family,
        options: args.options.to_options(),
    };
    let output = families::run_family(&input)?.result;

    let path = args.out.unwrap_or_else(default_filename);
    let file = File::create(&path).map_err(|e| format!("Failed to create '{}': {}", path, e))?;
    export::write_variants_csv(&output.variants, BufWriter::new(file))?;

    let rows: usize = output.variants.iter().map(|v| v.series.len()).sum();
    info!("wrote {} rows to {}", rows, path);

    let scenarios: Vec<&str> = output.variants.iter().map(|v| v.label.as_str()).collect();
    Ok(json!({
        "result": {
            "file": path,
            "family": family.title(),
            "scenarios": scenarios,
            "rows": rows,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filename_pattern() {
        let name = default_filename();
        assert!(name.starts_with("wc_analysis_"));
        assert!(name.ends_with(".csv"));
        // wc_analysis_ + YYYYMMDD_HHMM + .csv
        assert_eq!(name.len(), "wc_analysis_".len() + 13 + ".csv".len());
    }
}
