pub mod export;
pub mod presets;
pub mod project;
pub mod sweep;
pub mod variants;

use clap::Args;
use log::debug;
use rust_decimal::Decimal;

use wc_navigator_core::{Preset, RateInput, ScenarioConfig};

use crate::input;

/// Where the base scenario comes from, plus field overrides.
#[derive(Args, Debug, Clone)]
pub struct BaseArgs {
    /// Path to a JSON or YAML scenario configuration
    #[arg(long)]
    pub input: Option<String>,

    /// Start from a preset: retail, saas, manufacturing, custom
    #[arg(long, conflicts_with = "input")]
    pub preset: Option<String>,

    /// Override the number of periods
    #[arg(long)]
    pub periods: Option<u32>,

    /// Override revenue growth per period (0.05 = 5%)
    #[arg(long)]
    pub growth: Option<Decimal>,

    /// Override days sales outstanding
    #[arg(long)]
    pub dso: Option<Decimal>,

    /// Override days payables outstanding
    #[arg(long)]
    pub dpo: Option<Decimal>,

    /// Override days inventory outstanding
    #[arg(long)]
    pub dio: Option<Decimal>,

    /// Override opening cash
    #[arg(long)]
    pub opening_cash: Option<Decimal>,
}

impl BaseArgs {
    /// Resolve the base configuration from file, preset or stdin, then apply
    /// any overrides given on the command line.
    pub fn load(&self) -> Result<ScenarioConfig, Box<dyn std::error::Error>> {
        let mut config: ScenarioConfig = if let Some(ref path) = self.input {
            input::file::read_config(path)?
        } else if let Some(ref name) = self.preset {
            name.parse::<Preset>()?.config()
        } else if let Some(data) = input::stdin::read_stdin()? {
            serde_json::from_value(data)?
        } else {
            return Err("--input <file>, --preset <name> or stdin required".into());
        };

        if let Some(periods) = self.periods {
            config.periods = periods;
        }
        if let Some(growth) = self.growth {
            config.revenue_growth = RateInput::Scalar(growth);
        }
        if let Some(dso) = self.dso {
            config.dso_days = dso;
        }
        if let Some(dpo) = self.dpo {
            config.dpo_days = dpo;
        }
        if let Some(dio) = self.dio {
            config.dio_days = dio;
        }
        if let Some(cash) = self.opening_cash {
            config.opening_cash = cash;
        }

        debug!("loaded base scenario '{}'", config.name);
        Ok(config)
    }
}
