use clap::Args;
use log::info;
use rust_decimal::Decimal;
use serde_json::Value;

use wc_navigator_core::variants::families::{
    self, CustomTerms, FamilyInput, FamilyOptions, ScenarioFamily,
};

use super::BaseArgs;

/// Arguments for a scenario family comparison
#[derive(Args)]
pub struct VariantsArgs {
    #[command(flatten)]
    pub base: BaseArgs,

    /// Scenario family: wc, growth, risk, debt
    #[arg(long, default_value = "wc")]
    pub family: String,

    #[command(flatten)]
    pub options: FamilyOptionArgs,
}

/// Options shared by every command that builds a family.
#[derive(Args, Debug, Clone)]
pub struct FamilyOptionArgs {
    /// Growth rate tested by the growth family (default 0.05)
    #[arg(long)]
    pub growth_rate: Option<Decimal>,

    /// DSO for an extra custom working-capital variant
    #[arg(long, requires_all = ["custom_dpo", "custom_dio"])]
    pub custom_dso: Option<Decimal>,

    /// DPO for an extra custom working-capital variant
    #[arg(long)]
    pub custom_dpo: Option<Decimal>,

    /// DIO for an extra custom working-capital variant
    #[arg(long)]
    pub custom_dio: Option<Decimal>,
}

impl FamilyOptionArgs {
    pub fn to_options(&self) -> FamilyOptions {
        let custom_terms = match (self.custom_dso, self.custom_dpo, self.custom_dio) {
            (Some(dso_days), Some(dpo_days), Some(dio_days)) => Some(CustomTerms {
                dso_days,
                dpo_days,
                dio_days,
            }),
            _ => None,
        };
        FamilyOptions {
            custom_terms,
            growth_rate: self.growth_rate,
        }
    }
}

/// Arguments for the runway / sustainable growth analysis
#[derive(Args)]
pub struct RunwayArgs {
    #[command(flatten)]
    pub base: BaseArgs,
}

pub fn run_variants(args: VariantsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let family: ScenarioFamily = args.family.parse()?;
    let input = FamilyInput {
        base: args.base.load()?,
        family,
        options: args.options.to_options(),
    };
    let result = families::run_family(&input)?;
    info!("{}: {} scenarios compared", family, result.result.variants.len());
    Ok(serde_json::to_value(result)?)
}

pub fn run_runway(args: RunwayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base = args.base.load()?;
    let result = families::sustainable_growth(&base)?;
    Ok(serde_json::to_value(result)?)
}
