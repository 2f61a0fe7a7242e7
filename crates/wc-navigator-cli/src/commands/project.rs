use clap::Args;
use log::info;
use serde_json::Value;

use wc_navigator_core::projection;

use super::BaseArgs;

/// Arguments for a single-scenario projection
#[derive(Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub base: BaseArgs,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.base.load()?;
    let result = projection::run_projection(&config)?;
    info!(
        "projected '{}': ending cash {}",
        config.name,
        result.result.ending_cash().round_dp(2)
    );
    Ok(serde_json::to_value(result)?)
}
