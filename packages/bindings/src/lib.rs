use napi::Result as NapiResult;
use napi_derive::napi;

use wc_navigator_core::variants::families::{self, FamilyInput};
use wc_navigator_core::variants::sweep::{self, SweepInput};
use wc_navigator_core::{export, projection, Preset, ScenarioConfig};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn project_scenario(input_json: String) -> NapiResult<String> {
    let config: ScenarioConfig = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = projection::run_projection(&config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn preset_config(name: String) -> NapiResult<String> {
    let preset: Preset = name.parse().map_err(to_napi_error)?;
    serde_json::to_string(&preset.config()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[napi]
pub fn run_sweep(input_json: String) -> NapiResult<String> {
    let input: SweepInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sweep::run_sweep(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_family(input_json: String) -> NapiResult<String> {
    let input: FamilyInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = families::run_family(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sustainable_growth(input_json: String) -> NapiResult<String> {
    let config: ScenarioConfig = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = families::sustainable_growth(&config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// CSV text of every scenario in a family, one row per scenario and period.
#[napi]
pub fn export_csv(input_json: String) -> NapiResult<String> {
    let input: FamilyInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = families::run_family(&input).map_err(to_napi_error)?;
    export::variants_to_csv(&output.result.variants).map_err(to_napi_error)
}
