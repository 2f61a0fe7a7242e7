pub mod config;
pub mod presets;

pub use config::{
    Amortization, DebtTerms, OpeningWorkingCapital, PeriodBasis, RiskShock, ScenarioConfig,
    ShockKind,
};
pub use presets::Preset;
