pub mod comparison;
pub mod families;
pub mod sweep;

pub use comparison::{compare, VariantComparison};
pub use families::{
    run_family, sustainable_growth, CustomTerms, FamilyInput, FamilyOptions, FamilyOutput,
    RunwayPoint, ScenarioFamily, SustainableGrowthOutput,
};
pub use sweep::{
    run_sweep, sweep, sweep_range, SweepInput, SweepOutput, SweepParameter, Variant,
    MAX_SWEEP_VALUES,
};
