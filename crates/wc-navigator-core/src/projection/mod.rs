pub mod debt;
pub mod engine;
pub mod working_capital;

pub use engine::{
    project, run_projection, FieldValue, PeriodResult, ProjectionSeries, SeriesSummary,
};
