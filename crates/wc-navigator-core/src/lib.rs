pub mod error;
pub mod projection;
pub mod scenario;
pub mod types;

#[cfg(feature = "variants")]
pub mod variants;

#[cfg(feature = "export")]
pub mod export;

pub use error::ProjectionError;
pub use projection::{project, run_projection, PeriodResult, ProjectionSeries};
pub use scenario::{Preset, ScenarioConfig};
pub use types::*;

/// Standard result type for all projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;
