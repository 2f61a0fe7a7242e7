use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Unknown preset: {0} (expected Retail, SaaS, Manufacturing or Custom)")]
    UnknownPreset(String),

    #[error("Unknown sweep parameter: {0}")]
    UnknownParameter(String),

    #[error("Overflow: {field} exceeds the representable range in period {period}")]
    Overflow { field: String, period: u32 },

    #[error("Scenario '{0}' has no debt terms")]
    MissingDebtTerms(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl ProjectionError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ProjectionError {
    fn from(e: serde_json::Error) -> Self {
        ProjectionError::Serialization(e.to_string())
    }
}

#[cfg(feature = "export")]
impl From<csv::Error> for ProjectionError {
    fn from(e: csv::Error) -> Self {
        ProjectionError::Export(e.to_string())
    }
}

#[cfg(feature = "export")]
impl From<std::io::Error> for ProjectionError {
    fn from(e: std::io::Error) -> Self {
        ProjectionError::Export(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_message() {
        let err = ProjectionError::invalid("dso_days", "Must be non-negative");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: dso_days: Must be non-negative"
        );
    }

    #[test]
    fn test_overflow_message_names_field_and_period() {
        let err = ProjectionError::Overflow {
            field: "revenue".into(),
            period: 97,
        };
        assert_eq!(
            err.to_string(),
            "Overflow: revenue exceeds the representable range in period 97"
        );
    }
}
