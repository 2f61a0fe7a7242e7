use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Day counts (DSO, DPO, DIO, cash conversion cycle)
pub type Days = Decimal;

// ---------------------------------------------------------------------------
// Ratio sentinel
// ---------------------------------------------------------------------------

/// A ratio that may be undefined because its denominator is zero.
///
/// `Undefined` stands for "unbounded" and is displayed as `N/A`. It orders
/// above every defined value, so a coverage ratio with nothing to cover
/// never registers as the weakest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ratio {
    Value(Decimal),
    Undefined,
}

impl Ratio {
    /// `numerator / denominator`, or `Undefined` when the denominator is zero
    /// or the quotient is out of range.
    pub fn of(numerator: Decimal, denominator: Decimal) -> Self {
        numerator
            .checked_div(denominator)
            .map_or(Ratio::Undefined, Ratio::Value)
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Ratio::Value(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Ratio::Undefined)
    }

    /// True when the ratio is defined and strictly below `threshold`.
    pub fn is_below(&self, threshold: Decimal) -> bool {
        matches!(self, Ratio::Value(v) if *v < threshold)
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Ratio::Value(a), Ratio::Value(b)) => a.cmp(b),
            (Ratio::Value(_), Ratio::Undefined) => Ordering::Less,
            (Ratio::Undefined, Ratio::Value(_)) => Ordering::Greater,
            (Ratio::Undefined, Ratio::Undefined) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Value(v) => write!(f, "{v}"),
            Ratio::Undefined => f.write_str("N/A"),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ratio::Value(v) => Serialize::serialize(v, serializer),
            Ratio::Undefined => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(Decimal),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Ratio::Value(v)),
            Raw::Text(s) if s.eq_ignore_ascii_case("n/a") => Ok(Ratio::Undefined),
            Raw::Text(s) => s
                .parse::<Decimal>()
                .map(Ratio::Value)
                .map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Scalar-or-schedule rate input
// ---------------------------------------------------------------------------

/// A rate that is either flat across the horizon or given per period.
///
/// A schedule shorter than the horizon holds its last value for the
/// remaining periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateInput {
    Scalar(Rate),
    Schedule(Vec<Rate>),
}

impl Default for RateInput {
    fn default() -> Self {
        RateInput::Scalar(Decimal::ZERO)
    }
}

impl From<Rate> for RateInput {
    fn from(rate: Rate) -> Self {
        RateInput::Scalar(rate)
    }
}

impl From<Vec<Rate>> for RateInput {
    fn from(rates: Vec<Rate>) -> Self {
        RateInput::Schedule(rates)
    }
}

impl RateInput {
    /// Expand to exactly `periods` values. An empty schedule resolves to
    /// zeros; validation rejects it before this is reached.
    pub fn resolve(&self, periods: usize) -> Vec<Rate> {
        match self {
            RateInput::Scalar(r) => vec![*r; periods],
            RateInput::Schedule(rates) => {
                let last = rates.last().copied().unwrap_or(Decimal::ZERO);
                (0..periods)
                    .map(|i| rates.get(i).copied().unwrap_or(last))
                    .collect()
            }
        }
    }

    /// Every rate the input mentions, for validation.
    pub fn values(&self) -> &[Rate] {
        match self {
            RateInput::Scalar(r) => std::slice::from_ref(r),
            RateInput::Schedule(rates) => rates,
        }
    }
}

// ---------------------------------------------------------------------------
// Output envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ratio_zero_denominator_is_undefined() {
        assert_eq!(Ratio::of(dec!(10), Decimal::ZERO), Ratio::Undefined);
        assert_eq!(Ratio::of(dec!(10), dec!(4)), Ratio::Value(dec!(2.5)));
    }

    #[test]
    fn test_undefined_orders_above_values() {
        assert!(Ratio::Undefined > Ratio::Value(dec!(1_000_000)));
        let lowest = [Ratio::Undefined, Ratio::Value(dec!(1.2)), Ratio::Value(dec!(0.8))]
            .into_iter()
            .min()
            .unwrap();
        assert_eq!(lowest, Ratio::Value(dec!(0.8)));
    }

    #[test]
    fn test_ratio_serializes_undefined_as_na() {
        let json = serde_json::to_string(&Ratio::Undefined).unwrap();
        assert_eq!(json, "\"N/A\"");
        let back: Ratio = serde_json::from_str(&json).unwrap();
        assert!(back.is_undefined());

        let defined: Ratio = serde_json::from_str("\"1.5\"").unwrap();
        assert_eq!(defined, Ratio::Value(dec!(1.5)));
    }

    #[test]
    fn test_ratio_of_out_of_range_quotient_is_undefined() {
        assert_eq!(Ratio::of(Decimal::MAX, dec!(0.0001)), Ratio::Undefined);
        assert_eq!(Ratio::of(dec!(3), Decimal::ZERO), Ratio::Undefined);
        assert_eq!(Ratio::of(dec!(3), dec!(2)), Ratio::Value(dec!(1.5)));
    }

    #[test]
    fn test_defined_ratio_serializes_as_decimal_string() {
        let json = serde_json::to_string(&Ratio::Value(dec!(2.25))).unwrap();
        assert_eq!(json, "\"2.25\"");
        let back: Ratio = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Ratio::Value(dec!(2.25)));
    }

    #[test]
    fn test_schedule_holds_last_value() {
        let input = RateInput::Schedule(vec![dec!(0.10), dec!(0.05)]);
        assert_eq!(
            input.resolve(4),
            vec![dec!(0.10), dec!(0.05), dec!(0.05), dec!(0.05)]
        );
    }

    #[test]
    fn test_schedule_longer_than_horizon_is_truncated() {
        let input = RateInput::Schedule(vec![dec!(0.1), dec!(0.2), dec!(0.3)]);
        assert_eq!(input.resolve(2), vec![dec!(0.1), dec!(0.2)]);
    }

    #[test]
    fn test_rate_input_accepts_scalar_or_list() {
        let scalar: RateInput = serde_json::from_str("\"0.02\"").unwrap();
        assert_eq!(scalar, RateInput::Scalar(dec!(0.02)));
        let schedule: RateInput = serde_json::from_str("[\"0.1\", \"0.2\"]").unwrap();
        assert_eq!(schedule, RateInput::Schedule(vec![dec!(0.1), dec!(0.2)]));
    }
}
