use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::ProjectionError;
use crate::projection::engine::{project, ProjectionSeries};
use crate::scenario::config::ScenarioConfig;
use crate::types::{with_metadata, ComputationOutput, RateInput};
use crate::ProjectionResult;

/// Most values a single sweep will project.
pub const MAX_SWEEP_VALUES: usize = 200;

/// A configuration field that can be swept across values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    DsoDays,
    DpoDays,
    DioDays,
    RevenueGrowth,
    NetMargin,
    CogsRatio,
    DebtPrincipal,
    InterestRate,
    OpeningCash,
    Capex,
}

impl SweepParameter {
    pub const ALL: [SweepParameter; 10] = [
        SweepParameter::DsoDays,
        SweepParameter::DpoDays,
        SweepParameter::DioDays,
        SweepParameter::RevenueGrowth,
        SweepParameter::NetMargin,
        SweepParameter::CogsRatio,
        SweepParameter::DebtPrincipal,
        SweepParameter::InterestRate,
        SweepParameter::OpeningCash,
        SweepParameter::Capex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SweepParameter::DsoDays => "dso_days",
            SweepParameter::DpoDays => "dpo_days",
            SweepParameter::DioDays => "dio_days",
            SweepParameter::RevenueGrowth => "revenue_growth",
            SweepParameter::NetMargin => "net_margin",
            SweepParameter::CogsRatio => "cogs_ratio",
            SweepParameter::DebtPrincipal => "debt_principal",
            SweepParameter::InterestRate => "interest_rate",
            SweepParameter::OpeningCash => "opening_cash",
            SweepParameter::Capex => "capex",
        }
    }

    /// Copy of `base` with this parameter set to `value`, relabelled.
    pub fn apply(&self, base: &ScenarioConfig, value: Decimal) -> ProjectionResult<ScenarioConfig> {
        let mut config = base.renamed(format!("{}={}", self.name(), value.normalize()));
        match self {
            SweepParameter::DsoDays => config.dso_days = value,
            SweepParameter::DpoDays => config.dpo_days = value,
            SweepParameter::DioDays => config.dio_days = value,
            SweepParameter::RevenueGrowth => config.revenue_growth = RateInput::Scalar(value),
            SweepParameter::NetMargin => config.net_margin = Some(RateInput::Scalar(value)),
            SweepParameter::CogsRatio => {
                config.gross_margin = None;
                config.cogs_ratio = value;
            }
            SweepParameter::DebtPrincipal | SweepParameter::InterestRate => {
                let debt = config
                    .debt
                    .as_mut()
                    .ok_or_else(|| ProjectionError::MissingDebtTerms(base.name.clone()))?;
                if *self == SweepParameter::DebtPrincipal {
                    debt.principal = value;
                } else {
                    debt.annual_interest_rate = value;
                }
            }
            SweepParameter::OpeningCash => config.opening_cash = value,
            SweepParameter::Capex => config.capex = value,
        }
        Ok(config)
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepParameter {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        let parameter = match key.as_str() {
            "dso" | "dso_days" | "ar_days" => SweepParameter::DsoDays,
            "dpo" | "dpo_days" | "ap_days" => SweepParameter::DpoDays,
            "dio" | "dio_days" | "inventory_days" => SweepParameter::DioDays,
            "growth" | "revenue_growth" => SweepParameter::RevenueGrowth,
            "margin" | "net_margin" => SweepParameter::NetMargin,
            "cogs" | "cogs_ratio" => SweepParameter::CogsRatio,
            "debt" | "debt_principal" => SweepParameter::DebtPrincipal,
            "rate" | "interest_rate" => SweepParameter::InterestRate,
            "cash" | "opening_cash" => SweepParameter::OpeningCash,
            "capex" => SweepParameter::Capex,
            _ => return Err(ProjectionError::UnknownParameter(s.to_string())),
        };
        Ok(parameter)
    }
}

/// One labelled projection within a comparison set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub label: String,
    /// Swept value, when the variant came from a one-parameter sweep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    pub series: ProjectionSeries,
}

/// Input for a one-parameter sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepInput {
    pub base: ScenarioConfig,
    pub parameter: SweepParameter,
    pub values: Vec<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutput {
    pub parameter: SweepParameter,
    pub variants: Vec<Variant>,
}

/// Run the engine once per value, in the order given.
pub fn sweep(
    base: &ScenarioConfig,
    parameter: SweepParameter,
    values: &[Decimal],
) -> ProjectionResult<Vec<Variant>> {
    if values.is_empty() {
        return Err(ProjectionError::invalid("values", "At least one sweep value required"));
    }
    if values.len() > MAX_SWEEP_VALUES {
        return Err(ProjectionError::invalid(
            "values",
            format!("At most {MAX_SWEEP_VALUES} sweep values (got {})", values.len()),
        ));
    }
    debug!("sweeping {} over {} values", parameter, values.len());

    values
        .iter()
        .map(|&value| {
            let config = parameter.apply(base, value)?;
            let series = project(&config)?;
            Ok(Variant {
                label: config.name,
                value: Some(value),
                series,
            })
        })
        .collect()
}

/// Sweep wrapped in the standard output envelope.
pub fn run_sweep(input: &SweepInput) -> ProjectionResult<ComputationOutput<SweepOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let variants = sweep(&input.base, input.parameter, &input.values)?;
    for v in &variants {
        if let Some(deficit) = v.series.summary.first_deficit_period {
            warnings.push(format!(
                "{}: cash goes negative in {} {}",
                v.label,
                v.series.period_basis.label(),
                deficit
            ));
        }
    }

    let output = SweepOutput {
        parameter: input.parameter,
        variants,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-parameter scenario sweep",
        &serde_json::json!({
            "base": input.base.name,
            "parameter": input.parameter.name(),
            "num_values": input.values.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Values from `min` to `max` inclusive in steps of `step`; `max` is
/// appended when the step does not land on it. Fails on `step` when the
/// range would hold more than `MAX_SWEEP_VALUES` values.
pub fn sweep_range(min: Decimal, max: Decimal, step: Decimal) -> ProjectionResult<Vec<Decimal>> {
    if step <= Decimal::ZERO {
        return Err(ProjectionError::invalid("step", "Step must be positive"));
    }
    if min > max {
        return Err(ProjectionError::invalid("min", "Min must be <= max"));
    }

    let too_many = || {
        ProjectionError::invalid(
            "step",
            format!("Range would exceed {MAX_SWEEP_VALUES} sweep values"),
        )
    };
    let steps = max
        .checked_sub(min)
        .and_then(|span| span.checked_div(step))
        .ok_or_else(too_many)?
        .floor();
    // Room for the appended `max`
    if steps >= Decimal::from(MAX_SWEEP_VALUES - 1) {
        return Err(too_many());
    }

    let mut values = Vec::new();
    let mut current = Some(min);
    while let Some(value) = current.filter(|v| *v <= max) {
        values.push(value);
        current = value.checked_add(step);
    }
    if let Some(&last) = values.last() {
        if last < max {
            values.push(max);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::config::{Amortization, DebtTerms};
    use rust_decimal_macros::dec;

    fn base() -> ScenarioConfig {
        let mut config = ScenarioConfig::new("Base", 4, dec!(500_000));
        config.revenue_growth = RateInput::Scalar(dec!(0.05));
        config.net_margin = Some(RateInput::Scalar(dec!(0.10)));
        config.cogs_ratio = dec!(0.5);
        config.dso_days = dec!(45);
        config.dpo_days = dec!(30);
        config.dio_days = dec!(30);
        config
    }

    #[test]
    fn test_sweep_preserves_order_and_labels() {
        let variants = sweep(
            &base(),
            SweepParameter::DsoDays,
            &[dec!(30), dec!(45), dec!(60), dec!(90)],
        )
        .unwrap();
        let labels: Vec<&str> = variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec!["dso_days=30", "dso_days=45", "dso_days=60", "dso_days=90"]);
        assert_eq!(variants[2].value, Some(dec!(60)));
        assert_eq!(variants[2].series.scenario, "dso_days=60");
    }

    #[test]
    fn test_higher_dso_lowers_ending_cash() {
        let variants = sweep(
            &base(),
            SweepParameter::DsoDays,
            &[dec!(30), dec!(45), dec!(60), dec!(90)],
        )
        .unwrap();
        for pair in variants.windows(2) {
            assert!(pair[1].series.ending_cash() < pair[0].series.ending_cash());
        }
    }

    #[test]
    fn test_debt_parameter_requires_debt() {
        let err = sweep(&base(), SweepParameter::DebtPrincipal, &[dec!(10_000)]).unwrap_err();
        assert!(matches!(err, ProjectionError::MissingDebtTerms(_)));
    }

    #[test]
    fn test_interest_rate_sweep() {
        let mut config = base();
        config.debt = Some(DebtTerms {
            principal: dec!(100_000),
            annual_interest_rate: dec!(0.05),
            amortization: Amortization::InterestOnly,
        });
        let variants = sweep(&config, SweepParameter::InterestRate, &[dec!(0.05), dec!(0.10)]).unwrap();
        assert_eq!(variants[0].series.periods[0].interest_payment, dec!(5_000));
        assert_eq!(variants[1].series.periods[0].interest_payment, dec!(10_000));
    }

    #[test]
    fn test_invalid_sweep_value_fails() {
        assert!(sweep(&base(), SweepParameter::DsoDays, &[dec!(-5)]).is_err());
        assert!(sweep(&base(), SweepParameter::DsoDays, &[]).is_err());
    }

    #[test]
    fn test_parameter_parsing() {
        assert_eq!("DSO".parse::<SweepParameter>().unwrap(), SweepParameter::DsoDays);
        assert_eq!(
            "inventory-days".parse::<SweepParameter>().unwrap(),
            SweepParameter::DioDays
        );
        for p in SweepParameter::ALL {
            assert_eq!(p.name().parse::<SweepParameter>().unwrap(), p);
        }
        assert!("ebitda".parse::<SweepParameter>().is_err());
    }

    #[test]
    fn test_sweep_range_includes_max() {
        let values = sweep_range(dec!(30), dec!(90), dec!(25)).unwrap();
        assert_eq!(values, vec![dec!(30), dec!(55), dec!(80), dec!(90)]);
        assert!(sweep_range(dec!(1), dec!(0), dec!(1)).is_err());
        assert!(sweep_range(dec!(0), dec!(1), dec!(0)).is_err());
    }

    #[test]
    fn test_sweep_range_capped() {
        let values = sweep_range(dec!(0), dec!(197), dec!(1)).unwrap();
        assert_eq!(values.len(), 198);
        let values = sweep_range(dec!(0), dec!(197.5), dec!(1)).unwrap();
        assert_eq!(values.len(), 199);

        let field_of = |result: ProjectionResult<Vec<Decimal>>| match result {
            Err(ProjectionError::InvalidConfiguration { field, .. }) => field,
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        };
        assert_eq!(field_of(sweep_range(dec!(0), dec!(199), dec!(1))), "step");
        assert_eq!(field_of(sweep_range(dec!(0), dec!(1_000_000), dec!(0.0001))), "step");
        assert_eq!(field_of(sweep_range(Decimal::MIN, Decimal::MAX, dec!(1))), "step");

        // The step after the last value would overflow
        let values = sweep_range(Decimal::ZERO, Decimal::MAX, Decimal::MAX).unwrap();
        assert_eq!(values, vec![Decimal::ZERO, Decimal::MAX]);
    }

    #[test]
    fn test_sweep_rejects_too_many_values() {
        let values = vec![dec!(45); MAX_SWEEP_VALUES + 1];
        match sweep(&base(), SweepParameter::DsoDays, &values) {
            Err(ProjectionError::InvalidConfiguration { field, .. }) => assert_eq!(field, "values"),
            other => panic!("expected InvalidConfiguration, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn test_run_sweep_envelope() {
        let input = SweepInput {
            base: base(),
            parameter: SweepParameter::RevenueGrowth,
            values: vec![dec!(0), dec!(0.1)],
        };
        let out = run_sweep(&input).unwrap();
        assert_eq!(out.result.variants.len(), 2);
        assert_eq!(out.assumptions["parameter"], "revenue_growth");
    }
}
