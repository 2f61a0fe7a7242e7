use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::types::{Days, Money, Rate, RateInput};
use crate::ProjectionResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Ceiling for a COGS ratio that drifts upward through `cogs_ratio_growth`.
pub const MAX_COGS_RATIO: Rate = dec!(0.95);

/// Longest horizon accepted (50 years of monthly periods).
pub const MAX_PERIODS: u32 = 600;

/// Ceiling for any amount, input or projected. Keeps every derived figure
/// and running total inside `Decimal` range.
pub const MAX_AMOUNT: Money = dec!(100_000_000_000_000_000_000);

/// Ceiling for DSO, DPO, DIO and collection delays (ten years).
pub const MAX_DAYS: Days = dec!(3650);

/// Ceiling for the annual interest rate on debt (1000%).
pub const MAX_ANNUAL_INTEREST_RATE: Rate = dec!(10);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Length of one projection period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodBasis {
    /// 365-day years
    #[default]
    Annual,
    /// 90-day quarters
    Quarterly,
    /// 30-day months
    Monthly,
}

impl PeriodBasis {
    /// Days used to convert DSO/DPO/DIO into balances.
    pub fn days(&self) -> Days {
        match self {
            PeriodBasis::Annual => dec!(365),
            PeriodBasis::Quarterly => dec!(90),
            PeriodBasis::Monthly => dec!(30),
        }
    }

    pub fn periods_per_year(&self) -> Decimal {
        match self {
            PeriodBasis::Annual => dec!(1),
            PeriodBasis::Quarterly => dec!(4),
            PeriodBasis::Monthly => dec!(12),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PeriodBasis::Annual => "year",
            PeriodBasis::Quarterly => "quarter",
            PeriodBasis::Monthly => "month",
        }
    }
}

/// Working-capital balances in place before the first period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OpeningWorkingCapital {
    /// A business starting from nothing: every opening balance is zero.
    #[default]
    Zero,
    /// A business already operating at its period-0 terms, so period 0
    /// shows no working-capital build.
    SteadyState,
    Explicit {
        accounts_receivable: Money,
        inventory: Money,
        accounts_payable: Money,
    },
}

/// How principal is repaid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Amortization {
    /// Equal principal instalments over `term_periods`.
    StraightLine { term_periods: u32 },
    /// Constant total payment (annuity); principal is payment less interest.
    LevelPayment { term_periods: u32 },
    /// Interest only; the principal stays outstanding.
    InterestOnly,
    /// Explicit principal payment per period; zero past the end of the list.
    Schedule { payments: Vec<Money> },
}

/// Term loan outstanding at the start of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtTerms {
    pub principal: Money,
    pub annual_interest_rate: Rate,
    pub amortization: Amortization,
}

/// What a risk shock overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShockKind {
    /// Revenue for the period falls by `pct` (0.2 = 20% drop).
    RevenueDrop { pct: Rate },
    /// Customers pay `extra_days` later than the configured DSO.
    CollectionDelay { extra_days: Days },
    /// An unplanned cash payment out of the closing balance.
    CashOutflow { amount: Money },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskShock {
    /// Zero-based period index at which the shock first applies
    pub period: u32,
    pub kind: ShockKind,
    /// Apply at every period from `period` onward instead of once
    #[serde(default)]
    pub recurring: bool,
}

impl RiskShock {
    pub fn is_active(&self, period: u32) -> bool {
        if self.recurring {
            period >= self.period
        } else {
            period == self.period
        }
    }
}

/// Complete, immutable description of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Label carried into outputs and exports
    #[serde(default = "default_name")]
    pub name: String,
    /// Number of projection periods (>= 1)
    pub periods: u32,
    #[serde(default)]
    pub period_basis: PeriodBasis,
    /// Revenue in period 0
    pub starting_revenue: Money,
    /// Revenue growth per period
    #[serde(default)]
    pub revenue_growth: RateInput,
    /// Net income as % of revenue. When absent, net income is built up
    /// from COGS, operating expenses and tax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_margin: Option<RateInput>,
    /// Gross margin; takes precedence over `cogs_ratio`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_margin: Option<RateInput>,
    /// COGS as % of revenue when no gross margin is given
    #[serde(default)]
    pub cogs_ratio: Rate,
    /// Compound per-period drift of the COGS ratio (cost inflation)
    #[serde(default)]
    pub cogs_ratio_growth: Rate,
    /// Operating expenses in period 0
    #[serde(default)]
    pub operating_expenses: Money,
    #[serde(default)]
    pub opex_growth: Rate,
    #[serde(default)]
    pub tax_rate: Rate,
    #[serde(default)]
    pub dso_days: Days,
    #[serde(default)]
    pub dpo_days: Days,
    #[serde(default)]
    pub dio_days: Days,
    #[serde(default)]
    pub opening_working_capital: OpeningWorkingCapital,
    /// Non-cash charge added back to operating cash flow each period
    #[serde(default)]
    pub depreciation: Money,
    #[serde(default)]
    pub capex: Money,
    #[serde(default)]
    pub opening_cash: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt: Option<DebtTerms>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shocks: Vec<RiskShock>,
}

fn default_name() -> String {
    "Custom".to_string()
}

impl ScenarioConfig {
    /// A bare configuration: flat revenue, no costs, no debt.
    pub fn new(name: impl Into<String>, periods: u32, starting_revenue: Money) -> Self {
        Self {
            name: name.into(),
            periods,
            period_basis: PeriodBasis::default(),
            starting_revenue,
            revenue_growth: RateInput::default(),
            net_margin: None,
            gross_margin: None,
            cogs_ratio: Decimal::ZERO,
            cogs_ratio_growth: Decimal::ZERO,
            operating_expenses: Decimal::ZERO,
            opex_growth: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            dso_days: Decimal::ZERO,
            dpo_days: Decimal::ZERO,
            dio_days: Decimal::ZERO,
            opening_working_capital: OpeningWorkingCapital::default(),
            depreciation: Decimal::ZERO,
            capex: Decimal::ZERO,
            opening_cash: Decimal::ZERO,
            debt: None,
            shocks: Vec::new(),
        }
    }

    /// Copy of this configuration under a different label.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Cash conversion cycle implied by the configured terms.
    pub fn terms_ccc(&self) -> Days {
        self.dso_days + self.dio_days - self.dpo_days
    }

    /// Check every field, failing on the first one out of range.
    pub fn validate(&self) -> ProjectionResult<()> {
        if self.periods == 0 {
            return Err(ProjectionError::invalid("periods", "Must be at least 1"));
        }
        if self.periods > MAX_PERIODS {
            return Err(ProjectionError::invalid(
                "periods",
                format!("Must be at most {MAX_PERIODS}"),
            ));
        }

        validate_bounded("starting_revenue", self.starting_revenue, MAX_AMOUNT)?;
        validate_rate_input("revenue_growth", &self.revenue_growth, None)?;
        if let Some(ref margin) = self.net_margin {
            validate_rate_input("net_margin", margin, Some(Decimal::ONE))?;
        }
        if let Some(ref margin) = self.gross_margin {
            validate_rate_input("gross_margin", margin, Some(Decimal::ONE))?;
        }
        validate_rate("cogs_ratio", self.cogs_ratio)?;
        validate_non_negative("cogs_ratio_growth", self.cogs_ratio_growth)?;
        validate_bounded("operating_expenses", self.operating_expenses, MAX_AMOUNT)?;
        validate_non_negative("opex_growth", self.opex_growth)?;
        validate_rate("tax_rate", self.tax_rate)?;
        validate_bounded("dso_days", self.dso_days, MAX_DAYS)?;
        validate_bounded("dpo_days", self.dpo_days, MAX_DAYS)?;
        validate_bounded("dio_days", self.dio_days, MAX_DAYS)?;
        validate_bounded("depreciation", self.depreciation, MAX_AMOUNT)?;
        validate_bounded("capex", self.capex, MAX_AMOUNT)?;
        validate_bounded("opening_cash", self.opening_cash, MAX_AMOUNT)?;

        if let OpeningWorkingCapital::Explicit {
            accounts_receivable,
            inventory,
            accounts_payable,
        } = self.opening_working_capital
        {
            validate_bounded(
                "opening_working_capital.accounts_receivable",
                accounts_receivable,
                MAX_AMOUNT,
            )?;
            validate_bounded("opening_working_capital.inventory", inventory, MAX_AMOUNT)?;
            validate_bounded(
                "opening_working_capital.accounts_payable",
                accounts_payable,
                MAX_AMOUNT,
            )?;
        }

        if let Some(ref debt) = self.debt {
            validate_debt(debt)?;
        }

        for (idx, shock) in self.shocks.iter().enumerate() {
            validate_shock(idx, shock, self.periods)?;
        }

        Ok(())
    }

    /// Resolve every scalar-or-schedule input to one value per period.
    ///
    /// Fails with `Overflow` when compounding operating expenses leave the
    /// representable range.
    pub(crate) fn resolve_drivers(&self) -> ProjectionResult<ResolvedDrivers> {
        let n = self.periods as usize;

        let growth = self.revenue_growth.resolve(n);
        let net_margin = self.net_margin.as_ref().map(|m| m.resolve(n));

        let mut cogs_capped = false;
        let cogs_ratio = match self.gross_margin {
            Some(ref gm) => gm.resolve(n).into_iter().map(|m| Decimal::ONE - m).collect(),
            None => {
                let mut ratio = self.cogs_ratio;
                let mut ratios = Vec::with_capacity(n);
                for i in 0..n {
                    if i > 0 {
                        let drifted = Decimal::ONE
                            .checked_add(self.cogs_ratio_growth)
                            .and_then(|factor| ratio.checked_mul(factor));
                        ratio = match drifted {
                            Some(d) if d <= MAX_COGS_RATIO || d <= ratio => d,
                            _ => {
                                cogs_capped = true;
                                MAX_COGS_RATIO.max(ratio)
                            }
                        };
                    }
                    ratios.push(ratio);
                }
                ratios
            }
        };

        let mut opex = Vec::with_capacity(n);
        let mut current = self.operating_expenses;
        for i in 0..n {
            if i > 0 {
                current = compound(current, self.opex_growth, "operating_expenses", i as u32)?;
            }
            opex.push(current);
        }

        Ok(ResolvedDrivers {
            growth,
            net_margin,
            cogs_ratio,
            opex,
            cogs_capped,
        })
    }
}

/// Per-period drivers, resolved once before the recurrence runs.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedDrivers {
    pub growth: Vec<Rate>,
    pub net_margin: Option<Vec<Rate>>,
    pub cogs_ratio: Vec<Rate>,
    pub opex: Vec<Money>,
    pub cogs_capped: bool,
}

/// `value × (1 + rate)`, failing once the result passes `MAX_AMOUNT`.
pub(crate) fn compound(
    value: Money,
    rate: Rate,
    field: &str,
    period: u32,
) -> ProjectionResult<Money> {
    Decimal::ONE
        .checked_add(rate)
        .and_then(|factor| value.checked_mul(factor))
        .filter(|v| *v <= MAX_AMOUNT)
        .ok_or_else(|| ProjectionError::Overflow {
            field: field.to_string(),
            period,
        })
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_non_negative(field: &str, value: Decimal) -> ProjectionResult<()> {
    if value < Decimal::ZERO {
        return Err(ProjectionError::invalid(field, "Must be non-negative"));
    }
    Ok(())
}

fn validate_bounded(field: &str, value: Decimal, max: Decimal) -> ProjectionResult<()> {
    validate_non_negative(field, value)?;
    if value > max {
        return Err(ProjectionError::invalid(
            field,
            format!("Must be at most {max} (got {value})"),
        ));
    }
    Ok(())
}

fn validate_rate(field: &str, value: Rate) -> ProjectionResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ProjectionError::invalid(
            field,
            format!("Must be between 0 and 1 (got {value})"),
        ));
    }
    Ok(())
}

fn validate_rate_input(field: &str, input: &RateInput, max: Option<Rate>) -> ProjectionResult<()> {
    if let RateInput::Schedule(rates) = input {
        if rates.is_empty() {
            return Err(ProjectionError::invalid(field, "Schedule must not be empty"));
        }
    }
    for (idx, &rate) in input.values().iter().enumerate() {
        let name = match input {
            RateInput::Scalar(_) => field.to_string(),
            RateInput::Schedule(_) => format!("{field}[{idx}]"),
        };
        match max {
            Some(_) => validate_rate(&name, rate)?,
            None => validate_non_negative(&name, rate)?,
        }
    }
    Ok(())
}

fn validate_debt(debt: &DebtTerms) -> ProjectionResult<()> {
    validate_bounded("debt.principal", debt.principal, MAX_AMOUNT)?;
    validate_bounded(
        "debt.annual_interest_rate",
        debt.annual_interest_rate,
        MAX_ANNUAL_INTEREST_RATE,
    )?;
    match debt.amortization {
        Amortization::StraightLine { term_periods } | Amortization::LevelPayment { term_periods } => {
            if term_periods == 0 {
                return Err(ProjectionError::invalid(
                    "debt.amortization.term_periods",
                    "Must be at least 1",
                ));
            }
        }
        Amortization::Schedule { ref payments } => {
            for (idx, &p) in payments.iter().enumerate() {
                validate_non_negative(&format!("debt.amortization.payments[{idx}]"), p)?;
            }
        }
        Amortization::InterestOnly => {}
    }
    Ok(())
}

fn validate_shock(idx: usize, shock: &RiskShock, periods: u32) -> ProjectionResult<()> {
    if shock.period >= periods {
        return Err(ProjectionError::invalid(
            format!("shocks[{idx}].period"),
            format!("Must be below the period count {periods}"),
        ));
    }
    match shock.kind {
        ShockKind::RevenueDrop { pct } => validate_rate(&format!("shocks[{idx}].pct"), pct),
        ShockKind::CollectionDelay { extra_days } => {
            validate_bounded(&format!("shocks[{idx}].extra_days"), extra_days, MAX_DAYS)
        }
        ShockKind::CashOutflow { amount } => {
            validate_bounded(&format!("shocks[{idx}].amount"), amount, MAX_AMOUNT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> ScenarioConfig {
        let mut config = ScenarioConfig::new("Sample", 6, dec!(100_000));
        config.revenue_growth = RateInput::Scalar(dec!(0.05));
        config.cogs_ratio = dec!(0.6);
        config.dso_days = dec!(45);
        config
    }

    fn invalid_field(config: &ScenarioConfig) -> String {
        match config.validate() {
            Err(ProjectionError::InvalidConfiguration { field, .. }) => field,
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_sample_is_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_zero_periods_rejected() {
        let mut config = sample();
        config.periods = 0;
        assert_eq!(invalid_field(&config), "periods");
    }

    #[test]
    fn test_negative_dso_rejected() {
        let mut config = sample();
        config.dso_days = dec!(-1);
        assert_eq!(invalid_field(&config), "dso_days");
    }

    #[test]
    fn test_empty_schedule_rejected() {
        let mut config = sample();
        config.revenue_growth = RateInput::Schedule(vec![]);
        assert_eq!(invalid_field(&config), "revenue_growth");
    }

    #[test]
    fn test_schedule_entry_named_by_index() {
        let mut config = sample();
        config.net_margin = Some(RateInput::Schedule(vec![dec!(0.2), dec!(1.5)]));
        assert_eq!(invalid_field(&config), "net_margin[1]");
    }

    #[test]
    fn test_shock_beyond_horizon_rejected() {
        let mut config = sample();
        config.shocks.push(RiskShock {
            period: 6,
            kind: ShockKind::CashOutflow { amount: dec!(1_000) },
            recurring: false,
        });
        assert_eq!(invalid_field(&config), "shocks[0].period");
    }

    #[test]
    fn test_zero_term_loan_rejected() {
        let mut config = sample();
        config.debt = Some(DebtTerms {
            principal: dec!(50_000),
            annual_interest_rate: dec!(0.06),
            amortization: Amortization::StraightLine { term_periods: 0 },
        });
        assert_eq!(invalid_field(&config), "debt.amortization.term_periods");
    }

    #[test]
    fn test_gross_margin_overrides_cogs_ratio() {
        let mut config = sample();
        config.gross_margin = Some(RateInput::Scalar(dec!(0.35)));
        let drivers = config.resolve_drivers().unwrap();
        assert!(drivers.cogs_ratio.iter().all(|r| *r == dec!(0.65)));
    }

    #[test]
    fn test_cogs_drift_capped() {
        let mut config = sample();
        config.cogs_ratio = dec!(0.9);
        config.cogs_ratio_growth = dec!(0.10);
        let drivers = config.resolve_drivers().unwrap();
        assert_eq!(drivers.cogs_ratio[0], dec!(0.9));
        assert_eq!(drivers.cogs_ratio[1], MAX_COGS_RATIO);
        assert_eq!(*drivers.cogs_ratio.last().unwrap(), MAX_COGS_RATIO);
        assert!(drivers.cogs_capped);
    }

    #[test]
    fn test_opex_compounds() {
        let mut config = sample();
        config.operating_expenses = dec!(1_000);
        config.opex_growth = dec!(0.10);
        let drivers = config.resolve_drivers().unwrap();
        assert_eq!(drivers.opex[0], dec!(1_000));
        assert_eq!(drivers.opex[2], dec!(1_210));
    }

    #[test]
    fn test_opex_overflow_is_an_error() {
        let mut config = sample();
        config.periods = 600;
        config.operating_expenses = dec!(1_000_000);
        config.opex_growth = dec!(1);
        assert!(config.validate().is_ok());
        match config.resolve_drivers() {
            Err(ProjectionError::Overflow { field, period }) => {
                assert_eq!(field, "operating_expenses");
                assert!(period > 0 && period < 600);
            }
            other => panic!("expected Overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_extreme_cogs_drift_caps_instead_of_overflowing() {
        let mut config = sample();
        config.cogs_ratio = dec!(0.5);
        config.cogs_ratio_growth = Decimal::MAX;
        let drivers = config.resolve_drivers().unwrap();
        assert_eq!(drivers.cogs_ratio[1], MAX_COGS_RATIO);
        assert!(drivers.cogs_capped);
    }

    #[test]
    fn test_amounts_and_days_bounded() {
        let mut config = sample();
        config.dso_days = MAX_DAYS + dec!(1);
        assert_eq!(invalid_field(&config), "dso_days");

        let mut config = sample();
        config.starting_revenue = MAX_AMOUNT * dec!(2);
        assert_eq!(invalid_field(&config), "starting_revenue");

        let mut config = sample();
        config.debt = Some(DebtTerms {
            principal: dec!(50_000),
            annual_interest_rate: dec!(25),
            amortization: Amortization::InterestOnly,
        });
        assert_eq!(invalid_field(&config), "debt.annual_interest_rate");
    }

    #[test]
    fn test_recurring_shock_active_from_its_period() {
        let shock = RiskShock {
            period: 2,
            kind: ShockKind::CollectionDelay { extra_days: dec!(15) },
            recurring: true,
        };
        assert!(!shock.is_active(1));
        assert!(shock.is_active(2));
        assert!(shock.is_active(5));

        let once = RiskShock { recurring: false, ..shock };
        assert!(once.is_active(2));
        assert!(!once.is_active(3));
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{"periods": 3, "starting_revenue": "100000", "revenue_growth": "0.1"}"#;
        let config: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "Custom");
        assert_eq!(config.period_basis, PeriodBasis::Annual);
        assert_eq!(config.revenue_growth, RateInput::Scalar(dec!(0.1)));
        assert_eq!(config.opening_working_capital, OpeningWorkingCapital::Zero);
    }
}
