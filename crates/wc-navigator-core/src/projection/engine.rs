use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::projection::debt::{DebtSchedule, DebtService};
use crate::projection::working_capital::{self, WorkingCapitalBalances};
use crate::scenario::config::{compound, PeriodBasis, ScenarioConfig, ShockKind};
use crate::types::{with_metadata, ComputationOutput, Money, Ratio};
use crate::ProjectionResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DSCR_FLOOR: Decimal = dec!(1.0);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One projected period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    /// Zero-based period index
    pub period: u32,
    pub revenue: Money,
    pub cogs: Money,
    pub gross_profit: Money,
    pub operating_expenses: Money,
    /// Pre-financing net income
    pub net_income: Money,
    pub depreciation: Money,
    pub opening_accounts_receivable: Money,
    pub accounts_receivable: Money,
    pub change_in_receivables: Money,
    pub opening_inventory: Money,
    pub inventory: Money,
    pub change_in_inventory: Money,
    pub opening_accounts_payable: Money,
    pub accounts_payable: Money,
    pub change_in_payables: Money,
    /// AR + inventory − AP
    pub working_capital: Money,
    pub change_in_working_capital: Money,
    /// Net income + depreciation − ΔWC
    pub operating_cash_flow: Money,
    pub capex: Money,
    pub opening_debt: Money,
    pub interest_payment: Money,
    pub principal_payment: Money,
    pub closing_debt: Money,
    /// OCF − capex − principal − interest
    pub free_cash_flow: Money,
    /// Cash moved by shocks outside free cash flow (negative = outflow)
    pub cash_adjustment: Money,
    pub opening_cash: Money,
    pub cash_balance: Money,
    /// (OCF + interest) / (interest + principal)
    pub dscr: Ratio,
    pub cash_conversion_cycle: Ratio,
    pub gross_margin: Ratio,
    /// (AR + inventory + cash) / AP
    pub current_ratio: Ratio,
    /// (AR + cash) / AP
    pub quick_ratio: Ratio,
    /// Cash / daily COGS and operating expenses
    pub days_cash_on_hand: Ratio,
}

/// A single field of a `PeriodResult`, addressed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Index(u32),
    Amount(Money),
    Ratio(Ratio),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Index(i) => write!(f, "{i}"),
            FieldValue::Amount(v) => write!(f, "{v}"),
            FieldValue::Ratio(r) => write!(f, "{r}"),
        }
    }
}

impl PeriodResult {
    /// Every field name in export order.
    pub const FIELD_NAMES: [&'static str; 34] = [
        "period",
        "revenue",
        "cogs",
        "gross_profit",
        "operating_expenses",
        "net_income",
        "depreciation",
        "opening_accounts_receivable",
        "accounts_receivable",
        "change_in_receivables",
        "opening_inventory",
        "inventory",
        "change_in_inventory",
        "opening_accounts_payable",
        "accounts_payable",
        "change_in_payables",
        "working_capital",
        "change_in_working_capital",
        "operating_cash_flow",
        "capex",
        "opening_debt",
        "interest_payment",
        "principal_payment",
        "closing_debt",
        "free_cash_flow",
        "cash_adjustment",
        "opening_cash",
        "cash_balance",
        "dscr",
        "cash_conversion_cycle",
        "gross_margin",
        "current_ratio",
        "quick_ratio",
        "days_cash_on_hand",
    ];

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        use FieldValue::{Amount, Ratio as R};
        let value = match name {
            "period" => FieldValue::Index(self.period),
            "revenue" => Amount(self.revenue),
            "cogs" => Amount(self.cogs),
            "gross_profit" => Amount(self.gross_profit),
            "operating_expenses" => Amount(self.operating_expenses),
            "net_income" => Amount(self.net_income),
            "depreciation" => Amount(self.depreciation),
            "opening_accounts_receivable" => Amount(self.opening_accounts_receivable),
            "accounts_receivable" => Amount(self.accounts_receivable),
            "change_in_receivables" => Amount(self.change_in_receivables),
            "opening_inventory" => Amount(self.opening_inventory),
            "inventory" => Amount(self.inventory),
            "change_in_inventory" => Amount(self.change_in_inventory),
            "opening_accounts_payable" => Amount(self.opening_accounts_payable),
            "accounts_payable" => Amount(self.accounts_payable),
            "change_in_payables" => Amount(self.change_in_payables),
            "working_capital" => Amount(self.working_capital),
            "change_in_working_capital" => Amount(self.change_in_working_capital),
            "operating_cash_flow" => Amount(self.operating_cash_flow),
            "capex" => Amount(self.capex),
            "opening_debt" => Amount(self.opening_debt),
            "interest_payment" => Amount(self.interest_payment),
            "principal_payment" => Amount(self.principal_payment),
            "closing_debt" => Amount(self.closing_debt),
            "free_cash_flow" => Amount(self.free_cash_flow),
            "cash_adjustment" => Amount(self.cash_adjustment),
            "opening_cash" => Amount(self.opening_cash),
            "cash_balance" => Amount(self.cash_balance),
            "dscr" => R(self.dscr),
            "cash_conversion_cycle" => R(self.cash_conversion_cycle),
            "gross_margin" => R(self.gross_margin),
            "current_ratio" => R(self.current_ratio),
            "quick_ratio" => R(self.quick_ratio),
            "days_cash_on_hand" => R(self.days_cash_on_hand),
            _ => return None,
        };
        Some(value)
    }

    /// Field values rendered as text, aligned with `FIELD_NAMES`.
    pub fn values(&self) -> Vec<String> {
        Self::FIELD_NAMES
            .iter()
            .filter_map(|name| self.field(name))
            .map(|v| v.to_string())
            .collect()
    }

    pub fn closing_working_capital(&self) -> WorkingCapitalBalances {
        WorkingCapitalBalances {
            accounts_receivable: self.accounts_receivable,
            inventory: self.inventory,
            accounts_payable: self.accounts_payable,
        }
    }
}

/// Aggregates across the whole horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub ending_cash: Money,
    pub minimum_cash: Money,
    /// First period whose closing cash is negative
    pub first_deficit_period: Option<u32>,
    /// Periods before the first deficit (the full horizon if none)
    pub cash_runway_periods: u32,
    pub cumulative_fcf: Money,
    pub cumulative_net_income: Money,
    pub total_interest: Money,
    pub ending_debt: Money,
    pub minimum_dscr: Ratio,
}

/// The projection of one scenario, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSeries {
    pub scenario: String,
    pub period_basis: PeriodBasis,
    pub periods: Vec<PeriodResult>,
    pub summary: SeriesSummary,
}

impl ProjectionSeries {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn ending_cash(&self) -> Money {
        self.summary.ending_cash
    }

    /// One field across every period, keyed by position, for charting.
    pub fn series(&self, field: &str) -> Option<Vec<FieldValue>> {
        self.periods.iter().map(|p| p.field(field)).collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project a scenario period by period.
///
/// Pure: the same configuration always yields the same series. The
/// configuration is validated first and nothing is computed if it fails.
pub fn project(config: &ScenarioConfig) -> ProjectionResult<ProjectionSeries> {
    config.validate()?;
    let (series, _) = run(config)?;
    Ok(series)
}

/// Project a scenario and wrap the series in the standard output envelope
/// with warnings about deficits, weak coverage and clamped inputs.
pub fn run_projection(
    config: &ScenarioConfig,
) -> ProjectionResult<ComputationOutput<ProjectionSeries>> {
    let start = Instant::now();
    config.validate()?;

    let (series, warnings) = run(config)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Period-by-period working capital, free cash flow and debt service projection",
        config,
        warnings,
        elapsed,
        series,
    ))
}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

fn run(config: &ScenarioConfig) -> ProjectionResult<(ProjectionSeries, Vec<String>)> {
    debug!(
        "projecting '{}' over {} {} periods",
        config.name,
        config.periods,
        config.period_basis.label()
    );

    let mut warnings: Vec<String> = Vec::new();
    let drivers = config.resolve_drivers()?;
    let days = config.period_basis.days();
    let schedule = config
        .debt
        .as_ref()
        .map(|terms| DebtSchedule::new(terms, config.period_basis));

    // Carry-forward state
    let mut prior_revenue: Option<Money> = None;
    let mut opening_wc = working_capital::opening_balances(config, drivers.cogs_ratio[0]);
    let mut outstanding_debt = config
        .debt
        .as_ref()
        .map(|d| d.principal)
        .unwrap_or(Decimal::ZERO);
    let mut cash = config.opening_cash;

    let mut periods = Vec::with_capacity(config.periods as usize);

    for idx in 0..config.periods {
        let i = idx as usize;
        let active_shocks: Vec<&ShockKind> = config
            .shocks
            .iter()
            .filter(|s| s.is_active(idx))
            .map(|s| &s.kind)
            .collect();

        // -- Revenue & income ------------------------------------------------
        let mut revenue = match prior_revenue {
            None => config.starting_revenue,
            Some(prior) => compound(prior, drivers.growth[i], "revenue", idx)?,
        };
        let mut dso = config.dso_days;
        let mut cash_adjustment = Decimal::ZERO;
        for kind in &active_shocks {
            match kind {
                ShockKind::RevenueDrop { pct } => revenue *= Decimal::ONE - *pct,
                ShockKind::CollectionDelay { extra_days } => dso += *extra_days,
                ShockKind::CashOutflow { amount } => cash_adjustment -= *amount,
            }
        }

        let cogs = revenue * drivers.cogs_ratio[i];
        let opex = drivers.opex[i];
        let net_income = match drivers.net_margin {
            Some(ref margins) => revenue * margins[i],
            None => (revenue - cogs - opex) * (Decimal::ONE - config.tax_rate),
        };

        // -- Working capital -------------------------------------------------
        let closing_wc = WorkingCapitalBalances::from_terms(
            revenue,
            cogs,
            dso,
            config.dio_days,
            config.dpo_days,
            days,
        );
        let wc_change = closing_wc.change_from(&opening_wc);

        let operating_cash_flow = net_income + config.depreciation - wc_change.net;

        // -- Debt service ----------------------------------------------------
        let service = match schedule {
            Some(ref s) => s.service(idx, outstanding_debt),
            None => DebtService {
                opening_balance: outstanding_debt,
                closing_balance: outstanding_debt,
                ..DebtService::default()
            },
        };
        if service.clamped {
            warnings.push(format!(
                "Principal payment in {} {} clamped to the outstanding balance {}",
                config.period_basis.label(),
                idx,
                service.opening_balance.round_dp(2)
            ));
        }

        let free_cash_flow =
            operating_cash_flow - config.capex - service.principal - service.interest;
        let dscr = Ratio::of(
            operating_cash_flow + service.interest,
            service.interest + service.principal,
        );

        // -- Cash ------------------------------------------------------------
        let opening_cash = cash;
        let cash_balance = opening_cash + free_cash_flow + cash_adjustment;

        let daily_costs = (cogs + opex) / days;
        periods.push(PeriodResult {
            period: idx,
            revenue,
            cogs,
            gross_profit: revenue - cogs,
            operating_expenses: opex,
            net_income,
            depreciation: config.depreciation,
            opening_accounts_receivable: opening_wc.accounts_receivable,
            accounts_receivable: closing_wc.accounts_receivable,
            change_in_receivables: wc_change.receivables,
            opening_inventory: opening_wc.inventory,
            inventory: closing_wc.inventory,
            change_in_inventory: wc_change.inventory,
            opening_accounts_payable: opening_wc.accounts_payable,
            accounts_payable: closing_wc.accounts_payable,
            change_in_payables: wc_change.payables,
            working_capital: closing_wc.net(),
            change_in_working_capital: wc_change.net,
            operating_cash_flow,
            capex: config.capex,
            opening_debt: service.opening_balance,
            interest_payment: service.interest,
            principal_payment: service.principal,
            closing_debt: service.closing_balance,
            free_cash_flow,
            cash_adjustment,
            opening_cash,
            cash_balance,
            dscr,
            cash_conversion_cycle: working_capital::cash_conversion_cycle(
                &closing_wc,
                revenue,
                cogs,
                days,
            ),
            gross_margin: Ratio::of(revenue - cogs, revenue),
            current_ratio: Ratio::of(
                closing_wc.accounts_receivable + closing_wc.inventory + cash_balance,
                closing_wc.accounts_payable,
            ),
            quick_ratio: Ratio::of(
                closing_wc.accounts_receivable + cash_balance,
                closing_wc.accounts_payable,
            ),
            days_cash_on_hand: Ratio::of(cash_balance, daily_costs),
        });

        prior_revenue = Some(revenue);
        opening_wc = closing_wc;
        outstanding_debt = service.closing_balance;
        cash = cash_balance;
    }

    if drivers.cogs_capped {
        warnings.push("COGS ratio capped at 95% of revenue".to_string());
    }

    let summary = summarise(&periods);
    if let Some(deficit) = summary.first_deficit_period {
        warnings.push(format!(
            "Cash goes negative in {} {} (minimum {}); funding required",
            config.period_basis.label(),
            deficit,
            summary.minimum_cash.round_dp(2)
        ));
    }
    let weak_coverage = periods.iter().filter(|p| p.dscr.is_below(DSCR_FLOOR)).count();
    if weak_coverage > 0 {
        warnings.push(format!(
            "DSCR below {DSCR_FLOOR}x in {weak_coverage} period(s); operating cash does not cover debt service"
        ));
    }

    let series = ProjectionSeries {
        scenario: config.name.clone(),
        period_basis: config.period_basis,
        periods,
        summary,
    };
    Ok((series, warnings))
}

fn summarise(periods: &[PeriodResult]) -> SeriesSummary {
    let first_deficit_period = periods
        .iter()
        .find(|p| p.cash_balance < Decimal::ZERO)
        .map(|p| p.period);

    SeriesSummary {
        ending_cash: periods.last().map(|p| p.cash_balance).unwrap_or_default(),
        minimum_cash: periods
            .iter()
            .map(|p| p.cash_balance)
            .min()
            .unwrap_or_default(),
        first_deficit_period,
        cash_runway_periods: first_deficit_period.unwrap_or(periods.len() as u32),
        cumulative_fcf: periods.iter().map(|p| p.free_cash_flow).sum(),
        cumulative_net_income: periods.iter().map(|p| p.net_income).sum(),
        total_interest: periods.iter().map(|p| p.interest_payment).sum(),
        ending_debt: periods.last().map(|p| p.closing_debt).unwrap_or_default(),
        minimum_dscr: periods
            .iter()
            .map(|p| p.dscr)
            .min()
            .unwrap_or(Ratio::Undefined),
    }
}
