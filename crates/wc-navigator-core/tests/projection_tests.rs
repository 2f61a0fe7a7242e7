use pretty_assertions::assert_eq;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use wc_navigator_core::scenario::{Amortization, DebtTerms, PeriodBasis, RiskShock, ShockKind};
use wc_navigator_core::{
    project, run_projection, Preset, ProjectionError, RateInput, Ratio, ScenarioConfig,
};

// ===========================================================================
// Fixtures
// ===========================================================================

/// 100k revenue, 10% growth, 20% net margin, DSO 45 / DPO 30 / DIO 20.
fn worked_example() -> ScenarioConfig {
    let mut config = ScenarioConfig::new("Worked Example", 3, dec!(100_000));
    config.revenue_growth = RateInput::Scalar(dec!(0.10));
    config.net_margin = Some(RateInput::Scalar(dec!(0.20)));
    config.cogs_ratio = dec!(0.60);
    config.dso_days = dec!(45);
    config.dpo_days = dec!(30);
    config.dio_days = dec!(20);
    config
}

fn leveraged(amortization: Amortization) -> ScenarioConfig {
    let mut config = worked_example();
    config.periods = 8;
    config.debt = Some(DebtTerms {
        principal: dec!(40_000),
        annual_interest_rate: dec!(0.08),
        amortization,
    });
    config
}

// ===========================================================================
// Worked example
// ===========================================================================

#[test]
fn test_worked_example_period0() {
    let series = project(&worked_example()).unwrap();
    let p0 = &series.periods[0];

    assert_eq!(p0.revenue, dec!(100_000));
    assert_eq!(p0.net_income, dec!(20_000));
    // AR = 100k × 45 / 365 ≈ 12,328.77
    assert_eq!(p0.accounts_receivable.round_dp(2), dec!(12_328.77));
    // Zero opening balances: the whole period-0 position is a build
    assert_eq!(p0.change_in_working_capital, p0.working_capital);
    assert_eq!(p0.cash_balance, p0.net_income - p0.change_in_working_capital);
}

#[test]
fn test_worked_example_later_periods() {
    let series = project(&worked_example()).unwrap();
    assert_eq!(series.periods[1].revenue, dec!(110_000));
    assert_eq!(series.periods[2].revenue, dec!(121_000));
    assert_eq!(series.periods[2].net_income, dec!(24_200));

    // Steady 10% growth: each period's build is 10% of the prior position
    let p1 = &series.periods[1];
    let expected = series.periods[0].working_capital * dec!(0.10);
    assert!((p1.change_in_working_capital - expected).abs() < dec!(0.0000001));
}

// ===========================================================================
// Recurrence properties
// ===========================================================================

#[test]
fn test_flat_growth_compounds_exactly() {
    let mut config = ScenarioConfig::new("Flat", 10, dec!(100_000));
    config.revenue_growth = RateInput::Scalar(dec!(0.05));
    let series = project(&config).unwrap();

    for p in &series.periods {
        let expected = dec!(100_000) * (Decimal::ONE + dec!(0.05)).powu(p.period as u64);
        assert_eq!(p.revenue, expected, "period {}", p.period);
    }
}

#[test]
fn test_growth_schedule_holds_last_value() {
    let mut config = ScenarioConfig::new("Schedule", 4, dec!(1_000));
    config.revenue_growth = RateInput::Schedule(vec![dec!(0), dec!(0.5)]);
    let series = project(&config).unwrap();
    let revenue: Vec<Decimal> = series.periods.iter().map(|p| p.revenue).collect();
    assert_eq!(revenue, vec![dec!(1_000), dec!(1_500), dec!(2_250), dec!(3_375)]);
}

#[test]
fn test_balances_chain_across_periods() {
    let config = leveraged(Amortization::StraightLine { term_periods: 5 });
    let series = project(&config).unwrap();
    assert_eq!(series.periods[0].opening_cash, config.opening_cash);
    assert_eq!(series.periods[0].opening_debt, dec!(40_000));

    for pair in series.periods.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        assert_eq!(next.opening_accounts_receivable, prev.accounts_receivable);
        assert_eq!(next.opening_inventory, prev.inventory);
        assert_eq!(next.opening_accounts_payable, prev.accounts_payable);
        assert_eq!(next.opening_debt, prev.closing_debt);
        assert_eq!(next.opening_cash, prev.cash_balance);
        assert_eq!(next.cash_balance, prev.cash_balance + next.free_cash_flow);
    }
}

#[test]
fn test_debt_never_increases_or_goes_negative() {
    let amortizations = vec![
        Amortization::StraightLine { term_periods: 3 },
        Amortization::LevelPayment { term_periods: 6 },
        Amortization::InterestOnly,
        Amortization::Schedule {
            payments: vec![dec!(5_000), dec!(0), dec!(60_000), dec!(1_000)],
        },
    ];
    for amortization in amortizations {
        let series = project(&leveraged(amortization.clone())).unwrap();
        for p in &series.periods {
            assert!(p.closing_debt >= Decimal::ZERO, "{amortization:?}");
            assert!(p.closing_debt <= p.opening_debt, "{amortization:?}");
        }
    }
}

#[test]
fn test_dscr_undefined_iff_no_debt_service() {
    let configs = vec![
        worked_example(),
        leveraged(Amortization::StraightLine { term_periods: 3 }),
        leveraged(Amortization::Schedule {
            payments: vec![dec!(0), dec!(10_000)],
        }),
        Preset::Manufacturing.config(),
    ];
    for config in configs {
        let series = project(&config).unwrap();
        for p in &series.periods {
            let service = p.interest_payment + p.principal_payment;
            assert_eq!(
                p.dscr.is_undefined(),
                service.is_zero(),
                "{} period {}",
                config.name,
                p.period
            );
        }
    }
}

#[test]
fn test_projection_is_idempotent() {
    let config = Preset::Retail.config();
    let first = project(&config).unwrap();
    let second = project(&config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_quarterly_basis_uses_90_days() {
    let mut config = worked_example();
    config.period_basis = PeriodBasis::Quarterly;
    let series = project(&config).unwrap();
    assert_eq!(series.periods[0].accounts_receivable, dec!(50_000));
}

#[test]
fn test_negative_cash_is_reported_not_clamped() {
    let mut config = worked_example();
    config.capex = dec!(30_000);
    let out = run_projection(&config).unwrap();
    let summary = &out.result.summary;
    assert!(summary.minimum_cash < Decimal::ZERO);
    assert_eq!(summary.first_deficit_period, Some(0));
    assert_eq!(summary.cash_runway_periods, 0);
    assert!(out.warnings.iter().any(|w| w.contains("Cash goes negative")));
}

// ===========================================================================
// Shocks
// ===========================================================================

#[test]
fn test_shocks_apply_prospectively() {
    let mut config = worked_example();
    config.periods = 5;
    config.shocks = vec![
        RiskShock {
            period: 2,
            kind: ShockKind::RevenueDrop { pct: dec!(0.2) },
            recurring: false,
        },
        RiskShock {
            period: 3,
            kind: ShockKind::CashOutflow { amount: dec!(5_000) },
            recurring: false,
        },
    ];
    let base = project(&worked_example().renamed("Base")).unwrap();
    let shocked = project(&config).unwrap();

    assert_eq!(shocked.periods[0], base.periods[0]);
    assert_eq!(shocked.periods[1].revenue, base.periods[1].revenue);
    assert_eq!(shocked.periods[2].revenue, dec!(121_000) * dec!(0.8));
    assert_eq!(shocked.periods[3].revenue, shocked.periods[2].revenue * dec!(1.1));
    assert_eq!(shocked.periods[3].cash_adjustment, dec!(-5_000));
    assert_eq!(shocked.periods[4].cash_adjustment, Decimal::ZERO);
}

#[test]
fn test_shock_outside_horizon_rejected() {
    let mut config = worked_example();
    config.shocks.push(RiskShock {
        period: 3,
        kind: ShockKind::CollectionDelay { extra_days: dec!(10) },
        recurring: false,
    });
    let err = project(&config).unwrap_err();
    match err {
        ProjectionError::InvalidConfiguration { field, .. } => {
            assert_eq!(field, "shocks[0].period")
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ===========================================================================
// Validation
// ===========================================================================

fn invalid_field(config: &ScenarioConfig) -> String {
    match project(config) {
        Err(ProjectionError::InvalidConfiguration { field, .. }) => field,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn test_validation_names_the_field() {
    let mut config = worked_example();
    config.periods = 0;
    assert_eq!(invalid_field(&config), "periods");

    let mut config = worked_example();
    config.dso_days = dec!(-1);
    assert_eq!(invalid_field(&config), "dso_days");

    let mut config = worked_example();
    config.net_margin = Some(RateInput::Scalar(dec!(1.5)));
    assert_eq!(invalid_field(&config), "net_margin");

    let mut config = worked_example();
    config.tax_rate = dec!(-0.1);
    assert_eq!(invalid_field(&config), "tax_rate");
}

#[test]
fn test_empty_schedule_rejected() {
    let mut config = worked_example();
    config.revenue_growth = RateInput::Schedule(vec![]);
    assert_eq!(invalid_field(&config), "revenue_growth");
}

#[test]
fn test_ratio_serializes_undefined_as_na() {
    let series = project(&worked_example()).unwrap();
    let json = serde_json::to_value(&series.periods[0]).unwrap();
    assert_eq!(json["dscr"], "N/A");
    assert_eq!(json["revenue"], "100000");
    assert_eq!(series.summary.minimum_dscr, Ratio::Undefined);
}
