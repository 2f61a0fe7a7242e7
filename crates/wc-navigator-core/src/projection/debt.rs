use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::scenario::config::{Amortization, DebtTerms, PeriodBasis};
use crate::types::{Money, Rate};

/// Debt service for a single period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtService {
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
    /// The amortization asked for more principal than was outstanding
    pub clamped: bool,
}

impl DebtService {
    pub fn total_payment(&self) -> Money {
        self.interest + self.principal
    }
}

/// Amortization schedule for a term loan, evaluated one period at a time.
#[derive(Debug, Clone)]
pub struct DebtSchedule {
    amortization: Amortization,
    original_principal: Money,
    periodic_rate: Rate,
    level_payment: Option<Money>,
}

impl DebtSchedule {
    pub fn new(terms: &DebtTerms, basis: PeriodBasis) -> Self {
        let periodic_rate = terms.annual_interest_rate / basis.periods_per_year();
        let level_payment = match terms.amortization {
            Amortization::LevelPayment { term_periods } => {
                Some(level_payment(terms.principal, periodic_rate, term_periods))
            }
            _ => None,
        };
        Self {
            amortization: terms.amortization.clone(),
            original_principal: terms.principal,
            periodic_rate,
            level_payment,
        }
    }

    pub fn periodic_rate(&self) -> Rate {
        self.periodic_rate
    }

    /// Constant instalment for level-payment loans.
    pub fn level_payment(&self) -> Option<Money> {
        self.level_payment
    }

    /// Interest and principal due in `period` given the balance carried in.
    ///
    /// Interest accrues on the opening balance. The principal payment is
    /// clamped to the opening balance so the loan never goes negative.
    pub fn service(&self, period: u32, outstanding: Money) -> DebtService {
        let interest = outstanding * self.periodic_rate;

        let (requested, final_instalment) = match self.amortization {
            Amortization::StraightLine { term_periods } => {
                let instalment = self.original_principal / Decimal::from(term_periods);
                (
                    if period < term_periods { instalment } else { Decimal::ZERO },
                    period + 1 == term_periods,
                )
            }
            Amortization::LevelPayment { term_periods } => {
                let payment = self.level_payment.unwrap_or(Decimal::ZERO);
                (
                    if period < term_periods {
                        (payment - interest).max(Decimal::ZERO)
                    } else {
                        Decimal::ZERO
                    },
                    period + 1 == term_periods,
                )
            }
            Amortization::InterestOnly => (Decimal::ZERO, false),
            Amortization::Schedule { ref payments } => (
                payments.get(period as usize).copied().unwrap_or(Decimal::ZERO),
                false,
            ),
        };

        // The final instalment of a term loan sweeps up rounding residue.
        let (principal, clamped) = if final_instalment {
            (outstanding.max(Decimal::ZERO), false)
        } else if requested > outstanding {
            (outstanding.max(Decimal::ZERO), true)
        } else {
            (requested, false)
        };

        DebtService {
            opening_balance: outstanding,
            interest,
            principal,
            closing_balance: outstanding - principal,
            clamped,
        }
    }

    /// Service for every period of a horizon, chaining balances.
    pub fn project(&self, periods: u32) -> Vec<DebtService> {
        let mut outstanding = self.original_principal;
        (0..periods)
            .map(|p| {
                let service = self.service(p, outstanding);
                outstanding = service.closing_balance;
                service
            })
            .collect()
    }
}

/// Annuity instalment repaying `principal` over `periods` at `rate` per
/// period; straight division when the rate is zero.
///
/// When `(1 + rate)^periods` leaves `Decimal` range the annuity factor has
/// already converged to 1, so the instalment is the interest-only payment.
pub fn level_payment(principal: Money, rate: Rate, periods: u32) -> Money {
    if periods == 0 {
        return principal;
    }
    let n = Decimal::from(periods);
    if rate.is_zero() {
        return principal / n;
    }
    match (Decimal::ONE + rate).checked_powu(periods as u64) {
        Some(growth) if growth > Decimal::ONE => {
            principal * rate * (growth / (growth - Decimal::ONE))
        }
        _ => principal * rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms(amortization: Amortization) -> DebtTerms {
        DebtTerms {
            principal: dec!(120_000),
            annual_interest_rate: dec!(0.12),
            amortization,
        }
    }

    #[test]
    fn test_periodic_rate_follows_basis() {
        let schedule = DebtSchedule::new(
            &terms(Amortization::InterestOnly),
            PeriodBasis::Monthly,
        );
        assert_eq!(schedule.periodic_rate(), dec!(0.01));
    }

    #[test]
    fn test_straight_line_repays_in_term() {
        let schedule = DebtSchedule::new(
            &terms(Amortization::StraightLine { term_periods: 4 }),
            PeriodBasis::Annual,
        );
        let rows = schedule.project(6);
        assert_eq!(rows[0].principal, dec!(30_000));
        assert_eq!(rows[0].interest, dec!(14_400));
        assert_eq!(rows[1].interest, dec!(10_800));
        assert_eq!(rows[3].closing_balance, Decimal::ZERO);
        assert_eq!(rows[4].principal, Decimal::ZERO);
        assert_eq!(rows[5].total_payment(), Decimal::ZERO);
    }

    #[test]
    fn test_level_payment_constant_and_amortizes() {
        let schedule = DebtSchedule::new(
            &terms(Amortization::LevelPayment { term_periods: 12 }),
            PeriodBasis::Monthly,
        );
        let payment = schedule.level_payment().unwrap();
        // 120k at 1%/month over 12 months ≈ 10,661.85
        assert!((payment - dec!(10_661.85)).abs() < dec!(0.01));

        let rows = schedule.project(12);
        for row in &rows[..11] {
            assert!((row.total_payment() - payment).abs() < dec!(0.000001));
        }
        assert_eq!(rows[11].closing_balance, Decimal::ZERO);
        assert!(rows.windows(2).all(|w| w[1].closing_balance <= w[0].closing_balance));
    }

    #[test]
    fn test_zero_rate_level_payment() {
        assert_eq!(level_payment(dec!(1_200), Decimal::ZERO, 12), dec!(100));
    }

    #[test]
    fn test_level_payment_long_high_rate_loan_is_interest_only() {
        // 6.0 annual over 600 months: 1.5^600 is past Decimal range
        let payment = level_payment(dec!(50_000), dec!(0.5), 600);
        assert_eq!(payment, dec!(25_000));

        let schedule = DebtSchedule::new(
            &DebtTerms {
                principal: dec!(50_000),
                annual_interest_rate: dec!(6),
                amortization: Amortization::LevelPayment { term_periods: 600 },
            },
            PeriodBasis::Monthly,
        );
        let rows = schedule.project(600);
        assert_eq!(rows.len(), 600);
        assert_eq!(rows[0].interest, dec!(25_000));
        assert_eq!(rows[599].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_overpayment_clamped() {
        let schedule = DebtSchedule::new(
            &terms(Amortization::Schedule {
                payments: vec![dec!(100_000), dec!(50_000)],
            }),
            PeriodBasis::Annual,
        );
        let rows = schedule.project(3);
        assert_eq!(rows[0].principal, dec!(100_000));
        assert!(!rows[0].clamped);
        assert_eq!(rows[1].principal, dec!(20_000));
        assert!(rows[1].clamped);
        assert_eq!(rows[1].closing_balance, Decimal::ZERO);
        assert_eq!(rows[2].principal, Decimal::ZERO);
        assert_eq!(rows[2].interest, Decimal::ZERO);
    }

    #[test]
    fn test_interest_only_keeps_principal() {
        let schedule = DebtSchedule::new(&terms(Amortization::InterestOnly), PeriodBasis::Annual);
        let rows = schedule.project(3);
        assert!(rows.iter().all(|r| r.closing_balance == dec!(120_000)));
        assert!(rows.iter().all(|r| r.interest == dec!(14_400)));
    }
}
