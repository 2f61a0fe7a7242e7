use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::scenario::config::{OpeningWorkingCapital, ScenarioConfig};
use crate::types::{Days, Money, Ratio};

/// Receivable, inventory and payable balances at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingCapitalBalances {
    pub accounts_receivable: Money,
    pub inventory: Money,
    pub accounts_payable: Money,
}

/// Period-over-period movement in each working-capital line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingCapitalChange {
    pub receivables: Money,
    pub inventory: Money,
    pub payables: Money,
    /// ΔAR + ΔInventory − ΔAP; positive means cash absorbed
    pub net: Money,
}

impl WorkingCapitalBalances {
    /// Balances implied by days-outstanding terms:
    /// AR = revenue × DSO / days, inventory = COGS × DIO / days,
    /// AP = COGS × DPO / days.
    pub fn from_terms(
        revenue: Money,
        cogs: Money,
        dso: Days,
        dio: Days,
        dpo: Days,
        days_in_period: Days,
    ) -> Self {
        Self {
            accounts_receivable: revenue * dso / days_in_period,
            inventory: cogs * dio / days_in_period,
            accounts_payable: cogs * dpo / days_in_period,
        }
    }

    /// AR + inventory − AP
    pub fn net(&self) -> Money {
        self.accounts_receivable + self.inventory - self.accounts_payable
    }

    pub fn change_from(&self, opening: &WorkingCapitalBalances) -> WorkingCapitalChange {
        let receivables = self.accounts_receivable - opening.accounts_receivable;
        let inventory = self.inventory - opening.inventory;
        let payables = self.accounts_payable - opening.accounts_payable;
        WorkingCapitalChange {
            receivables,
            inventory,
            payables,
            net: receivables + inventory - payables,
        }
    }
}

/// Balances in place before period 0.
pub fn opening_balances(config: &ScenarioConfig, period0_cogs_ratio: Decimal) -> WorkingCapitalBalances {
    match config.opening_working_capital {
        OpeningWorkingCapital::Zero => WorkingCapitalBalances::default(),
        OpeningWorkingCapital::SteadyState => WorkingCapitalBalances::from_terms(
            config.starting_revenue,
            config.starting_revenue * period0_cogs_ratio,
            config.dso_days,
            config.dio_days,
            config.dpo_days,
            config.period_basis.days(),
        ),
        OpeningWorkingCapital::Explicit {
            accounts_receivable,
            inventory,
            accounts_payable,
        } => WorkingCapitalBalances {
            accounts_receivable,
            inventory,
            accounts_payable,
        },
    }
}

/// Cash conversion cycle implied by the balances: DSO + DIO − DPO, each
/// measured as balance / (flow / days).
///
/// Undefined without revenue. With zero COGS the inventory and payable legs
/// contribute nothing, since both balances are derived from COGS.
pub fn cash_conversion_cycle(
    balances: &WorkingCapitalBalances,
    revenue: Money,
    cogs: Money,
    days_in_period: Days,
) -> Ratio {
    if revenue.is_zero() {
        return Ratio::Undefined;
    }
    let dso = balances.accounts_receivable * days_in_period / revenue;
    let (dio, dpo) = if cogs.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            balances.inventory * days_in_period / cogs,
            balances.accounts_payable * days_in_period / cogs,
        )
    };
    Ratio::Value(dso + dio - dpo)
}
