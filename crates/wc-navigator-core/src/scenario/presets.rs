use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProjectionError;
use crate::scenario::config::{
    Amortization, DebtTerms, OpeningWorkingCapital, PeriodBasis, ScenarioConfig,
};
use crate::types::{Money, Rate, RateInput};

/// Named starting points. Each maps to a fixed monthly configuration the
/// caller may override field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    Retail,
    SaaS,
    Manufacturing,
    Custom,
}

/// Parameters that differ between presets.
struct PresetTerms {
    opening_cash: Money,
    revenue: Money,
    cogs_ratio: Rate,
    opex: Money,
    dso: u32,
    dpo: u32,
    dio: u32,
    capex: Money,
    depreciation: Money,
    growth: Rate,
    loan: Money,
    loan_rate: Rate,
    loan_months: u32,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Retail,
        Preset::SaaS,
        Preset::Manufacturing,
        Preset::Custom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Retail => "Retail",
            Preset::SaaS => "SaaS",
            Preset::Manufacturing => "Manufacturing",
            Preset::Custom => "Custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Retail => "High inventory, fast AR collection",
            Preset::SaaS => "Low COGS, no inventory, slow enterprise collections",
            Preset::Manufacturing => "Extended payment terms, high inventory",
            Preset::Custom => "Typical business, customise as needed",
        }
    }

    fn terms(&self) -> PresetTerms {
        match self {
            Preset::Retail => PresetTerms {
                opening_cash: dec!(75_000),
                revenue: dec!(150_000),
                cogs_ratio: dec!(0.65),
                opex: dec!(30_000),
                dso: 15,
                dpo: 30,
                dio: 90,
                capex: dec!(3_000),
                depreciation: dec!(3_000),
                growth: dec!(0.02),
                loan: dec!(50_000),
                loan_rate: dec!(0.065),
                loan_months: 84,
            },
            Preset::SaaS => PresetTerms {
                opening_cash: dec!(200_000),
                revenue: dec!(80_000),
                cogs_ratio: dec!(0.20),
                opex: dec!(50_000),
                dso: 60,
                dpo: 30,
                dio: 0,
                capex: dec!(5_000),
                depreciation: dec!(5_000),
                growth: dec!(0.03),
                loan: dec!(100_000),
                loan_rate: dec!(0.08),
                loan_months: 48,
            },
            Preset::Manufacturing => PresetTerms {
                opening_cash: dec!(150_000),
                revenue: dec!(250_000),
                cogs_ratio: dec!(0.70),
                opex: dec!(35_000),
                dso: 60,
                dpo: 45,
                dio: 75,
                capex: dec!(10_000),
                depreciation: dec!(10_000),
                growth: dec!(0.02),
                loan: dec!(200_000),
                loan_rate: dec!(0.055),
                loan_months: 120,
            },
            Preset::Custom => PresetTerms {
                opening_cash: dec!(100_000),
                revenue: dec!(100_000),
                cogs_ratio: dec!(0.60),
                opex: dec!(20_000),
                dso: 45,
                dpo: 30,
                dio: 60,
                capex: dec!(3_000),
                depreciation: dec!(3_000),
                growth: dec!(0.02),
                loan: dec!(50_000),
                loan_rate: dec!(0.06),
                loan_months: 60,
            },
        }
    }

    /// The preset as a complete, valid configuration.
    pub fn config(&self) -> ScenarioConfig {
        let t = self.terms();
        let mut config = ScenarioConfig::new(self.name(), 12, t.revenue);
        config.period_basis = PeriodBasis::Monthly;
        config.revenue_growth = RateInput::Scalar(t.growth);
        config.cogs_ratio = t.cogs_ratio;
        config.operating_expenses = t.opex;
        config.tax_rate = dec!(0.25);
        config.dso_days = t.dso.into();
        config.dpo_days = t.dpo.into();
        config.dio_days = t.dio.into();
        config.opening_working_capital = OpeningWorkingCapital::SteadyState;
        config.depreciation = t.depreciation;
        config.capex = t.capex;
        config.opening_cash = t.opening_cash;
        config.debt = Some(DebtTerms {
            principal: t.loan,
            annual_interest_rate: t.loan_rate,
            amortization: Amortization::LevelPayment {
                term_periods: t.loan_months,
            },
        });
        config
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "retail" | "retail store" => Ok(Preset::Retail),
            "saas" | "saas startup" => Ok(Preset::SaaS),
            "manufacturing" | "mfg" => Ok(Preset::Manufacturing),
            "custom" | "typical" | "typical business" => Ok(Preset::Custom),
            _ => Err(ProjectionError::UnknownPreset(s.to_string())),
        }
    }
}
