use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::ProjectionError;
use crate::projection::engine::project;
use crate::scenario::config::ScenarioConfig;
use crate::types::{with_metadata, ComputationOutput, Days, Money, Rate, RateInput};
use crate::variants::comparison::{compare, VariantComparison};
use crate::variants::sweep::Variant;
use crate::ProjectionResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Growth rates offered by the growth family.
pub const GROWTH_RATE_OPTIONS: [Rate; 5] = [
    dec!(0.03),
    dec!(0.05),
    dec!(0.08),
    dec!(0.10),
    dec!(0.12),
];

/// Growth rates tested when searching for the highest sustainable rate.
pub const RUNWAY_TEST_RATES: [Rate; 10] = [
    dec!(0.00),
    dec!(0.02),
    dec!(0.03),
    dec!(0.04),
    dec!(0.05),
    dec!(0.06),
    dec!(0.08),
    dec!(0.10),
    dec!(0.12),
    dec!(0.15),
];

const TERMS_SHIFT_DAYS: Days = dec!(10);
const CONSERVATIVE_DPO_CUT: Days = dec!(5);
const AGGRESSIVE_DIO_FACTOR: Decimal = dec!(0.85);
const CONSERVATIVE_DIO_FACTOR: Decimal = dec!(1.15);
const PAYMENT_DELAY_DAYS: Days = dec!(15);
const COST_INFLATION: Rate = dec!(0.02);
const INVENTORY_BUILDUP_FACTOR: Decimal = dec!(1.2);
const STAGNANT_OPEX_GROWTH: Rate = dec!(0.01);
const HIGHER_DEBT_FACTOR: Decimal = dec!(1.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The four groups of what-if questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioFamily {
    /// How AR/AP/inventory timing moves cash
    WorkingCapitalTerms,
    /// How growth consumes liquidity
    GrowthRates,
    /// How operational setbacks move cash
    OperationalRisks,
    /// How leverage adds cash pressure
    DebtLeverage,
}

impl ScenarioFamily {
    pub const ALL: [ScenarioFamily; 4] = [
        ScenarioFamily::WorkingCapitalTerms,
        ScenarioFamily::GrowthRates,
        ScenarioFamily::OperationalRisks,
        ScenarioFamily::DebtLeverage,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ScenarioFamily::WorkingCapitalTerms => "Working Capital Terms",
            ScenarioFamily::GrowthRates => "Growth Rates",
            ScenarioFamily::OperationalRisks => "Operational Risks",
            ScenarioFamily::DebtLeverage => "Debt & Leverage",
        }
    }
}

impl fmt::Display for ScenarioFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ScenarioFamily {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "wc" | "working_capital" | "working_capital_terms" => {
                Ok(ScenarioFamily::WorkingCapitalTerms)
            }
            "growth" | "growth_rates" => Ok(ScenarioFamily::GrowthRates),
            "risk" | "risks" | "operational_risks" => Ok(ScenarioFamily::OperationalRisks),
            "debt" | "leverage" | "debt_leverage" | "debt_&_leverage" => {
                Ok(ScenarioFamily::DebtLeverage)
            }
            _ => Err(ProjectionError::invalid(
                "family",
                format!("Unknown scenario family '{s}' (expected wc, growth, risk or debt)"),
            )),
        }
    }
}

/// User-chosen working-capital terms for the custom variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTerms {
    pub dso_days: Days,
    pub dpo_days: Days,
    pub dio_days: Days,
}

/// Options that shape a family's variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyOptions {
    /// Adds a custom variant to the working-capital family
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_terms: Option<CustomTerms>,
    /// Growth rate tested by the growth family (5% when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyInput {
    pub base: ScenarioConfig,
    pub family: ScenarioFamily,
    #[serde(default)]
    pub options: FamilyOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyOutput {
    pub family: ScenarioFamily,
    /// Base case first, then each variant
    pub variants: Vec<Variant>,
    pub comparison: Vec<VariantComparison>,
}

/// Cash runway at one tested growth rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayPoint {
    pub growth_rate: Rate,
    pub runway_periods: u32,
    pub minimum_cash: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainableGrowthOutput {
    /// Highest tested rate that never runs out of cash
    pub max_sustainable_growth: Option<Rate>,
    pub horizon_periods: u32,
    pub points: Vec<RunwayPoint>,
}

// ---------------------------------------------------------------------------
// Variant builders
// ---------------------------------------------------------------------------

/// Aggressive (collect faster, pay slower, leaner stock) and conservative
/// terms, plus optional custom terms. Inventory days scale exactly, so a
/// DIO of 45 becomes 38.25 and 51.75.
pub fn working_capital_variants(
    base: &ScenarioConfig,
    custom: Option<&CustomTerms>,
) -> Vec<ScenarioConfig> {
    let mut aggressive = base.renamed("Aggressive WC");
    aggressive.dso_days = (base.dso_days - TERMS_SHIFT_DAYS).max(Decimal::ZERO);
    aggressive.dpo_days = base.dpo_days + TERMS_SHIFT_DAYS;
    aggressive.dio_days = base.dio_days * AGGRESSIVE_DIO_FACTOR;

    let mut conservative = base.renamed("Conservative WC");
    conservative.dso_days = base.dso_days + TERMS_SHIFT_DAYS;
    conservative.dpo_days = (base.dpo_days - CONSERVATIVE_DPO_CUT).max(Decimal::ZERO);
    conservative.dio_days = base.dio_days * CONSERVATIVE_DIO_FACTOR;

    let mut configs = vec![aggressive, conservative];
    if let Some(terms) = custom {
        let mut c = base.renamed("Custom WC");
        c.dso_days = terms.dso_days;
        c.dpo_days = terms.dpo_days;
        c.dio_days = terms.dio_days;
        configs.push(c);
    }
    configs
}

pub fn growth_variants(base: &ScenarioConfig, rate: Rate) -> Vec<ScenarioConfig> {
    let mut growth = base.renamed(format!("Growth ({}%)", (rate * dec!(100)).normalize()));
    growth.revenue_growth = RateInput::Scalar(rate);
    vec![growth]
}

/// Payment delays, cost inflation, inventory build-up and stagnant revenue.
///
/// Cost inflation drifts a single COGS ratio, so a gross-margin input is
/// replaced by the ratio implied by its first value. Later schedule entries
/// are dropped; `run_family` warns when that happens. Excess inventory
/// rounds its DIO down to whole days.
pub fn risk_variants(base: &ScenarioConfig) -> Vec<ScenarioConfig> {
    let mut delay = base.renamed("Payment Delays");
    delay.dso_days = base.dso_days + PAYMENT_DELAY_DAYS;

    let mut inflation = base.renamed("Cost Inflation");
    if let Some(ref gm) = base.gross_margin {
        let first = gm.values().first().copied().unwrap_or(Decimal::ZERO);
        inflation.gross_margin = None;
        inflation.cogs_ratio = Decimal::ONE - first;
    }
    inflation.cogs_ratio_growth = COST_INFLATION;

    let mut buildup = base.renamed("Excess Inventory");
    buildup.dio_days = (base.dio_days * INVENTORY_BUILDUP_FACTOR).floor();

    let mut stagnant = base.renamed("Stagnant Revenue");
    stagnant.revenue_growth = RateInput::Scalar(Decimal::ZERO);
    stagnant.opex_growth = STAGNANT_OPEX_GROWTH;

    vec![delay, inflation, buildup, stagnant]
}

/// Half as much debt again on the same terms.
pub fn debt_variants(base: &ScenarioConfig) -> ProjectionResult<Vec<ScenarioConfig>> {
    let terms = base
        .debt
        .as_ref()
        .ok_or_else(|| ProjectionError::MissingDebtTerms(base.name.clone()))?;

    let mut higher = base.renamed("Higher Debt (+50%)");
    if let Some(ref mut debt) = higher.debt {
        debt.principal = terms.principal * HIGHER_DEBT_FACTOR;
    }
    Ok(vec![higher])
}

/// Base case followed by the family's variants.
pub fn family_configs(
    base: &ScenarioConfig,
    family: ScenarioFamily,
    options: &FamilyOptions,
) -> ProjectionResult<Vec<ScenarioConfig>> {
    let mut configs = vec![base.renamed("Base")];
    match family {
        ScenarioFamily::WorkingCapitalTerms => {
            configs.extend(working_capital_variants(base, options.custom_terms.as_ref()))
        }
        ScenarioFamily::GrowthRates => configs.extend(growth_variants(
            base,
            options.growth_rate.unwrap_or(GROWTH_RATE_OPTIONS[1]),
        )),
        ScenarioFamily::OperationalRisks => configs.extend(risk_variants(base)),
        ScenarioFamily::DebtLeverage => configs.extend(debt_variants(base)?),
    }
    Ok(configs)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project the base case and every variant of a family, then compare them.
pub fn run_family(input: &FamilyInput) -> ProjectionResult<ComputationOutput<FamilyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let configs = family_configs(&input.base, input.family, &input.options)?;
    if input.family == ScenarioFamily::OperationalRisks {
        if let Some(RateInput::Schedule(ref gm)) = input.base.gross_margin {
            if gm.len() > 1 {
                warnings.push(format!(
                    "Cost Inflation: gross margin schedule replaced by a {} COGS ratio drifting {}% per period",
                    Decimal::ONE - gm[0],
                    (COST_INFLATION * dec!(100)).normalize()
                ));
            }
        }
    }
    debug!("running {} with {} configurations", input.family, configs.len());

    let variants = configs
        .into_iter()
        .map(|config| {
            let series = project(&config)?;
            Ok(Variant {
                label: config.name,
                value: None,
                series,
            })
        })
        .collect::<ProjectionResult<Vec<_>>>()?;

    // family_configs always yields the base first
    let comparison = compare(&variants[0].series, &variants);

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

    let output = FamilyOutput {
        family: input.family,
        variants,
        comparison,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!("{} scenario comparison", input.family.title()),
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Highest tested growth rate that keeps cash non-negative over the whole
/// horizon, with the runway at every tested rate.
pub fn sustainable_growth(
    base: &ScenarioConfig,
) -> ProjectionResult<ComputationOutput<SustainableGrowthOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut max_sustainable_growth = None;
    let mut points = Vec::with_capacity(RUNWAY_TEST_RATES.len());

    for rate in RUNWAY_TEST_RATES {
        let mut config = base.renamed(format!("growth={}", rate.normalize()));
        config.revenue_growth = RateInput::Scalar(rate);
        let series = match project(&config) {
            Ok(series) => series,
            Err(ProjectionError::Overflow { field, period }) => {
                warnings.push(format!(
                    "Growth {}: {field} overflows in period {period}; rate skipped",
                    rate.normalize()
                ));
                continue;
            }
            Err(e) => return Err(e),
        };

        if series.summary.first_deficit_period.is_none() {
            max_sustainable_growth = Some(rate);
        }
        points.push(RunwayPoint {
            growth_rate: rate,
            runway_periods: series.summary.cash_runway_periods,
            minimum_cash: series.summary.minimum_cash,
        });
    }

    if max_sustainable_growth.is_none() {
        warnings.push("Cash goes negative at every tested growth rate".to_string());
    }

    let output = SustainableGrowthOutput {
        max_sustainable_growth,
        horizon_periods: base.periods,
        points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Maximum sustainable growth and cash runway",
        base,
        warnings,
        elapsed,
        output,
    ))
}
