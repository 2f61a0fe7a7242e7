use serde::{Deserialize, Serialize};

use crate::projection::engine::ProjectionSeries;
use crate::types::{Money, Ratio};
use crate::variants::sweep::Variant;

/// Headline metrics of one variant next to the base case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantComparison {
    pub scenario: String,
    /// Cash conversion cycle in period 0
    pub cash_conversion_cycle: Ratio,
    pub ccc_vs_base: Ratio,
    pub ending_cash: Money,
    pub ending_cash_vs_base: Money,
    pub cumulative_fcf: Money,
    pub cumulative_fcf_vs_base: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_deficit_period: Option<u32>,
    pub minimum_dscr: Ratio,
}

fn first_ccc(series: &ProjectionSeries) -> Ratio {
    series
        .periods
        .first()
        .map(|p| p.cash_conversion_cycle)
        .unwrap_or(Ratio::Undefined)
}

/// Compare each variant against `base`. The base itself may appear among
/// the variants, in which case its deltas are zero.
pub fn compare(base: &ProjectionSeries, variants: &[Variant]) -> Vec<VariantComparison> {
    let base_ccc = first_ccc(base);
    variants
        .iter()
        .map(|v| {
            let s = &v.series;
            let ccc = first_ccc(s);
            let ccc_vs_base = match (ccc, base_ccc) {
                (Ratio::Value(a), Ratio::Value(b)) => Ratio::Value(a - b),
                _ => Ratio::Undefined,
            };
            VariantComparison {
                scenario: v.label.clone(),
                cash_conversion_cycle: ccc,
                ccc_vs_base,
                ending_cash: s.summary.ending_cash,
                ending_cash_vs_base: s.summary.ending_cash - base.summary.ending_cash,
                cumulative_fcf: s.summary.cumulative_fcf,
                cumulative_fcf_vs_base: s.summary.cumulative_fcf - base.summary.cumulative_fcf,
                first_deficit_period: s.summary.first_deficit_period,
                minimum_dscr: s.summary.minimum_dscr,
            }
        })
        .collect()
}
