use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use wc_navigator_core::variants::sweep::{self, SweepInput, SweepParameter};

use super::BaseArgs;

/// Arguments for a one-parameter sweep
#[derive(Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub base: BaseArgs,

    /// Parameter to vary: dso, dpo, dio, growth, margin, cogs, debt, rate, cash, capex
    #[arg(long)]
    pub parameter: String,

    /// Comma-separated values (e.g. "30,45,60,90")
    #[arg(long, conflicts_with = "range")]
    pub values: Option<String>,

    /// Inclusive range in format min:max:step (e.g. "30:90:15")
    #[arg(long)]
    pub range: Option<String>,
}

fn parse_values(list: &str) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    let mut values = Vec::new();
    for raw in list.split(',') {
        let value = raw
            .trim()
            .parse::<Decimal>()
            .map_err(|e| format!("Invalid sweep value '{}': {}", raw.trim(), e))?;
        values.push(value);
    }
    Ok(values)
}

fn parse_range(spec: &str) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Range must be min:max:step, got '{}'", spec).into());
    }
    let min = parts[0].parse::<Decimal>()?;
    let max = parts[1].parse::<Decimal>()?;
    let step = parts[2].parse::<Decimal>()?;
    Ok(sweep::sweep_range(min, max, step)?)
}

pub fn run_sweep(args: SweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let parameter: SweepParameter = args.parameter.parse()?;
    let values = match (&args.values, &args.range) {
        (Some(list), _) => parse_values(list)?,
        (None, Some(spec)) => parse_range(spec)?,
        (None, None) => return Err("--values or --range required for a sweep".into()),
    };

    let input = SweepInput {
        base: args.base.load()?,
        parameter,
        values,
    };
    let result = sweep::run_sweep(&input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_values_list() {
        let values = parse_values("30, 45,60").unwrap();
        assert_eq!(values, vec![dec!(30), dec!(45), dec!(60)]);
        assert!(parse_values("30,abc").is_err());
    }

    #[test]
    fn test_parse_range() {
        let values = parse_range("0.02:0.06:0.02").unwrap();
        assert_eq!(values, vec![dec!(0.02), dec!(0.04), dec!(0.06)]);
        assert!(parse_range("1:2").is_err());
    }
}
