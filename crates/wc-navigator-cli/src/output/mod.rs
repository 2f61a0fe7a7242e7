pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The row set a result is best shown as: the periods of a projection, the
/// comparison of a family, the runway points, or one summary per swept
/// variant.
pub fn result_rows(result: &Value) -> Option<Vec<Value>> {
    let map = result.as_object()?;

    for key in ["periods", "comparison", "points"] {
        if let Some(Value::Array(rows)) = map.get(key) {
            return Some(rows.clone());
        }
    }

    if let Some(Value::Array(variants)) = map.get("variants") {
        let rows = variants
            .iter()
            .filter_map(|v| {
                let mut row = Map::new();
                row.insert("scenario".to_string(), v.get("label")?.clone());
                if let Some(Value::Object(summary)) = v.get("series").and_then(|s| s.get("summary"))
                {
                    row.extend(summary.clone());
                }
                Some(Value::Object(row))
            })
            .collect();
        return Some(rows);
    }

    None
}
