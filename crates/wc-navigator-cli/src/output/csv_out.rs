use serde_json::Value;
use std::error::Error;
use std::io;

use wc_navigator_core::{export, ProjectionSeries};

use super::result_rows;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(value, stdout.lock()) {
        eprintln!("csv output failed: {e}");
    }
}

/// Write output as CSV. A projection keeps the engine's column order; other
/// results fall back to generic rows.
pub fn write_csv<W: io::Write>(value: &Value, writer: W) -> Result<(), Box<dyn Error>> {
    if let Some(result) = value.get("result").filter(|r| r.get("periods").is_some()) {
        let series: ProjectionSeries = serde_json::from_value(result.clone())?;
        export::write_series_csv(&series, writer)?;
        return Ok(());
    }

    let mut wtr = csv::Writer::from_writer(writer);

    match value {
        Value::Object(map) => {
            if let Some(rows) = map.get("result").and_then(result_rows) {
                write_array_csv(&mut wtr, &rows)?;
            } else if let Some(Value::Object(result)) = map.get("result") {
                wtr.write_record(["field", "value"])?;
                for (key, val) in result {
                    wtr.write_record([key.as_str(), &format_csv_value(val)])?;
                }
            } else if let Some(Value::Array(results)) = map.get("results") {
                write_array_csv(&mut wtr, results)?;
            } else {
                wtr.write_record(["field", "value"])?;
                for (key, val) in map {
                    wtr.write_record([key.as_str(), &format_csv_value(val)])?;
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr)?,
        _ => wtr.write_record([&format_csv_value(value)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
