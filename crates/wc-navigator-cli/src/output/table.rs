use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::result_rows;

/// Period columns worth a terminal's width; the full set is in json/csv.
const PERIOD_COLUMNS: [&str; 9] = [
    "period",
    "revenue",
    "net_income",
    "change_in_working_capital",
    "operating_cash_flow",
    "free_cash_flow",
    "cash_balance",
    "closing_debt",
    "dscr",
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result, map);
            } else if let Some(Value::Array(rows)) = map.get("results") {
                print_rows(rows, None);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(rows) => print_rows(rows, None),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    match (result_rows(result), result.as_object()) {
        (Some(rows), Some(res_map)) => {
            let columns = if res_map.contains_key("periods") {
                Some(&PERIOD_COLUMNS[..])
            } else {
                None
            };
            if let Some(Value::String(name)) = res_map.get("scenario") {
                println!("Scenario: {}", name);
            }
            print_rows(&rows, columns);

            if let Some(Value::Object(summary)) = res_map.get("summary") {
                println!();
                print_flat_object(summary);
            }
            if let Some(max) = res_map.get("max_sustainable_growth") {
                println!("\nMax sustainable growth: {}", format_value(max));
            }
        }
        (None, Some(res_map)) => print_flat_object(res_map),
        _ => println!("{}", format_value(result)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value], columns: Option<&[&str]>) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = match columns {
        Some(cols) => cols.iter().map(|c| c.to_string()).collect(),
        None => first.keys().cloned().collect(),
    };
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }

    println!("{}", Table::from(builder));
}

/// Amounts rounded to cents for display.
fn format_cell(value: &Value) -> String {
    match value {
        Value::String(s) => match s.parse::<rust_decimal::Decimal>() {
            Ok(d) => d.round_dp(2).to_string(),
            Err(_) => s.clone(),
        },
        other => format_value(other),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
