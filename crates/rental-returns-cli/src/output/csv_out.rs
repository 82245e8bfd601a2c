use serde_json::Value;
use std::io;

use super::{format_scalar, result_rows};

/// Write output as CSV to stdout.
///
/// Row-shaped results (the scenario table) become one CSV row per entry;
/// everything else is written as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(rows) = result_rows(value) {
        write_rows(&mut wtr, rows);
    } else {
        let fields = value
            .get("result")
            .and_then(Value::as_object)
            .or_else(|| value.as_object());
        let _ = wtr.write_record(["field", "value"]);
        if let Some(map) = fields {
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &format_cell(val)]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_cell).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

/// Arrays (annual cashflows) are joined with `;` to stay in one cell.
fn format_cell(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(format_scalar).collect::<Vec<_>>().join(";"),
        other => format_scalar(other),
    }
}
