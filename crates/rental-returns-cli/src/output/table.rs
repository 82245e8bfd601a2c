use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_rows};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(rows) = result_rows(value) {
        println!("{}", rows_table(rows));
    } else if let Some(Value::Object(result)) = value.get("result") {
        println!("{}", fields_table(result));
    } else if let Value::Object(map) = value {
        println!("{}", fields_table(map));
    } else {
        println!("{value}");
    }

    print_envelope_notes(value);
}

fn print_envelope_notes(value: &Value) {
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

/// Two-column field/value table. Nested objects (the ROI breakdown, exit
/// analysis, insight) are flattened with dotted keys.
fn fields_table(map: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    push_fields(&mut builder, "", map);
    builder.build()
}

fn push_fields(builder: &mut Builder, prefix: &str, map: &Map<String, Value>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => push_fields(builder, &name, inner),
            other => builder.push_record([name, format_value(other)]),
        }
    }
}

fn rows_table(rows: &[Value]) -> Table {
    let mut builder = Builder::default();

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        builder.push_record(headers.clone());
        for item in rows {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
    }

    builder.build()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "n/a".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        other => format_scalar(other),
    }
}
