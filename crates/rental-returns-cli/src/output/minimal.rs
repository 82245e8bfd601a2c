use serde_json::Value;

use super::{format_scalar, result_rows};

/// Headline fields, most informative first.
const PRIORITY_KEYS: [&str; 5] = [
    "irr",
    "roi_pct",
    "net_monthly_cashflow",
    "monthly_payment",
    "monthly_mortgage_payment",
];

/// Print just the key answer value from the output.
///
/// Scenario tables print one `name: net_monthly_cashflow` line per row;
/// other results print the first non-null priority field, then fall back
/// to the first field of the result object.
pub fn print_minimal(value: &Value) {
    if let Some(rows) = result_rows(value) {
        for row in rows {
            println!(
                "{}: {}",
                row.get("name").map(format_scalar).unwrap_or_default(),
                row.get("net_monthly_cashflow")
                    .map(format_scalar)
                    .unwrap_or_default()
            );
        }
        return;
    }

    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result_obj = value.get("result").unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                return format_scalar(val);
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_scalar(val));
        }
    }

    format_scalar(result_obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_irr_preferred() {
        let value = json!({"result": {"roi_pct": "92.57", "irr": "0.1337"}});
        assert_eq!(headline(&value), "0.1337");
    }

    #[test]
    fn test_null_irr_skipped() {
        let value = json!({"result": {"irr": null, "roi_pct": "92.57"}});
        assert_eq!(headline(&value), "92.57");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let value = json!({"result": {"periods": 4}});
        assert_eq!(headline(&value), "periods: 4");
    }
}
