use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables.
///
/// Scalar fields of the result go into a Field/Value table. Nested objects
/// (the loan and record inside a repayment outcome) and arrays of objects
/// (the amortization schedule) each get their own labelled table below it.
pub fn print_table(value: &Value) {
    let (result, envelope) = match value {
        Value::Object(map) => (map.get("result").unwrap_or(value), Some(map)),
        _ => (value, None),
    };

    match result {
        Value::Object(map) => print_object(map),
        Value::Array(arr) => print_rows(arr),
        other => println!("{}", other),
    }

    if let Some(envelope) = envelope {
        print_footer(envelope);
    }
}

fn print_object(map: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut has_scalars = false;
    for (key, val) in map {
        if !matches!(val, Value::Object(_) | Value::Array(_)) {
            builder.push_record([key.as_str(), &scalar(val)]);
            has_scalars = true;
        }
    }
    if has_scalars {
        println!("{}", Table::from(builder));
    }

    for (key, val) in map {
        match val {
            Value::Array(arr) if !arr.is_empty() => {
                println!("\n{}:", key);
                print_rows(arr);
            }
            Value::Object(nested) => {
                println!("\n{}:", key);
                print_object(nested);
            }
            _ => {}
        }
    }
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", scalar(item));
        }
    }
}

fn print_footer(envelope: &serde_json::Map<String, Value>) {
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

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
