//! JSON <-> sieve Value conversion utilities

use crate::{EvalError, Value, evaluator::materialize};

/// Convert serde_json::Value to a sieve Value
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            Value::Object(obj.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}

/// Convert a sieve Value to serde_json::Value
///
/// Links are resolved and streams drained on the way. Records serialize
/// under their field aliases, byte strings as arrays of numbers, and
/// non-finite floats as `null`.
pub fn value_to_json(v: Value) -> Result<serde_json::Value, EvalError> {
    let json = match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Bytes(bytes) => serde_json::Value::Array(
            bytes
                .into_iter()
                .map(|b| serde_json::Value::Number(b.into()))
                .collect(),
        ),
        Value::Array(arr) => serde_json::Value::Array(
            arr.into_iter()
                .map(value_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(obj) => serde_json::Value::Object(
            obj.into_iter()
                .map(|(k, v)| Ok((k, value_to_json(v)?)))
                .collect::<Result<_, EvalError>>()?,
        ),
        Value::Record(record) => {
            let keys: Vec<String> = record
                .record_type()
                .fields()
                .iter()
                .map(|field| field.output_name().to_string())
                .collect();
            serde_json::Value::Object(
                keys.into_iter()
                    .zip(record.into_values())
                    .map(|(k, v)| Ok((k, value_to_json(v)?)))
                    .collect::<Result<_, EvalError>>()?,
            )
        }
        Value::Link(link) => value_to_json(link.resolve()?)?,
        stream @ Value::Stream(_) => value_to_json(materialize(stream)?)?,
    };
    Ok(json)
}
