//! YAML transcoding: convert between the dictionary form and YAML text.
//!
//! Mapping from YAML to the dictionary form:
//!   - YAML null          -> null (only meaningful as an object name)
//!   - YAML bool          -> bool
//!   - YAML integer       -> number (must fit i64 or u64)
//!   - YAML float         -> number
//!   - YAML string        -> string
//!   - YAML sequence      -> array
//!   - YAML mapping       -> object (scalar keys are stringified)
//!   - YAML tagged value  -> the inner value, tag dropped
//!
//! The reverse direction is total except for non-finite floats, which the
//! dictionary form never contains.

use serde_json::{Map, Number, Value};

/// Decode a YAML string into a dictionary value.
pub fn decode(input: &str) -> Result<Value, String> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(input).map_err(|e| format!("YAML parse error: {}", e))?;
    yaml_to_value(&yaml_value)
}

/// Encode a dictionary value as a YAML string.
pub fn encode(value: &Value) -> Result<String, String> {
    let yaml_value = value_to_yaml(value)?;
    serde_yaml::to_string(&yaml_value).map_err(|e| format!("YAML encode error: {}", e))
}

fn yaml_to_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(u.into()))
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("Unsupported YAML number: {}", n))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut obj = Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => return Err(format!("Unsupported YAML mapping key type: {:?}", k)),
                };
                obj.insert(key, yaml_to_value(v)?);
            }
            Ok(Value::Object(obj))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

fn value_to_yaml(value: &Value) -> Result<serde_yaml::Value, String> {
    match value {
        Value::Null => Ok(serde_yaml::Value::Null),
        Value::Bool(b) => Ok(serde_yaml::Value::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(serde_yaml::Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(serde_yaml::Value::Number(u.into()))
            } else {
                n.as_f64()
                    .map(|f| serde_yaml::Value::Number(f.into()))
                    .ok_or_else(|| format!("Unsupported number: {}", n))
            }
        }
        Value::String(s) => Ok(serde_yaml::Value::String(s.clone())),
        Value::Array(arr) => {
            let items: Result<Vec<serde_yaml::Value>, String> =
                arr.iter().map(value_to_yaml).collect();
            Ok(serde_yaml::Value::Sequence(items?))
        }
        Value::Object(obj) => {
            let mut map = serde_yaml::Mapping::new();
            for (k, v) in obj {
                map.insert(serde_yaml::Value::String(k.clone()), value_to_yaml(v)?);
            }
            Ok(serde_yaml::Value::Mapping(map))
        }
    }
}
