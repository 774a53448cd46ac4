//! TOML transcoding: convert between the dictionary form and TOML text.
//!
//! Mapping from the dictionary form to TOML:
//!   - object               -> table (inline inside arrays)
//!   - non-empty array of objects at table level -> array of tables
//!   - other arrays         -> TOML array
//!   - string/bool/number   -> matching TOML value
//!   - null map entry       -> omitted (an anonymous object has no `name` key)
//!
//! Lossy edges:
//!   - TOML has no null type; a null inside an array is an error.
//!   - TOML integers are i64; larger unsigned numbers error.
//!   - TOML datetimes decode to strings.
//!   - The top-level value must be an object.

use serde_json::{Map, Number, Value};
use toml_edit::{Array, ArrayOfTables, DocumentMut, Formatted, InlineTable, Item, Table};

/// Decode a TOML string into a dictionary value.
pub fn decode(input: &str) -> Result<Value, String> {
    let doc: DocumentMut = input
        .parse::<DocumentMut>()
        .map_err(|e| format!("TOML parse error: {}", e))?;
    toml_table_to_value(doc.as_table())
}

/// Encode a dictionary value as a TOML string.
pub fn encode(value: &Value) -> Result<String, String> {
    match value {
        Value::Object(obj) => {
            let mut doc = DocumentMut::new();
            for (key, item) in map_to_table(obj)?.iter() {
                doc[key] = item.clone();
            }
            Ok(doc.to_string())
        }
        _ => Err("TOML requires the top-level value to be a table/object".to_string()),
    }
}

fn toml_table_to_value(table: &Table) -> Result<Value, String> {
    let mut obj = Map::new();
    for (key, item) in table.iter() {
        if let Some(value) = toml_item_to_value(item)? {
            obj.insert(key.to_string(), value);
        }
    }
    Ok(Value::Object(obj))
}

fn toml_item_to_value(item: &Item) -> Result<Option<Value>, String> {
    match item {
        Item::Value(v) => toml_value_to_json(v).map(Some),
        Item::Table(t) => toml_table_to_value(t).map(Some),
        Item::ArrayOfTables(arr) => {
            let items: Result<Vec<Value>, String> = arr.iter().map(toml_table_to_value).collect();
            Ok(Some(Value::Array(items?)))
        }
        Item::None => Ok(None),
    }
}

fn toml_value_to_json(v: &toml_edit::Value) -> Result<Value, String> {
    match v {
        toml_edit::Value::String(s) => Ok(Value::String(s.value().clone())),
        toml_edit::Value::Integer(i) => Ok(Value::Number((*i.value()).into())),
        toml_edit::Value::Float(f) => Number::from_f64(*f.value())
            .map(Value::Number)
            .ok_or_else(|| format!("Float {} has no dictionary equivalent", f.value())),
        toml_edit::Value::Boolean(b) => Ok(Value::Bool(*b.value())),
        toml_edit::Value::Datetime(dt) => Ok(Value::String(dt.value().to_string())),
        toml_edit::Value::Array(arr) => {
            let items: Result<Vec<Value>, String> = arr.iter().map(toml_value_to_json).collect();
            Ok(Value::Array(items?))
        }
        toml_edit::Value::InlineTable(table) => {
            let mut obj = Map::new();
            for (key, val) in table.iter() {
                obj.insert(key.to_string(), toml_value_to_json(val)?);
            }
            Ok(Value::Object(obj))
        }
    }
}

fn map_to_table(obj: &Map<String, Value>) -> Result<Table, String> {
    let mut table = Table::new();
    for (key, value) in obj {
        let item = match value {
            Value::Null => continue,
            Value::Object(inner) => Item::Table(map_to_table(inner)?),
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                let mut tables = ArrayOfTables::new();
                for item in items {
                    if let Value::Object(inner) = item {
                        tables.push(map_to_table(inner)?);
                    }
                }
                Item::ArrayOfTables(tables)
            }
            other => Item::Value(value_to_toml(other)?),
        };
        table.insert(key.as_str(), item);
    }
    Ok(table)
}

fn value_to_toml(value: &Value) -> Result<toml_edit::Value, String> {
    match value {
        Value::Null => Err("TOML has no null type".to_string()),
        Value::Bool(b) => Ok(toml_edit::Value::Boolean(Formatted::new(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(toml_edit::Value::Integer(Formatted::new(i)))
            } else if n.is_u64() {
                Err(format!("Integer {} too large for TOML (i64)", n))
            } else {
                n.as_f64()
                    .map(|f| toml_edit::Value::Float(Formatted::new(f)))
                    .ok_or_else(|| format!("Unsupported number: {}", n))
            }
        }
        Value::String(s) => Ok(toml_edit::Value::String(Formatted::new(s.clone()))),
        Value::Array(arr) => {
            let mut toml_arr = Array::new();
            for v in arr {
                toml_arr.push(value_to_toml(v)?);
            }
            Ok(toml_edit::Value::Array(toml_arr))
        }
        Value::Object(obj) => {
            let mut inline = InlineTable::new();
            for (k, v) in obj {
                if !v.is_null() {
                    inline.insert(k.as_str(), value_to_toml(v)?);
                }
            }
            Ok(toml_edit::Value::InlineTable(inline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_children_become_array_of_tables() {
        let value = json!({
            "name": "Root",
            "properties": {"size": 3, "tags": ["a", "b"]},
            "children": [
                {"name": "Leaf", "properties": {"weight": 0.5}, "children": []}
            ]
        });
        let text = encode(&value).unwrap();
        assert!(text.contains("[[children]]"));
        assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn test_null_name_is_omitted() {
        let value = json!({"name": null, "properties": {}, "children": []});
        let text = encode(&value).unwrap();
        assert!(!text.contains("name"));
        assert_eq!(
            decode(&text).unwrap(),
            json!({"properties": {}, "children": []})
        );
    }

    #[test]
    fn test_objects_inside_lists_are_inline() {
        let value = json!({
            "name": "Root",
            "properties": {"mixed": [1, {"name": "P", "properties": {}, "children": []}]},
            "children": []
        });
        let text = encode(&value).unwrap();
        assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn test_rejects_non_table_root() {
        assert!(encode(&json!([1, 2])).is_err());
    }
}
