//! CBOR transcoding: convert between the dictionary form and CBOR binary data.
//!
//! Mapping from CBOR to the dictionary form:
//!   - CBOR null                  -> null
//!   - CBOR bool                  -> bool
//!   - CBOR unsigned/negative int -> number (must fit i64 or u64)
//!   - CBOR float (16/32/64)      -> number (promoted to f64)
//!   - CBOR text string           -> string
//!   - CBOR array                 -> array
//!   - CBOR map                   -> object (text string keys only)
//!   - Anything else (bytes, tags, undefined) -> error
//!
//! Mapping from the dictionary form to CBOR:
//!   - null    -> CBOR null (simple value 22)
//!   - bool    -> CBOR bool (simple values 20/21)
//!   - integer -> CBOR integer (smallest encoding that fits)
//!   - float   -> CBOR float64 (always 9 bytes, never downgraded)
//!   - string  -> CBOR text string (determinate length)
//!   - array   -> CBOR array (determinate length)
//!   - object  -> CBOR map (determinate length, text string keys, in order)

use ciborium::value::Value as CborValue;
use serde_json::{Map, Number, Value};

/// Decode CBOR bytes into a dictionary value.
pub fn decode(input: &[u8]) -> Result<Value, String> {
    let cbor_value: CborValue =
        ciborium::de::from_reader(input).map_err(|e| format!("CBOR decode error: {}", e))?;
    cbor_to_value(&cbor_value)
}

fn cbor_to_value(cbor: &CborValue) -> Result<Value, String> {
    match cbor {
        CborValue::Null => Ok(Value::Null),
        CborValue::Bool(b) => Ok(Value::Bool(*b)),
        CborValue::Integer(i) => {
            let n: i128 = (*i).into();
            if let Ok(n) = i64::try_from(n) {
                Ok(Value::Number(n.into()))
            } else if let Ok(n) = u64::try_from(n) {
                Ok(Value::Number(n.into()))
            } else {
                Err(format!("CBOR integer {} does not fit in 64 bits", n))
            }
        }
        CborValue::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| format!("CBOR float {} has no dictionary equivalent", f)),
        CborValue::Text(s) => Ok(Value::String(s.clone())),
        CborValue::Array(arr) => {
            let items: Result<Vec<Value>, String> = arr.iter().map(cbor_to_value).collect();
            Ok(Value::Array(items?))
        }
        CborValue::Map(pairs) => {
            let mut obj = Map::new();
            for (k, v) in pairs {
                let key = match k {
                    CborValue::Text(s) => s.clone(),
                    _ => return Err(format!("CBOR map key must be a text string, got: {:?}", k)),
                };
                obj.insert(key, cbor_to_value(v)?);
            }
            Ok(Value::Object(obj))
        }
        CborValue::Tag(tag, _) => Err(format!(
            "CBOR tagged value (tag {}) has no dictionary equivalent",
            tag
        )),
        _ => Err(format!("CBOR value {:?} has no dictionary equivalent", cbor)),
    }
}

// ciborium's own encoder shrinks float64 to float16/float32 whenever the
// value fits, so values are written by hand to keep every float 8 bytes wide.

/// Encode a dictionary value as CBOR bytes.
pub fn encode(value: &Value) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), String> {
    match value {
        Value::Null => buf.push(0xf6),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                write_integer(buf, i);
            } else if let Some(u) = n.as_u64() {
                write_type_and_length(buf, 0, u);
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| format!("Unsupported number: {}", n))?;
                buf.push(0xfb);
                buf.extend_from_slice(&f.to_be_bytes());
            }
        }
        Value::String(s) => write_text(buf, s),
        Value::Array(arr) => {
            write_type_and_length(buf, 4, arr.len() as u64);
            for item in arr {
                write_value(buf, item)?;
            }
        }
        Value::Object(obj) => {
            write_type_and_length(buf, 5, obj.len() as u64);
            for (k, v) in obj {
                write_text(buf, k);
                write_value(buf, v)?;
            }
        }
    }
    Ok(())
}

fn write_text(buf: &mut Vec<u8>, s: &str) {
    write_type_and_length(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Write a CBOR major type with its argument in the shortest form:
/// 0-23 in the initial byte, otherwise 1, 2, 4 or 8 following bytes.
fn write_type_and_length(buf: &mut Vec<u8>, major: u8, val: u64) {
    let high = major << 5;
    match val {
        0..=23 => buf.push(high | val as u8),
        24..=0xff => {
            buf.push(high | 24);
            buf.push(val as u8);
        }
        0x100..=0xffff => {
            buf.push(high | 25);
            buf.extend_from_slice(&(val as u16).to_be_bytes());
        }
        0x10000..=0xffff_ffff => {
            buf.push(high | 26);
            buf.extend_from_slice(&(val as u32).to_be_bytes());
        }
        _ => {
            buf.push(high | 27);
            buf.extend_from_slice(&val.to_be_bytes());
        }
    }
}

/// Major type 0 holds `n`; major type 1 holds `-1 - n`.
fn write_integer(buf: &mut Vec<u8>, n: i64) {
    if n < 0 {
        write_type_and_length(buf, 1, !n as u64);
    } else {
        write_type_and_length(buf, 0, n as u64);
    }
}
