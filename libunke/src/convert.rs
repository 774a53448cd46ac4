//! Convert documents to and from a generic dictionary form.
//!
//! Every object becomes a JSON object with three fields:
//!
//! ```text
//! { "name": "Apple" | null, "properties": { ... }, "children": [ ... ] }
//! ```
//!
//! Objects nested in property values or lists use the same shape. The
//! dictionary form is a [`serde_json::Value`], so it can be handed to any
//! serde-based format.

use std::io;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::{Map, Number, Value as JsonValue};

use crate::document::{Document, ObjectId};
use crate::error::ConvertError;
use crate::value::Value;

type Result<T> = std::result::Result<T, ConvertError>;

/// Layout of rendered JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonOptions {
    /// Pretty-print with this many spaces per level; `0` keeps one line.
    pub indent: usize,
    /// Drop the spaces after `,` and `:` on single-line output.
    pub minify: bool,
}

/// Dictionary form of the document's root object.
pub fn document_to_value<X>(doc: &Document<X>) -> Result<JsonValue> {
    let root = doc.root().ok_or(ConvertError::MissingRoot)?;
    object_to_value(doc, root)
}

/// Dictionary form of one object and everything below it.
pub fn object_to_value<X>(doc: &Document<X>, id: ObjectId) -> Result<JsonValue> {
    let object = &doc[id];

    let mut properties = Map::new();
    for (name, value) in object.properties() {
        properties.insert(name.clone(), value_to_json(doc, value)?);
    }

    let children = object
        .children()
        .iter()
        .map(|child| object_to_value(doc, *child))
        .collect::<Result<Vec<_>>>()?;

    let mut map = Map::new();
    map.insert(
        "name".to_string(),
        object
            .name()
            .map_or(JsonValue::Null, |name| JsonValue::String(name.to_string())),
    );
    map.insert("properties".to_string(), JsonValue::Object(properties));
    map.insert("children".to_string(), JsonValue::Array(children));
    Ok(JsonValue::Object(map))
}

fn value_to_json<X>(doc: &Document<X>, value: &Value) -> Result<JsonValue> {
    match value {
        Value::Integer(n) => Ok(JsonValue::Number((*n).into())),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| ConvertError::NonFiniteFloat(f.to_string())),
        Value::Boolean(b) => Ok(JsonValue::Bool(*b)),
        Value::String(s) => Ok(JsonValue::String(s.clone())),
        Value::Object(id) => object_to_value(doc, *id),
        Value::List(items) => items
            .iter()
            .map(|item| value_to_json(doc, item))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
    }
}

/// Render the document as JSON text.
pub fn document_to_json<X>(doc: &Document<X>, options: &JsonOptions) -> Result<String> {
    render(&document_to_value(doc)?, options)
}

/// Render one object as JSON text.
pub fn object_to_json<X>(doc: &Document<X>, id: ObjectId, options: &JsonOptions) -> Result<String> {
    render(&object_to_value(doc, id)?, options)
}

/// Render a dictionary value as JSON text.
pub fn render(value: &JsonValue, options: &JsonOptions) -> Result<String> {
    if options.indent > 0 {
        let indent = " ".repeat(options.indent);
        write_json(value, PrettyFormatter::with_indent(indent.as_bytes()))
    } else if options.minify {
        write_json(value, CompactFormatter)
    } else {
        write_json(value, SpacedFormatter)
    }
}

fn write_json<F: Formatter>(value: &JsonValue, formatter: F) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| ConvertError::Json(e.to_string()))
}

/// Single-line JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Build a document from its dictionary form.
pub fn value_to_document(value: &JsonValue) -> Result<Document> {
    let mut doc = Document::new();
    let root = value_to_object(&mut doc, value)?;
    doc.set_root(root);
    Ok(doc)
}

/// Add the object described by `value` to `doc` as a detached object.
pub fn value_to_object<X: Default>(doc: &mut Document<X>, value: &JsonValue) -> Result<ObjectId> {
    let map = value
        .as_object()
        .ok_or_else(|| ConvertError::ExpectedObject(describe(value).to_string()))?;

    let name = match map.get("name") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(name)) => Some(name.as_str()),
        Some(other) => return Err(invalid_field("name", "a string or null", other)),
    };
    let id = doc.new_object(name, X::default());

    if let Some(properties) = map.get("properties") {
        let properties = properties
            .as_object()
            .ok_or_else(|| invalid_field("properties", "an object", properties))?;
        for (property, value) in properties {
            let value = json_to_value(doc, property, value)?;
            doc.set_property(id, property.clone(), value);
        }
    }

    if let Some(children) = map.get("children") {
        let children = children
            .as_array()
            .ok_or_else(|| invalid_field("children", "an array", children))?;
        for child in children {
            let child = value_to_object(doc, child)?;
            doc.add_child(id, child);
        }
    }

    Ok(id)
}

fn json_to_value<X: Default>(
    doc: &mut Document<X>,
    property: &str,
    value: &JsonValue,
) -> Result<Value> {
    match value {
        JsonValue::Null => Err(ConvertError::NullProperty(property.to_string())),
        JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if n.is_u64() {
                Err(ConvertError::UnsupportedNumber(n.to_string()))
            } else {
                n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| ConvertError::UnsupportedNumber(n.to_string()))
            }
        }
        JsonValue::String(s) => Ok(Value::String(s.clone())),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| json_to_value(doc, property, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        JsonValue::Object(_) => value_to_object(doc, value).map(Value::Object),
    }
}

/// Parse JSON text into a document.
pub fn json_to_document(text: &str) -> Result<Document> {
    let value: JsonValue = serde_json::from_str(text)?;
    value_to_document(&value)
}

/// Parse JSON text describing one object and add it to `doc`.
pub fn json_to_object<X: Default>(doc: &mut Document<X>, text: &str) -> Result<ObjectId> {
    let value: JsonValue = serde_json::from_str(text)?;
    value_to_object(doc, &value)
}

fn invalid_field(field: &'static str, expected: &'static str, found: &JsonValue) -> ConvertError {
    ConvertError::InvalidField {
        field,
        expected,
        found: describe(found).to_string(),
    }
}

fn describe(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
