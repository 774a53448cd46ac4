//! Serialize documents back to Unke text.
//!
//! Comments are not part of the tree, so a parse/dump cycle drops them.
//! Everything else round-trips: the output of [`dumps`] parses back to a
//! structurally equal document in both layouts.

use crate::document::{Document, Object, ObjectId};
use crate::error::SerializeError;
use crate::grammar::{is_identifier, is_property_name};
use crate::value::Value;

/// Layout of the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    /// One item per line with indentation. When false everything goes on a
    /// single line with `;` separators and no spacing.
    pub beautify: bool,
    /// Spaces per nesting level, only used when beautifying.
    pub indent: usize,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            beautify: true,
            indent: 4,
        }
    }
}

impl DumpOptions {
    /// Single-line output without whitespace.
    pub fn compact() -> Self {
        Self {
            beautify: false,
            indent: 0,
        }
    }
}

type Result<T> = std::result::Result<T, SerializeError>;

/// Serialize `doc` to Unke text.
pub fn dumps<X>(doc: &Document<X>, options: &DumpOptions) -> Result<String> {
    let root = doc.root().ok_or(SerializeError::MissingRoot)?;
    Writer { doc, options }.object(root, 0, false)
}

struct Writer<'a, X> {
    doc: &'a Document<X>,
    options: &'a DumpOptions,
}

impl<X> Writer<'_, X> {
    fn pad(&self, level: usize) -> String {
        if self.options.beautify {
            " ".repeat(level * self.options.indent)
        } else {
            String::new()
        }
    }

    /// Text written after each child and property.
    fn terminator(&self) -> &'static str {
        if self.options.beautify {
            "\n"
        } else {
            ";"
        }
    }

    fn object(&self, id: ObjectId, level: usize, no_leading_indent: bool) -> Result<String> {
        let object = &self.doc[id];
        let mut text = String::new();
        if !no_leading_indent {
            text.push_str(&self.pad(level));
        }
        text.push_str(&self.header(object)?);

        if object.is_empty() {
            text.push('}');
            return Ok(text);
        }
        if self.options.beautify {
            text.push('\n');
        }

        for child in object.children() {
            if self.doc[*child].is_anonymous() {
                return Err(SerializeError::AnonymousChild(
                    object.name().unwrap_or_default().to_string(),
                ));
            }
            text.push_str(&self.object(*child, level + 1, false)?);
            text.push_str(self.terminator());
        }

        for (name, value) in object.properties() {
            if !is_property_name(name) {
                return Err(SerializeError::InvalidName(name.clone()));
            }
            text.push_str(&self.pad(level + 1));
            text.push_str(name);
            text.push_str(if self.options.beautify { ": " } else { ":" });
            text.push_str(&self.value(value, level + 1, true)?);
            text.push_str(self.terminator());
        }

        text.push_str(&self.pad(level));
        text.push('}');
        Ok(text)
    }

    /// `Name {`, `Name{` or a bare `{` for anonymous objects.
    fn header(&self, object: &Object<X>) -> Result<String> {
        match object.name() {
            Some(name) if !is_identifier(name) => Err(SerializeError::InvalidName(name.to_string())),
            Some(name) if self.options.beautify => Ok(format!("{} {{", name)),
            Some(name) => Ok(format!("{}{{", name)),
            None => Ok("{".to_string()),
        }
    }

    fn value(&self, value: &Value, level: usize, no_leading_indent: bool) -> Result<String> {
        let pad = if no_leading_indent {
            String::new()
        } else {
            self.pad(level)
        };

        match value {
            Value::Object(id) => Ok(format!("{}{}", pad, self.object(*id, level, true)?)),
            Value::List(items) if items.is_empty() => Ok(format!("{}[]", pad)),
            Value::List(items) => {
                let mut text = format!("{}[", pad);
                if self.options.beautify {
                    text.push('\n');
                }
                for (i, item) in items.iter().enumerate() {
                    text.push_str(&self.value(item, level + 1, false)?);
                    if i + 1 < items.len() {
                        text.push(',');
                    }
                    if self.options.beautify {
                        text.push('\n');
                    }
                }
                text.push_str(&self.pad(level));
                text.push(']');
                Ok(text)
            }
            Value::Boolean(b) => Ok(format!("{}{}", pad, b)),
            Value::Integer(n) => Ok(format!("{}{}", pad, n)),
            Value::Float(f) => Ok(format!("{}{}", pad, encode_float(*f)?)),
            Value::String(s) => Ok(format!("{}{}", pad, encode_string(s))),
        }
    }
}

/// Render a float so that it lexes as a float again.
fn encode_float(f: f64) -> Result<String> {
    if !f.is_finite() {
        return Err(SerializeError::NonFiniteFloat(f));
    }
    let s = f.to_string();
    if s.contains('.') {
        Ok(s)
    } else {
        Ok(format!("{}.0", s))
    }
}

/// Double-quoted string literal with escapes.
fn encode_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
