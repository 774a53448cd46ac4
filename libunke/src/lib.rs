//! Unke parser and serializer.
//!
//! Unke is a small, human-writable markup language for trees of named
//! objects. An object has a name tag, child objects, and typed properties:
//!
//! ```text
//! Tree {
//!     Branch { leaves: 120 }
//!     height: 12.5       // meters
//!     tags: ['oak', "old"]
//! }
//! ```
//!
//! # Parsing Pipeline
//!
//! 1. **Grammar**: An ordered table of token kinds with their patterns and
//!    flags. Order decides precedence when several patterns match.
//!
//! 2. **Lexer**: Converts source text into a flat token stream, dropping
//!    whitespace and comments but keeping line breaks, which separate
//!    properties.
//!
//! 3. **Parser**: A stack machine that folds the token stream into a
//!    [`Document`], an arena of [`Object`]s addressed by [`ObjectId`].
//!
//! [`dumps`] renders a document back to text and the [`convert`] module maps
//! it to and from a generic JSON-shaped dictionary.

pub mod convert;
mod document;
mod dump;
mod error;
mod grammar;
mod lexer;
mod parser;
mod value;

use std::fs;
use std::path::Path;

use tracing::debug;

pub use convert::{
    document_to_json, document_to_value, json_to_document, value_to_document, JsonOptions,
};
pub use document::{Document, Object, ObjectId};
pub use dump::{dumps, DumpOptions};
pub use error::{
    ConvertError, Error, ErrorKind, LexErrorKind, Location, ParseError, Result, SerializeError,
    SyntaxError,
};
pub use grammar::{is_identifier, is_property_name, Flag, GrammarEntry, TokenKind, GRAMMAR};
pub use lexer::{lex, Token};
pub use parser::{ClosedObject, DefaultFactory, ObjectClosedHook, ObjectFactory, Parser};
pub use value::Value;

/// Parse an Unke document from a string.
///
/// # Example
///
/// ```
/// use libunke::{parse, Value};
///
/// let doc = parse("Root { size: 3 }").unwrap();
/// let root = doc.root_object().unwrap();
/// assert_eq!(root.property("size"), Some(&Value::Integer(3)));
/// ```
pub fn parse(input: &str) -> Result<Document> {
    parse_with_filename(input, None)
}

/// Parse an Unke document from a string with a filename for error messages.
pub fn parse_with_filename(input: &str, filename: Option<&str>) -> Result<Document> {
    let mut parser = Parser::new();
    parser.set_filename(filename);
    parser.parse(input)
}

/// Same as [`parse`].
pub fn loads(input: &str) -> Result<Document> {
    parse(input)
}

/// Read and parse an Unke file.
pub fn load(path: impl AsRef<Path>) -> std::result::Result<Document, Error> {
    load_with(path, &mut Parser::new())
}

/// Read and parse an Unke file with a configured parser. Error locations
/// name the file.
pub fn load_with<F: ObjectFactory>(
    path: impl AsRef<Path>,
    parser: &mut Parser<'_, F>,
) -> std::result::Result<Document<F::Ext>, Error> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading");
    let input = fs::read_to_string(path)?;
    parser.set_filename(Some(&path.display().to_string()));
    Ok(parser.parse(&input)?)
}

/// Serialize a document into a file. Beautified output ends with a newline.
pub fn dump<X>(
    path: impl AsRef<Path>,
    doc: &Document<X>,
    options: &DumpOptions,
) -> std::result::Result<(), Error> {
    let path = path.as_ref();
    let mut text = dumps(doc, options)?;
    if options.beautify {
        text.push('\n');
    }
    debug!(path = %path.display(), bytes = text.len(), "writing");
    fs::write(path, text)?;
    Ok(())
}
