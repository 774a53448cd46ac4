//! Error types for Unke parsing, serialization and conversion.

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type for Unke parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse context carrying filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub filename: Option<String>,
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Build a location for an error at `line` (1-based) and `column` (0-based).
    pub fn location(&self, line: usize, column: usize) -> Location {
        Location {
            line,
            column,
            filename: self.filename.clone(),
        }
    }
}

/// Where an error was detected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 0-based column within the line.
    pub column: usize,
    pub filename: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ", line {}:{}", self.line, self.column)?;
        if let Some(name) = &self.filename {
            write!(f, " of <{}>", name)?;
        }
        Ok(())
    }
}

/// Error raised while lexing or parsing a document.
///
/// Parsing is fail-fast: the first problem found is the only one reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// No grammar entry matches at the current offset.
    #[error("Illegal character \"{character}\"{location}")]
    IllegalCharacter { character: char, location: Location },

    /// A `/*` comment is never closed.
    #[error("End of comment expected{location}")]
    UnterminatedComment { location: Location },

    /// The token stream violates the document grammar.
    #[error("{error}{location}")]
    Syntax {
        error: SyntaxError,
        location: Location,
    },
}

/// Grammar violations detected by the parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Unexpected token \"{0}\"")]
    UnexpectedToken(String),

    #[error("Unexpected value \"{0}\"")]
    UnexpectedValue(String),

    #[error("Unexpected property")]
    UnexpectedProperty,

    #[error("Expected token \",\"")]
    ExpectedComma,

    #[error("Expected token \";\" or line break")]
    ExpectedSeparator,

    #[error("Expected value")]
    ExpectedValue,

    #[error("Unexpected token \",\" before \"]\"")]
    TrailingComma,

    #[error("End of document expected")]
    EndOfDocumentExpected,

    #[error("Expected token \"}}\"")]
    ExpectedBlockEnd,

    #[error("Expected token \"{{\"")]
    ExpectedBlockStart,

    #[error("Expected root object")]
    MissingRoot,

    #[error("Integer out of range \"{0}\"")]
    IntegerOutOfRange(String),

    #[error("Invalid escape sequence \"{0}\"")]
    InvalidEscape(String),
}

/// Which lexer failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    IllegalCharacter,
    UnterminatedComment,
}

/// Whether a [`ParseError`] came from the lexer or the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex(LexErrorKind),
    Syntax,
}

impl ParseError {
    pub(crate) fn syntax(error: SyntaxError, location: Location) -> Self {
        ParseError::Syntax { error, location }
    }

    /// Classify this error as a lexer or parser failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::IllegalCharacter { .. } => ErrorKind::Lex(LexErrorKind::IllegalCharacter),
            ParseError::UnterminatedComment { .. } => {
                ErrorKind::Lex(LexErrorKind::UnterminatedComment)
            }
            ParseError::Syntax { .. } => ErrorKind::Syntax,
        }
    }

    /// Where the error was detected.
    pub fn location(&self) -> &Location {
        match self {
            ParseError::IllegalCharacter { location, .. }
            | ParseError::UnterminatedComment { location }
            | ParseError::Syntax { location, .. } => location,
        }
    }

    /// 1-based line of the error.
    pub fn line(&self) -> usize {
        self.location().line
    }

    /// 0-based column of the error.
    pub fn column(&self) -> usize {
        self.location().column
    }

    /// The message without location information.
    pub fn message(&self) -> String {
        match self {
            ParseError::IllegalCharacter { character, .. } => {
                format!("Illegal character \"{}\"", character)
            }
            ParseError::UnterminatedComment { .. } => "End of comment expected".to_string(),
            ParseError::Syntax { error, .. } => error.to_string(),
        }
    }
}

/// Error raised when a document cannot be rendered as Unke text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializeError {
    #[error("Document has no root object")]
    MissingRoot,

    #[error("Anonymous object cannot be written as a child of \"{0}\"")]
    AnonymousChild(String),

    #[error("Invalid name \"{0}\"")]
    InvalidName(String),

    #[error("Float {0} has no Unke representation")]
    NonFiniteFloat(f64),
}

/// Error raised when converting between documents and the dictionary form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Document has no root object")]
    MissingRoot,

    #[error("Expected an object, got {0}")]
    ExpectedObject(String),

    #[error("Expected {expected} for \"{field}\", got {found}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Property \"{0}\" is null; Unke has no null type")]
    NullProperty(String),

    #[error("Number {0} does not fit a 64-bit integer or float")]
    UnsupportedNumber(String),

    #[error("Float {0} has no JSON representation")]
    NonFiniteFloat(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        ConvertError::Json(e.to_string())
    }
}

/// Any failure of the file helpers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}
