//! Grammar table
//!
//! The lexer walks this table top to bottom at every scan position and the
//! first entry whose pattern matches anchored at that position wins. The
//! order is therefore part of the grammar:
//!
//! - booleans come before object tags, so `true` is not an identifier
//! - property tags come before object tags, so `name:` is one token
//! - floats come before integers, so `3.14` is not cut to `3`

use once_cell::sync::Lazy;
use regex::Regex;

/// Classification of a lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `// ...` up to the end of the line
    CommentSingleLine,
    /// `{`
    BlockStart,
    /// `}`
    BlockEnd,
    /// `[`
    ListStart,
    /// `]`
    ListEnd,
    /// `,`
    ListSeparator,
    /// `;`
    PropertySeparator,
    /// `name:`
    PropertyTag,
    /// `3.14`, `-.5`, `1.0e3`
    Float,
    /// `42`, `-7`
    Integer,
    /// `true` or `false`
    Boolean,
    /// `"..."` or `'...'`
    String,
    /// `/*`
    CommentMultiLineStart,
    /// `*/`
    CommentMultiLineEnd,
    /// Identifier naming the object that follows
    ObjectTag,
    /// `\n`
    LineBreak,
    /// Horizontal whitespace
    Whitespace,
}

/// Flags attached to a grammar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// The token carries a scalar value.
    Value,
    /// The match is skipped and produces no token.
    Ignore,
}

/// One row of the grammar table.
#[derive(Debug)]
pub struct GrammarEntry {
    pub kind: TokenKind,
    /// Alternatives, tried in order.
    pub patterns: Vec<Regex>,
    pub flags: &'static [Flag],
}

impl GrammarEntry {
    fn new(kind: TokenKind, patterns: &[&str], flags: &'static [Flag]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!("^(?:{})", p)).unwrap())
            .collect();
        Self {
            kind,
            patterns,
            flags,
        }
    }

    /// Whether this entry carries `flag`.
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Length in bytes of the first pattern matching at the start of `input`.
    pub fn match_len(&self, input: &str) -> Option<usize> {
        self.patterns
            .iter()
            .find_map(|re| re.find(input).map(|m| m.end()))
    }
}

const NONE: &[Flag] = &[];
const VALUE: &[Flag] = &[Flag::Value];
const IGNORE: &[Flag] = &[Flag::Ignore];

/// The grammar table, in priority order.
pub static GRAMMAR: Lazy<Vec<GrammarEntry>> = Lazy::new(|| {
    use TokenKind::*;
    vec![
        GrammarEntry::new(CommentSingleLine, &[r"//[^\n]*"], IGNORE),
        GrammarEntry::new(BlockStart, &[r"\{"], NONE),
        GrammarEntry::new(BlockEnd, &[r"\}"], NONE),
        GrammarEntry::new(ListStart, &[r"\["], NONE),
        GrammarEntry::new(ListEnd, &[r"\]"], NONE),
        GrammarEntry::new(ListSeparator, &[r","], NONE),
        GrammarEntry::new(PropertySeparator, &[r";"], NONE),
        GrammarEntry::new(PropertyTag, &[r"[A-Za-z_][A-Za-z0-9_]*[ \t]*:"], NONE),
        GrammarEntry::new(Float, &[r"[-+]?[0-9]*\.[0-9]+(?:[eE][-+]?[0-9]+)?"], VALUE),
        GrammarEntry::new(Integer, &[r"[-+]?[0-9]+"], VALUE),
        GrammarEntry::new(Boolean, &[r"(?:true|false)\b"], VALUE),
        GrammarEntry::new(String, &[r#"'(?:[^'\\]|\\.)*'"#, r#""(?:[^"\\]|\\.)*""#], VALUE),
        GrammarEntry::new(CommentMultiLineStart, &[r"/\*"], NONE),
        GrammarEntry::new(CommentMultiLineEnd, &[r"\*/"], NONE),
        GrammarEntry::new(ObjectTag, &[r"[A-Za-z_][A-Za-z0-9_]*"], NONE),
        GrammarEntry::new(LineBreak, &[r"\n"], NONE),
        GrammarEntry::new(Whitespace, &[r"[ \t\r\x0B\x0C]+"], IGNORE),
    ]
});

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Whether `name` can be written as an object tag. `true` and `false` are
/// excluded: in front of `{` they lex as booleans.
pub fn is_identifier(name: &str) -> bool {
    is_property_name(name) && name != "true" && name != "false"
}

/// Whether `name` can be written as a property tag. Keywords are fine here,
/// `true:` lexes as a property tag.
pub fn is_property_name(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}
