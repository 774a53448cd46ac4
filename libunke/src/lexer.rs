//! Phase 1: Lexer
//!
//! A single left-to-right scan that classifies the input with the grammar
//! table. At each offset the first matching grammar entry decides the
//! outcome:
//! - ignored entries (whitespace, `//` comments) are skipped
//! - `/*` switches into comment mode until the next `*/`
//! - everything else becomes a [`Token`]
//!
//! Line breaks are kept as tokens because the parser uses them as
//! property separators.

use tracing::trace;

use crate::error::{ParseContext, ParseError, Result};
use crate::grammar::{Flag, TokenKind, GRAMMAR};

/// A classified lexeme with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub flags: &'static [Flag],
    /// Byte offset of the first character.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 0-based column (characters since the start of the line).
    pub column: usize,
}

impl Token {
    /// Whether the token carries a scalar value.
    pub fn is_value(&self) -> bool {
        self.flags.contains(&Flag::Value)
    }
}

/// Convert Unke text into the token stream consumed by the parser.
pub fn lex(input: &str) -> Result<Vec<Token>> {
    lex_with_context(input, &ParseContext::default())
}

pub(crate) fn lex_with_context(input: &str, ctx: &ParseContext) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    lexer.run(ctx)?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 0,
            tokens: Vec::new(),
        }
    }

    fn run(&mut self, ctx: &ParseContext) -> Result<()> {
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];

            let matched = GRAMMAR
                .iter()
                .find_map(|entry| entry.match_len(rest).map(|len| (entry, len)));

            let Some((entry, len)) = matched else {
                let character = rest.chars().next().unwrap_or_default();
                return Err(ParseError::IllegalCharacter {
                    character,
                    location: ctx.location(self.line, self.column),
                });
            };

            if entry.kind == TokenKind::CommentMultiLineStart {
                self.skip_comment(len, ctx)?;
                continue;
            }

            if !entry.has_flag(Flag::Ignore) {
                let token = Token {
                    kind: entry.kind,
                    text: rest[..len].to_string(),
                    flags: entry.flags,
                    offset: self.pos,
                    line: self.line,
                    column: self.column,
                };
                trace!(kind = ?token.kind, text = %token.text, line = token.line, "token");
                self.tokens.push(token);
            }

            self.advance(len);
        }
        Ok(())
    }

    /// Skip a `/* ... */` comment whose opening marker is `start_len` bytes long.
    fn skip_comment(&mut self, start_len: usize, ctx: &ParseContext) -> Result<()> {
        let location = ctx.location(self.line, self.column);
        self.advance(start_len);
        match self.input[self.pos..].find("*/") {
            Some(end) => {
                self.advance(end + 2);
                Ok(())
            }
            None => Err(ParseError::UnterminatedComment { location }),
        }
    }

    /// Move forward `len` bytes, keeping line and column in sync.
    fn advance(&mut self, len: usize) {
        let consumed = &self.input[self.pos..self.pos + len];
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.pos += len;
    }
}
