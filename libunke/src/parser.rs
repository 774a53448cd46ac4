//! Phase 2: Parser
//!
//! A stack machine over the token stream. The hierarchy stack holds the open
//! objects and the lists being collected; each token is checked against the
//! state left by the previous ones and either changes that state or aborts
//! the parse with a [`SyntaxError`].
//!
//! Separator rules:
//! - siblings inside an object are separated by `;` or a line break
//! - list elements are separated by `,`, and a trailing `,` is an error
//! - once the root object is closed only line breaks may follow

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};

use crate::document::{Document, Object, ObjectId};
use crate::error::{ParseContext, ParseError, Result, SyntaxError};
use crate::grammar::TokenKind;
use crate::lexer::{lex_with_context, Token};
use crate::value::{drop_flat, Value};

/// Produces the payload stored in [`Object::ext`](crate::Object) for every
/// object the parser creates.
pub trait ObjectFactory {
    type Ext;

    /// A fresh payload for an object that has no children or properties yet.
    fn create_empty(&mut self) -> Self::Ext;
}

/// Factory producing `X::default()`; with `X = ()` this is the plain object.
pub struct DefaultFactory<X = ()>(PhantomData<fn() -> X>);

impl<X> Default for DefaultFactory<X> {
    fn default() -> Self {
        DefaultFactory(PhantomData)
    }
}

impl<X: Default> ObjectFactory for DefaultFactory<X> {
    type Ext = X;

    fn create_empty(&mut self) -> X {
        X::default()
    }
}

/// Callback run once per object, right after its closing `}`.
pub type ObjectClosedHook<'h, X> = Box<dyn FnMut(ClosedObject<'_, X>) + 'h>;

/// The object an [`ObjectClosedHook`] is called with.
///
/// Dereferences to the object itself, which may be modified. The rest of the
/// document is only readable: the tree is still being built.
pub struct ClosedObject<'a, X> {
    doc: &'a mut Document<X>,
    id: ObjectId,
}

impl<X> ClosedObject<'_, X> {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The partially built document, for looking up children and parents.
    pub fn document(&self) -> &Document<X> {
        &*self.doc
    }
}

impl<X> Deref for ClosedObject<'_, X> {
    type Target = Object<X>;

    fn deref(&self) -> &Object<X> {
        &self.doc[self.id]
    }
}

impl<X> DerefMut for ClosedObject<'_, X> {
    fn deref_mut(&mut self) -> &mut Object<X> {
        &mut self.doc[self.id]
    }
}

/// Configurable Unke parser.
///
/// ```
/// use libunke::Parser;
///
/// let doc = Parser::new().parse("Root { size: 3 }").unwrap();
/// let root = doc.root().unwrap();
/// assert_eq!(doc[root].name(), Some("Root"));
/// ```
pub struct Parser<'h, F: ObjectFactory = DefaultFactory> {
    factory: F,
    on_object_closed: Option<ObjectClosedHook<'h, F::Ext>>,
    filename: Option<String>,
}

impl<'h> Parser<'h> {
    /// A parser producing plain objects.
    pub fn new() -> Self {
        Self::with_factory(DefaultFactory::default())
    }
}

impl Default for Parser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h, F: ObjectFactory> Parser<'h, F> {
    /// A parser whose objects carry payloads made by `factory`.
    pub fn with_factory(factory: F) -> Self {
        Self {
            factory,
            on_object_closed: None,
            filename: None,
        }
    }

    /// Name reported in error locations.
    pub fn filename(mut self, filename: &str) -> Self {
        self.set_filename(Some(filename));
        self
    }

    pub fn set_filename(&mut self, filename: Option<&str>) {
        self.filename = filename.map(String::from);
    }

    /// Run `hook` for each object once it is fully populated. Inner objects
    /// are reported before the objects containing them; the root comes last.
    pub fn on_object_closed(
        mut self,
        hook: impl FnMut(ClosedObject<'_, F::Ext>) + 'h,
    ) -> Self {
        self.on_object_closed = Some(Box::new(hook));
        self
    }

    /// Lex and parse `input`.
    pub fn parse(&mut self, input: &str) -> Result<Document<F::Ext>> {
        let ctx = ParseContext::new(self.filename.as_deref());
        debug!(bytes = input.len(), filename = ?ctx.filename, "parsing");
        let tokens = lex_with_context(input, &ctx)?;
        self.run(&tokens, ctx)
    }

    /// Parse an already lexed token stream.
    pub fn parse_tokens(&mut self, tokens: &[Token]) -> Result<Document<F::Ext>> {
        let ctx = ParseContext::new(self.filename.as_deref());
        self.run(tokens, ctx)
    }

    fn run(&mut self, tokens: &[Token], ctx: ParseContext) -> Result<Document<F::Ext>> {
        let mut state = State::new(ctx);
        for token in tokens {
            state.step(token, &mut self.factory, &mut self.on_object_closed)?;
        }
        let doc = state.finish()?;
        debug!(tokens = tokens.len(), objects = doc.len(), "parsed");
        Ok(doc)
    }
}

/// Where a list goes once its `]` is reached.
enum ListTarget {
    /// Value of the named property of the enclosing object.
    Property(String),
    /// Element of the enclosing list.
    Element,
}

/// A list still being collected.
struct ListContext {
    target: ListTarget,
    values: Vec<Value>,
    separator_expected: bool,
}

impl ListContext {
    fn new(target: ListTarget) -> Self {
        Self {
            target,
            values: Vec::new(),
            separator_expected: false,
        }
    }
}

impl Drop for ListContext {
    fn drop(&mut self) {
        drop_flat(std::mem::take(&mut self.values));
    }
}

enum Frame {
    Object(ObjectId),
    List(ListContext),
}

struct State<X> {
    ctx: ParseContext,
    doc: Document<X>,
    hierarchy: Vec<Frame>,
    pending_object_tag: Option<String>,
    pending_property_tag: Option<String>,
    separator_expected: bool,
    separator_allowed: bool,
    end_of_document: bool,
    line: usize,
    column: usize,
}

impl<X> State<X> {
    fn new(ctx: ParseContext) -> Self {
        Self {
            ctx,
            doc: Document::new(),
            hierarchy: Vec::new(),
            pending_object_tag: None,
            pending_property_tag: None,
            separator_expected: false,
            separator_allowed: true,
            end_of_document: false,
            line: 1,
            column: 0,
        }
    }

    fn error(&self, error: SyntaxError) -> ParseError {
        ParseError::syntax(error, self.ctx.location(self.line, self.column))
    }

    fn unexpected(&self, token: &Token) -> ParseError {
        self.error(SyntaxError::UnexpectedToken(token.text.clone()))
    }

    fn top_is_list(&self) -> bool {
        matches!(self.hierarchy.last(), Some(Frame::List(_)))
    }

    fn step<F>(
        &mut self,
        token: &Token,
        factory: &mut F,
        hook: &mut Option<ObjectClosedHook<'_, X>>,
    ) -> Result<()>
    where
        F: ObjectFactory<Ext = X>,
    {
        self.line = token.line;
        self.column = token.column;

        if self.end_of_document && token.kind != TokenKind::LineBreak {
            return Err(self.error(SyntaxError::EndOfDocumentExpected));
        }
        if self.pending_object_tag.is_some()
            && !matches!(token.kind, TokenKind::BlockStart | TokenKind::LineBreak)
        {
            return Err(self.error(SyntaxError::ExpectedBlockStart));
        }

        match token.kind {
            TokenKind::ObjectTag => self.object_tag(token),
            TokenKind::BlockStart => self.block_start(token, factory),
            TokenKind::BlockEnd => self.block_end(token, hook),
            TokenKind::ListStart => self.list_start(token),
            TokenKind::ListEnd => self.list_end(token),
            TokenKind::ListSeparator => self.list_separator(token),
            TokenKind::PropertyTag => self.property_tag(token),
            TokenKind::PropertySeparator => self.property_separator(token),
            TokenKind::LineBreak => {
                // A line break alone satisfies the separator requirement.
                self.separator_expected = false;
                Ok(())
            }
            _ if token.is_value() => self.scalar(token),
            _ => Err(self.unexpected(token)),
        }
    }

    fn object_tag(&mut self, token: &Token) -> Result<()> {
        if self.doc.root().is_some() {
            match self.hierarchy.last() {
                Some(Frame::List(list)) if list.separator_expected => {
                    return Err(self.error(SyntaxError::ExpectedComma));
                }
                Some(Frame::List(_)) => {}
                _ if self.separator_expected => {
                    return Err(self.error(SyntaxError::ExpectedSeparator));
                }
                _ => {}
            }
        }
        self.pending_object_tag = Some(token.text.clone());
        Ok(())
    }

    fn block_start<F>(&mut self, token: &Token, factory: &mut F) -> Result<()>
    where
        F: ObjectFactory<Ext = X>,
    {
        let has_root = self.doc.root().is_some();
        if has_root
            && self.pending_property_tag.is_none()
            && self.pending_object_tag.is_none()
            && !self.top_is_list()
        {
            return Err(self.unexpected(token));
        }
        if let Some(Frame::List(list)) = self.hierarchy.last() {
            if list.separator_expected {
                return Err(self.error(SyntaxError::ExpectedComma));
            }
        }

        let name = self.pending_object_tag.take();
        let id = self.doc.new_object(name.as_deref(), factory.create_empty());
        self.separator_expected = false;

        match self.hierarchy.last_mut() {
            None => self.doc.set_root(id),
            Some(Frame::List(list)) => list.values.push(Value::Object(id)),
            Some(Frame::Object(parent)) => {
                let parent = *parent;
                match self.pending_property_tag.take() {
                    Some(property) => {
                        self.doc.set_property(parent, property, Value::Object(id));
                    }
                    None => self.doc.add_child(parent, id),
                }
            }
        }
        self.hierarchy.push(Frame::Object(id));
        Ok(())
    }

    fn block_end(
        &mut self,
        token: &Token,
        hook: &mut Option<ObjectClosedHook<'_, X>>,
    ) -> Result<()> {
        let id = match self.hierarchy.last() {
            Some(Frame::Object(id)) => *id,
            _ => return Err(self.unexpected(token)),
        };
        if self.pending_property_tag.is_some() {
            return Err(self.error(SyntaxError::ExpectedValue));
        }

        if let Some(hook) = hook.as_mut() {
            hook(ClosedObject {
                doc: &mut self.doc,
                id,
            });
        }
        trace!(name = ?self.doc[id].name(), line = self.line, "object closed");
        self.hierarchy.pop();

        match self.hierarchy.last_mut() {
            None => self.end_of_document = true,
            Some(Frame::List(list)) => list.separator_expected = true,
            Some(Frame::Object(_)) => {
                self.separator_expected = true;
                self.separator_allowed = true;
            }
        }
        Ok(())
    }

    fn list_start(&mut self, token: &Token) -> Result<()> {
        let list = match self.hierarchy.last() {
            Some(Frame::List(parent)) => {
                if parent.separator_expected {
                    return Err(self.error(SyntaxError::ExpectedComma));
                }
                ListContext::new(ListTarget::Element)
            }
            Some(Frame::Object(_)) => match self.pending_property_tag.take() {
                Some(property) => ListContext::new(ListTarget::Property(property)),
                None => return Err(self.unexpected(token)),
            },
            None => return Err(self.unexpected(token)),
        };
        self.hierarchy.push(Frame::List(list));
        Ok(())
    }

    fn list_end(&mut self, token: &Token) -> Result<()> {
        match self.hierarchy.last() {
            Some(Frame::List(list)) => {
                if !list.values.is_empty() && !list.separator_expected {
                    return Err(self.error(SyntaxError::TrailingComma));
                }
            }
            _ => return Err(self.unexpected(token)),
        }
        let Some(Frame::List(mut list)) = self.hierarchy.pop() else {
            return Err(self.unexpected(token));
        };
        let values = std::mem::take(&mut list.values);
        let target = std::mem::replace(&mut list.target, ListTarget::Element);

        match (target, self.hierarchy.last_mut()) {
            (ListTarget::Element, Some(Frame::List(parent))) => {
                parent.values.push(Value::List(values));
                parent.separator_expected = true;
            }
            (ListTarget::Property(property), Some(Frame::Object(owner))) => {
                let owner = *owner;
                self.doc.set_property(owner, property, Value::List(values));
                self.separator_expected = true;
                self.separator_allowed = true;
            }
            _ => return Err(self.unexpected(token)),
        }
        Ok(())
    }

    fn list_separator(&mut self, token: &Token) -> Result<()> {
        match self.hierarchy.last_mut() {
            Some(Frame::List(list)) if list.separator_expected => {
                list.separator_expected = false;
                Ok(())
            }
            _ => Err(self.unexpected(token)),
        }
    }

    fn property_tag(&mut self, token: &Token) -> Result<()> {
        if self.separator_expected {
            return Err(self.error(SyntaxError::ExpectedSeparator));
        }
        if self.top_is_list() || self.hierarchy.is_empty() {
            return Err(self.error(SyntaxError::UnexpectedProperty));
        }
        if self.pending_property_tag.is_some() {
            return Err(self.error(SyntaxError::ExpectedValue));
        }
        let name = token.text[..token.text.len() - 1].trim_end();
        self.pending_property_tag = Some(name.to_string());
        self.separator_expected = false;
        self.separator_allowed = false;
        Ok(())
    }

    fn property_separator(&mut self, token: &Token) -> Result<()> {
        if !self.separator_allowed || self.top_is_list() {
            return Err(self.unexpected(token));
        }
        self.separator_expected = false;
        Ok(())
    }

    fn scalar(&mut self, token: &Token) -> Result<()> {
        match self.hierarchy.last() {
            Some(Frame::List(list)) if list.separator_expected => {
                return Err(self.error(SyntaxError::ExpectedComma));
            }
            Some(Frame::List(_)) => {}
            Some(Frame::Object(_)) if self.pending_property_tag.is_some() => {}
            _ => {
                return Err(self.error(SyntaxError::UnexpectedValue(token.text.clone())));
            }
        }

        let value = decode_scalar(token).map_err(|e| self.error(e))?;

        match self.hierarchy.last_mut() {
            Some(Frame::List(list)) => {
                list.values.push(value);
                list.separator_expected = true;
            }
            Some(Frame::Object(id)) => {
                let id = *id;
                if let Some(property) = self.pending_property_tag.take() {
                    self.doc.set_property(id, property, value);
                }
                self.separator_expected = true;
                self.separator_allowed = true;
            }
            None => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Document<X>> {
        if self.pending_object_tag.is_some() {
            return Err(self.error(SyntaxError::ExpectedBlockStart));
        }
        if !self.hierarchy.is_empty() {
            return Err(self.error(SyntaxError::ExpectedBlockEnd));
        }
        if self.doc.root().is_none() {
            return Err(self.error(SyntaxError::MissingRoot));
        }
        Ok(self.doc)
    }
}

/// Decode the text of a value token.
fn decode_scalar(token: &Token) -> std::result::Result<Value, SyntaxError> {
    let text = token.text.as_str();
    match token.kind {
        TokenKind::Integer => text
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| SyntaxError::IntegerOutOfRange(text.to_string())),
        TokenKind::Float => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| SyntaxError::UnexpectedValue(text.to_string())),
        TokenKind::Boolean => Ok(Value::Boolean(text == "true")),
        TokenKind::String => unescape(&text[1..text.len() - 1]).map(Value::String),
        _ => Err(SyntaxError::UnexpectedValue(text.to_string())),
    }
}

/// Resolve backslash escapes; single- and double-quoted strings share the rules.
fn unescape(body: &str) -> std::result::Result<String, SyntaxError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().unwrap_or('\\');
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '\\' | '\'' | '"' | '/' => out.push(escaped),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => return Err(SyntaxError::InvalidEscape(format!("\\u{}", hex))),
                }
            }
            other => return Err(SyntaxError::InvalidEscape(format!("\\{}", other))),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(input: &str) -> Result<Document> {
        Parser::new().parse(input)
    }

    fn syntax_error(input: &str) -> SyntaxError {
        match parse(input).unwrap_err() {
            ParseError::Syntax { error, .. } => error,
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_object_properties() {
        let doc = parse(
            "Object {\n  stringprop: \"Hello\"\n  intprop: 42\n  floatprop: 3.14\n  boolprop: true\n}",
        )
        .unwrap();
        let root = &doc[doc.root().unwrap()];
        assert_eq!(root.name(), Some("Object"));
        assert_eq!(root.property("stringprop"), Some(&Value::from("Hello")));
        assert_eq!(root.property("intprop"), Some(&Value::Integer(42)));
        assert_eq!(root.property("floatprop"), Some(&Value::Float(3.14)));
        assert_eq!(root.property("boolprop"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_anonymous_root() {
        let doc = parse("{}").unwrap();
        let root = doc.root_object().unwrap();
        assert!(root.is_anonymous());
        assert!(root.is_empty());
    }

    #[test]
    fn test_children_in_order() {
        let doc = parse("Root {\n  A { B { p: 'x' } }\n  A {}\n}").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc[root].children().len(), 2);
        let first = doc[root].children()[0];
        let inner = doc[first].children()[0];
        assert_eq!(doc[inner].name(), Some("B"));
        assert_eq!(doc[inner].parent(), Some(first));
        assert_eq!(doc[inner].property("p"), Some(&Value::from("x")));
    }

    #[test]
    fn test_nested_lists() {
        let doc = parse("Root { l: [[1,2],[3]] }").unwrap();
        let l = doc.root_object().unwrap().property("l").unwrap();
        assert_eq!(
            l,
            &Value::List(vec![
                Value::List(vec![Value::Integer(1), Value::Integer(2)]),
                Value::List(vec![Value::Integer(3)]),
            ])
        );
    }

    #[test]
    fn test_objects_in_list() {
        let doc = parse("Root { items: [ A { x: 1 }, { }, 5 ] }").unwrap();
        let root = doc.root().unwrap();
        let items = doc[root].property("items").unwrap().as_list().unwrap();
        assert_eq!(items.len(), 3);
        let a = items[0].as_object().unwrap();
        assert_eq!(doc[a].name(), Some("A"));
        assert_eq!(doc[a].parent(), Some(root));
        assert!(doc[items[1].as_object().unwrap()].is_anonymous());
        assert_eq!(items[2], Value::Integer(5));
        assert!(doc[root].children().is_empty());
    }

    #[test]
    fn test_object_property_value() {
        let doc = parse("Root { color: Rgb { r: 255 }; name: 'x' }").unwrap();
        let root = doc.root().unwrap();
        let color = doc[root].property("color").unwrap().as_object().unwrap();
        assert_eq!(doc[color].name(), Some("Rgb"));
        assert_eq!(doc[color].property("r"), Some(&Value::Integer(255)));
    }

    #[test]
    fn test_minified_with_repeated_separators() {
        let doc = parse(
            "Tree{Trunk{Branch{props:[true,false,1,42,3.14,Apple{color:'red';size:1},Apple{}]};;;;Branch{}}}",
        )
        .unwrap();
        let trunk = doc.root_object().unwrap().children()[0];
        let branch = doc[trunk].children()[0];
        let props = doc[branch].property("props").unwrap().as_list().unwrap();
        let apple = props[5].as_object().unwrap();
        assert_eq!(doc[apple].property("color"), Some(&Value::from("red")));
        assert_eq!(doc[trunk].children().len(), 2);
    }

    #[test]
    fn test_semicolon_after_empty_object_value() {
        let doc = parse("Root{a:Empty{};b:[];c:1;}").unwrap();
        assert_eq!(doc.root_object().unwrap().properties().len(), 3);
    }

    #[test]
    fn test_duplicate_property_overwrites() {
        let doc = parse("Root { a: 1; b: 2; a: 3 }").unwrap();
        let root = doc.root_object().unwrap();
        assert_eq!(root.properties().len(), 2);
        assert_eq!(root.property("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_string_escapes() {
        let doc = parse(r#"Root { a: "tab\tquote\" é"; b: 'it\'s\n' }"#).unwrap();
        let root = doc.root_object().unwrap();
        assert_eq!(root.property("a"), Some(&Value::from("tab\tquote\" é")));
        assert_eq!(root.property("b"), Some(&Value::from("it's\n")));
    }

    #[test]
    fn test_trailing_newlines_after_root() {
        assert!(parse("\n\nRoot {}\n\n").is_ok());
    }

    #[test]
    fn test_list_missing_comma() {
        assert_eq!(syntax_error("Root { l: [1\n2] }"), SyntaxError::ExpectedComma);
    }

    #[test]
    fn test_list_trailing_comma() {
        assert_eq!(syntax_error("Root { l: [1,2,] }"), SyntaxError::TrailingComma);
    }

    #[test]
    fn test_semicolon_without_value() {
        assert_eq!(
            syntax_error("Root {\n  test: ; 0\n}"),
            SyntaxError::UnexpectedToken(";".to_string())
        );
    }

    #[test]
    fn test_semicolon_in_list() {
        assert_eq!(
            syntax_error("Root {\n  test: 21\n  list: [\n    1;\n  ]\n}"),
            SyntaxError::UnexpectedToken(";".to_string())
        );
    }

    #[test]
    fn test_property_in_list() {
        assert_eq!(
            syntax_error("Node { test: [\n  test:\n] }"),
            SyntaxError::UnexpectedProperty
        );
    }

    #[test]
    fn test_missing_separator_between_properties() {
        assert_eq!(syntax_error("Root { a: 1 b: 2 }"), SyntaxError::ExpectedSeparator);
        assert_eq!(syntax_error("Root { A {} B {} }"), SyntaxError::ExpectedSeparator);
    }

    #[test]
    fn test_end_of_document() {
        let err = parse("Root {\n}\n// closed\n}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.to_string(), "End of document expected, line 4:0");
    }

    #[test]
    fn test_unterminated_block() {
        assert_eq!(syntax_error("Root { A {"), SyntaxError::ExpectedBlockEnd);
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(syntax_error("Root { a: }"), SyntaxError::ExpectedValue);
    }

    #[test]
    fn test_value_without_property() {
        assert_eq!(
            syntax_error("Root { 42 }"),
            SyntaxError::UnexpectedValue("42".to_string())
        );
    }

    #[test]
    fn test_anonymous_child_rejected() {
        assert_eq!(
            syntax_error("Root { {} }"),
            SyntaxError::UnexpectedToken("{".to_string())
        );
    }

    #[test]
    fn test_object_tag_needs_block() {
        assert_eq!(syntax_error("Root { Child a: 1 }"), SyntaxError::ExpectedBlockStart);
        assert_eq!(syntax_error("Root"), SyntaxError::ExpectedBlockStart);
        assert!(parse("Root\n{}").is_ok());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(syntax_error(""), SyntaxError::MissingRoot);
        assert_eq!(syntax_error("// nothing here\n"), SyntaxError::MissingRoot);
    }

    #[test]
    fn test_integer_out_of_range() {
        assert_eq!(
            syntax_error("Root { n: 99999999999999999999 }"),
            SyntaxError::IntegerOutOfRange("99999999999999999999".to_string())
        );
    }

    #[test]
    fn test_invalid_escape() {
        assert_eq!(
            syntax_error(r#"Root { s: "\q" }"#),
            SyntaxError::InvalidEscape("\\q".to_string())
        );
    }

    #[test]
    fn test_stray_comment_end() {
        assert_eq!(
            syntax_error("Root { */ }"),
            SyntaxError::UnexpectedToken("*/".to_string())
        );
    }

    fn deep_list(depth: usize, closed: usize) -> String {
        format!("Root {{ l: {}{}", "[".repeat(depth), "]".repeat(closed))
    }

    #[test]
    fn test_deeply_nested_lists() {
        let doc = parse(&format!("{} }}", deep_list(20_000, 20_000))).unwrap();
        let mut depth = 0;
        let mut value = doc.root_object().unwrap().property("l").unwrap();
        while let Value::List(items) = value {
            depth += 1;
            match items.first() {
                Some(inner) => value = inner,
                None => break,
            }
        }
        assert_eq!(depth, 20_000);
    }

    #[test]
    fn test_deeply_nested_lists_left_open() {
        assert_eq!(
            syntax_error(&deep_list(20_000, 10_000)),
            SyntaxError::ExpectedBlockEnd
        );
    }

    #[test]
    fn test_hook_runs_post_order() {
        let mut closed = Vec::new();
        {
            let mut parser = Parser::new().on_object_closed(|object| {
                closed.push(object.name().unwrap_or_default().to_string());
            });
            parser.parse("Outer { Inner {}\n Other { Deep {} } }").unwrap();
        }
        assert_eq!(closed, vec!["Inner", "Deep", "Other", "Outer"]);
    }

    #[test]
    fn test_hook_sees_populated_object() {
        let mut counts = Vec::new();
        {
            let mut parser = Parser::new().on_object_closed(|object| {
                counts.push((object.children().len(), object.properties().len()));
            });
            parser.parse("Root { A {}\n B {}\n x: 1 }").unwrap();
        }
        assert_eq!(counts, vec![(0, 0), (0, 0), (2, 1)]);
    }

    #[test]
    fn test_hook_reads_rest_of_document() {
        let mut seen = Vec::new();
        {
            let mut parser = Parser::new().on_object_closed(|object| {
                let doc = object.document();
                let children: Vec<_> = object
                    .children()
                    .iter()
                    .filter_map(|child| doc[*child].name())
                    .map(String::from)
                    .collect();
                let under_root = object.parent().is_some() && object.parent() == doc.root();
                seen.push((object.id(), children, under_root));
            });
            parser.parse("Root { A { B {} }\n C {} }").unwrap();
        }
        let summary: Vec<_> = seen.iter().map(|(_, c, r)| (c.clone(), *r)).collect();
        assert_eq!(
            summary,
            vec![
                (vec![], false),
                (vec!["B".to_string()], true),
                (vec![], true),
                (vec!["A".to_string(), "C".to_string()], false),
            ]
        );
        assert_eq!(seen.last().map(|(id, ..)| id.index()), Some(0));
    }

    #[derive(Debug, Default, PartialEq)]
    struct Counted {
        serial: usize,
        validated: bool,
    }

    struct CountingFactory {
        next: usize,
    }

    impl ObjectFactory for CountingFactory {
        type Ext = Counted;

        fn create_empty(&mut self) -> Counted {
            self.next += 1;
            Counted {
                serial: self.next,
                validated: false,
            }
        }
    }

    #[test]
    fn test_custom_factory_and_hook() {
        let mut parser = Parser::with_factory(CountingFactory { next: 0 })
            .on_object_closed(|mut object| object.ext.validated = true);
        let doc = parser.parse("Root { A {}\n b: B {} }").unwrap();
        assert_eq!(doc.len(), 3);
        let serials: Vec<_> = doc.iter().map(|(_, o)| o.ext.serial).collect();
        assert_eq!(serials, vec![1, 2, 3]);
        assert!(doc.iter().all(|(_, o)| o.ext.validated));
    }

    #[test]
    fn test_filename_in_error() {
        let err = Parser::new()
            .filename("broken.unk")
            .parse("Root {\n  a: [1,]\n}")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected token \",\" before \"]\", line 2:8 of <broken.unk>"
        );
    }
}
