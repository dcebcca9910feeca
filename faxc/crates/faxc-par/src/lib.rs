//! Recursive-descent parser for preprocessed C++20 translation units.
//!
//! `faxc-par` owns pure syntax. It never resolves a name or asks whether an
//! identifier names a type or a value — that question only `faxc-sem` can
//! answer, and the two crates are mutually recursive (templates need the
//! parser to re-enter on instantiation; the parser needs semantic lookup to
//! disambiguate `a < b` as a comparison or a template-argument list). Rather
//! than a dependency cycle, the parser calls back through the narrow
//! [`SemanticHooks`] trait; `faxc-sem` depends on `faxc-par` and supplies the
//! real implementation, while tests and standalone tools can use
//! [`NoopHooks`].
//!
//! Speculative parses (try this alternative, fall back to that one without
//! surfacing a diagnostic) use [`ParserCheckpoint`] to rewind both the token
//! stream and the underlying lexer/cursor state. Definite parses use
//! [`ParseResult`] to distinguish "nothing here, caller should try another
//! production" from "this was committed to and is broken."

pub mod ast;
mod expr;
mod items;
mod stmt;
mod types;

use faxc_lex::{Keyword, Lexer, LexerCheckpoint, Punct, Token, TokenKind};
use faxc_util::{Diagnostic, DiagnosticBuilder, Handler, Span, Symbol};

use ast::*;

/// The speculative-parse sentinel (spec'd as the `Success | Empty | Error`
/// three-way split so callers can tell "no match, try the next alternative"
/// from "matched the start of a production and then broke").
pub enum ParseResult<T> {
    Success(T),
    Empty,
    Error(Diagnostic),
}

impl<T> ParseResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            ParseResult::Success(v) => Some(v),
            _ => None,
        }
    }
}

/// The bridge back to `faxc-sem`. Every method has a default that keeps the
/// parser usable on its own (tests, `faxt convert --emit-ast`); `faxc-sem`
/// overrides `is_type_name` with a real scope lookup so the parser can tell
/// a template-argument list from a less-than expression.
pub trait SemanticHooks {
    /// Does `path` currently name a type (as opposed to a value or nothing
    /// at all)? Used to resolve the classic `a < b > c` ambiguity and to
    /// decide whether a declaration's leading name introduces a variable or
    /// is itself a type being used in an expression statement.
    fn is_type_name(&mut self, _path: &Path) -> bool {
        false
    }

    /// Called once a class's member list is fully parsed, before any
    /// `DelayedMethod` bodies are re-parsed against it.
    fn on_class_complete(&mut self, _class: &ClassItem) {}

    /// Called for every parsed template, so `faxc-sem` can register it in
    /// the `TemplateRegistry` for later instantiation.
    fn on_template_seen(&mut self, _item: &TemplateItem) {}
}

/// A [`SemanticHooks`] implementation that always answers conservatively
/// (never a type name) and records nothing. Used where no semantic model is
/// wired up yet.
#[derive(Default)]
pub struct NoopHooks;

impl SemanticHooks for NoopHooks {}

/// A rewindable position: the lexer checkpoint plus the one token of
/// lookahead the parser always keeps buffered in `current`.
#[derive(Clone)]
pub struct ParserCheckpoint {
    lexer: LexerCheckpoint,
    current: Token,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    prev_span: Span,
    handler: &'a Handler,
    hooks: &'a mut dyn SemanticHooks,
    /// Extra top-level items produced by a single comma-separated
    /// declaration (`int a, b;` at namespace scope yields two `GlobalVar`
    /// items from one `parse_item` call); drained before parsing anything
    /// new.
    pending_items: Vec<Item>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>, handler: &'a Handler, hooks: &'a mut dyn SemanticHooks) -> Self {
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            prev_span: current.span,
            handler,
            hooks,
            pending_items: Vec::new(),
        }
    }

    /// Parse an entire translation unit, recovering at item boundaries so
    /// one broken declaration doesn't stop the whole file from being
    /// diagnosed.
    pub fn parse_translation_unit(&mut self) -> TranslationUnit {
        let mut items = Vec::new();
        while !self.at_eof() {
            match self.parse_item() {
                Some(item) => items.push(item),
                None => self.recover_to_sync_point(),
            }
        }
        items
    }

    // --- token navigation -------------------------------------------------

    pub(crate) fn current(&self) -> Token {
        self.current
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current.kind
    }

    pub(crate) fn span(&self) -> Span {
        self.current.span
    }

    pub(crate) fn prev_span(&self) -> Span {
        self.prev_span
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current.kind.is_eof()
    }

    /// Look `k` tokens past the current one (`k = 0` is `current()` itself).
    pub(crate) fn peek(&mut self, k: usize) -> Token {
        if k == 0 {
            self.current
        } else {
            self.lexer.peek(k - 1)
        }
    }

    pub(crate) fn bump(&mut self) -> Token {
        let tok = self.current;
        self.prev_span = tok.span;
        self.current = self.lexer.next_token();
        tok
    }

    pub(crate) fn intern(&mut self, s: &str) -> Symbol {
        self.lexer.intern(s)
    }

    pub(crate) fn is_punct(&self, p: Punct) -> bool {
        matches!(self.current.kind, TokenKind::Punct(cur) if cur == p)
    }

    pub(crate) fn is_kw(&self, k: Keyword) -> bool {
        matches!(self.current.kind, TokenKind::Keyword(cur) if cur == k)
    }

    pub(crate) fn eat_punct(&mut self, p: Punct) -> bool {
        if self.is_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_kw(&mut self, k: Keyword) -> bool {
        if self.is_kw(k) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_punct(&mut self, p: Punct) -> Option<Span> {
        if self.is_punct(p) {
            Some(self.bump().span)
        } else {
            self.error(format!("expected '{}', found {:?}", p.spelling(), self.current.kind));
            None
        }
    }

    pub(crate) fn expect_kw(&mut self, k: Keyword) -> Option<Span> {
        if self.is_kw(k) {
            Some(self.bump().span)
        } else {
            self.error(format!("expected '{}', found {:?}", k.spelling(), self.current.kind));
            None
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Option<Symbol> {
        if let TokenKind::Ident(sym) = self.current.kind {
            self.bump();
            Some(sym)
        } else {
            self.error(format!("expected identifier, found {:?}", self.current.kind));
            None
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        self.handler.error(message, self.span());
    }

    pub(crate) fn error_at(&self, span: Span, message: impl Into<String>) {
        DiagnosticBuilder::error(message).span(span).emit(self.handler);
    }

    pub(crate) fn hooks_mut(&mut self) -> &mut dyn SemanticHooks {
        self.hooks
    }

    /// Queue an item discovered mid-declaration (see `pending_items`) to be
    /// returned by a later `parse_item` call, in declaration order.
    pub(crate) fn push_pending_item(&mut self, item: Item) {
        self.pending_items.insert(0, item);
    }

    // --- speculative parsing -----------------------------------------------

    pub(crate) fn checkpoint(&self) -> ParserCheckpoint {
        ParserCheckpoint {
            lexer: self.lexer.save_position(),
            current: self.current,
        }
    }

    pub(crate) fn restore(&mut self, cp: ParserCheckpoint) {
        self.lexer.restore_position(cp.lexer);
        self.current = cp.current;
    }

    /// Run `f` from a checkpoint; on failure, rewind as if nothing happened.
    /// This is how `a < b` vs. a template-argument list gets tried one way
    /// and, failing that, retried the other way without either attempt
    /// leaving a diagnostic behind.
    pub(crate) fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let cp = self.checkpoint();
        let errors_before = self.handler.error_count();
        match f(self) {
            Some(v) if self.handler.error_count() == errors_before => Some(v),
            _ => {
                self.restore(cp);
                None
            }
        }
    }

    /// Skip tokens until a statement/declaration boundary (`;` or a matched
    /// `}`) so one broken declaration doesn't cascade into the rest of the
    /// file.
    pub(crate) fn recover_to_sync_point(&mut self) {
        let mut depth: i32 = 0;
        loop {
            if self.at_eof() {
                return;
            }
            match self.current_kind() {
                TokenKind::Punct(Punct::LBrace) => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::Punct(Punct::RBrace) => {
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Punct(Punct::Semi) if depth == 0 => {
                    self.bump();
                    return;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    // --- item dispatch -------------------------------------------------

    pub(crate) fn parse_item(&mut self) -> Option<Item> {
        if let Some(item) = self.pending_items.pop() {
            return Some(item);
        }
        self.skip_attributes();

        if self.is_kw(Keyword::Namespace) {
            return self.parse_namespace();
        }
        if self.is_kw(Keyword::Template) || self.is_kw(Keyword::Concept) {
            return self.parse_template_item();
        }
        if self.is_kw(Keyword::Typedef) {
            return self.parse_typedef();
        }
        if self.is_kw(Keyword::Using) {
            return self.parse_using();
        }
        if self.is_kw(Keyword::StaticAssert) {
            return self.parse_static_assert_item();
        }
        if self.is_kw(Keyword::Friend) {
            self.bump();
            let inner = self.parse_item()?;
            return Some(Item::Friend(Box::new(inner)));
        }
        if self.is_kw(Keyword::Extern) && matches!(self.peek(1).kind, TokenKind::StringLiteral(_)) {
            return self.parse_extern_block();
        }
        if self.is_kw(Keyword::Enum) {
            return self.parse_enum_item().map(Item::Enum);
        }
        if self.is_kw(Keyword::Struct) || self.is_kw(Keyword::Class) || self.is_kw(Keyword::Union) {
            let is_union = self.is_kw(Keyword::Union);
            let class = self.parse_class_item()?;
            return Some(if is_union { Item::Union(class) } else { Item::Class(class) });
        }

        self.parse_declaration()
    }

    fn parse_namespace(&mut self) -> Option<Item> {
        let start = self.span();
        self.bump();
        let name = if let TokenKind::Ident(sym) = self.current_kind() {
            self.bump();
            Some(sym)
        } else {
            None
        };
        self.expect_punct(Punct::LBrace)?;
        let mut items = Vec::new();
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            match self.parse_item() {
                Some(item) => items.push(item),
                None => self.recover_to_sync_point(),
            }
        }
        self.expect_punct(Punct::RBrace)?;
        Some(Item::Namespace { name, items, span: start })
    }

    fn parse_typedef(&mut self) -> Option<Item> {
        let start = self.span();
        self.bump();
        let ty = self.parse_type_specifier()?;
        let name = self.expect_ident()?;
        self.expect_punct(Punct::Semi)?;
        Some(Item::Typedef { name, ty, span: start })
    }

    fn parse_using(&mut self) -> Option<Item> {
        let start = self.span();
        self.bump();
        if self.eat_kw(Keyword::Namespace) {
            let path = self.parse_path()?;
            self.expect_punct(Punct::Semi)?;
            return Some(Item::UsingDirective { path, span: start });
        }
        let name = self.expect_ident()?;
        if self.eat_punct(Punct::Eq) {
            let ty = self.parse_type_specifier()?;
            self.expect_punct(Punct::Semi)?;
            return Some(Item::UsingAlias { name, ty, span: start });
        }
        // `using std::vector;` style using-declaration: modeled as an alias
        // to a named type referring to the same qualified path.
        let mut path = self.parse_path()?;
        path.segments.insert(0, PathSegment { name, template_args: Vec::new() });
        self.expect_punct(Punct::Semi)?;
        Some(Item::UsingAlias {
            name,
            ty: TypeSpecifier { base: TypeBase::Named(path), cv: CvQualifiers::default(), layers: Vec::new(), span: start },
            span: start,
        })
    }

    fn parse_static_assert_item(&mut self) -> Option<Item> {
        let start = self.span();
        self.bump();
        self.expect_punct(Punct::LParen)?;
        let condition = self.parse_expr()?;
        let message = if self.eat_punct(Punct::Comma) {
            if let TokenKind::StringLiteral(sym) = self.current_kind() {
                self.bump();
                Some(sym)
            } else {
                self.error("expected string literal in static_assert message");
                None
            }
        } else {
            None
        };
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::Semi)?;
        Some(Item::StaticAssert { condition, message, span: start })
    }

    fn parse_extern_block(&mut self) -> Option<Item> {
        let start = self.span();
        self.bump();
        let abi = if let TokenKind::StringLiteral(sym) = self.current_kind() {
            self.bump();
            sym
        } else {
            return None;
        };
        if self.eat_punct(Punct::LBrace) {
            let mut items = Vec::new();
            while !self.is_punct(Punct::RBrace) && !self.at_eof() {
                match self.parse_item() {
                    Some(item) => items.push(item),
                    None => self.recover_to_sync_point(),
                }
            }
            self.expect_punct(Punct::RBrace)?;
            Some(Item::ExternBlock { abi, items, span: start })
        } else {
            let item = self.parse_item()?;
            Some(Item::ExternBlock { abi, items: vec![item], span: start })
        }
    }

    fn parse_template_item(&mut self) -> Option<Item> {
        let start = self.span();
        if self.is_kw(Keyword::Concept) {
            self.bump();
            let name = self.expect_ident()?;
            self.expect_punct(Punct::Eq)?;
            let requires_clause = self.parse_expr()?;
            self.expect_punct(Punct::Semi)?;
            let body = Box::new(Item::Typedef {
                name,
                ty: TypeSpecifier { base: TypeBase::Bool, cv: CvQualifiers::default(), layers: Vec::new(), span: start },
                span: start,
            });
            return Some(Item::Template(TemplateItem { params: Vec::new(), requires_clause: Some(requires_clause), body, span: start }));
        }

        self.bump(); // `template`
        self.expect_punct(Punct::Lt)?;
        let mut params = Vec::new();
        while !self.is_punct(Punct::Gt) && !self.at_eof() {
            if let Some(p) = self.parse_template_param() {
                params.push(p);
            }
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_template_closing_angle()?;

        let requires_clause = if self.eat_kw(Keyword::Requires) { self.parse_expr() } else { None };

        let body = Box::new(self.parse_item()?);
        let item = TemplateItem { params, requires_clause, body, span: start };
        self.hooks.on_template_seen(&item);
        Some(Item::Template(item))
    }

    fn parse_template_param(&mut self) -> Option<TemplateParam> {
        if self.is_kw(Keyword::Typename) || self.is_kw(Keyword::Class) {
            self.bump();
            let is_pack = self.eat_punct(Punct::Ellipsis);
            let name = self.expect_ident()?;
            let default = if self.eat_punct(Punct::Eq) { self.parse_type_specifier() } else { None };
            return Some(TemplateParam::Type { name, default, is_pack });
        }
        if self.is_kw(Keyword::Template) {
            self.bump();
            self.expect_punct(Punct::Lt)?;
            let mut params = Vec::new();
            while !self.is_punct(Punct::Gt) && !self.at_eof() {
                if let Some(p) = self.parse_template_param() {
                    params.push(p);
                }
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
            self.expect_template_closing_angle()?;
            self.eat_kw(Keyword::Class);
            let name = self.expect_ident()?;
            let default = if self.eat_punct(Punct::Eq) { self.parse_path() } else { None };
            return Some(TemplateParam::Template { name, params, default });
        }
        let ty = self.parse_type_specifier()?;
        let is_pack = self.eat_punct(Punct::Ellipsis);
        let name = self.expect_ident()?;
        let default = if self.eat_punct(Punct::Eq) { self.parse_expr() } else { None };
        Some(TemplateParam::NonType { name, ty, default, is_pack })
    }

    /// `>>` lexes as one `Shr` token but a nested template-argument list
    /// needs to read it as two closing `>`s (the classic C++11 relaxation).
    /// There is no token to split in the buffer here, only the net
    /// requirement that each nesting level consumes exactly one `>`; the
    /// outer level's call to this same method consumes the other half when
    /// the stream itself doesn't hand out a second `Gt` token.
    pub(crate) fn expect_template_closing_angle(&mut self) -> Option<()> {
        if self.eat_punct(Punct::Gt) {
            return Some(());
        }
        if self.eat_punct(Punct::Shr) {
            return Some(());
        }
        self.error("expected '>' to close template argument list");
        None
    }

    pub(crate) fn parse_template_args(&mut self) -> Option<Vec<TemplateArg>> {
        let mut args = Vec::new();
        while !self.is_punct(Punct::Gt) && !self.is_punct(Punct::Shr) && !self.at_eof() {
            if let Some(arg) = self.try_parse(|p| p.parse_type_specifier().map(TemplateArg::Type)) {
                args.push(arg);
            } else {
                let expr = self.parse_conditional_expr()?;
                args.push(TemplateArg::Expr(expr));
            }
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_template_closing_angle()?;
        Some(args)
    }

    /// Consumes `[[...]]` attribute lists without interpreting them —
    /// `faxc-sem` doesn't model compiler attributes; they're skipped just
    /// far enough to not break the surrounding declaration's syntax.
    pub(crate) fn skip_attributes(&mut self) {
        while self.is_punct(Punct::LBracketLBracket) {
            self.bump();
            let mut depth = 1;
            while depth > 0 && !self.at_eof() {
                if self.eat_punct(Punct::LBracketLBracket) {
                    depth += 1;
                } else if self.eat_punct(Punct::RBracketRBracket) {
                    depth -= 1;
                } else {
                    self.bump();
                }
            }
        }
    }
}
