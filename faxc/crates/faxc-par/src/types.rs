//! Type-specifier and declarator parsing: built-in type keywords,
//! qualified/templated paths, and the pointer/reference/array/function
//! layers that wrap a base type (spec §4.D's declarator-chain model).

use faxc_lex::{Keyword, Punct, TokenKind};

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse a qualified name: `::std::vector<int>::iterator` or a plain
    /// unqualified identifier, with template-argument lists on any segment.
    pub(crate) fn parse_path(&mut self) -> Option<Path> {
        let start = self.span();
        let is_global = self.eat_punct(Punct::ColonColon);
        let mut segments = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let template_args = if self.is_punct(Punct::Lt) {
                self.try_parse(|p| {
                    p.bump();
                    p.parse_template_args()
                })
                .unwrap_or_default()
            } else {
                Vec::new()
            };
            segments.push(PathSegment { name, template_args });
            if !self.eat_punct(Punct::ColonColon) {
                break;
            }
            if !matches!(self.current_kind(), TokenKind::Ident(_)) {
                break;
            }
        }
        Some(Path { is_global, segments, span: start })
    }

    /// Parse the cv-qualified base type plus any trailing pointer/
    /// reference/array layers (`int * const`, `char[]`, `void (*)(int)`).
    pub(crate) fn parse_type_specifier(&mut self) -> Option<TypeSpecifier> {
        let start = self.span();
        let mut cv = CvQualifiers::default();
        self.consume_cv(&mut cv);

        let base = self.parse_type_base()?;

        self.consume_cv(&mut cv);

        let mut layers = Vec::new();
        loop {
            if self.eat_punct(Punct::Star) {
                let mut ptr_cv = CvQualifiers::default();
                self.consume_cv(&mut ptr_cv);
                layers.push(TypeLayer::Pointer(ptr_cv));
                continue;
            }
            if self.eat_punct(Punct::AmpAmp) {
                layers.push(TypeLayer::RValueRef);
                continue;
            }
            if self.eat_punct(Punct::Amp) {
                layers.push(TypeLayer::LValueRef);
                continue;
            }
            break;
        }

        // Trailing array layers: `int[10]`, `int[]`.
        while self.is_punct(Punct::LBracket) {
            self.bump();
            let size = if self.is_punct(Punct::RBracket) { None } else { self.parse_expr() };
            self.expect_punct(Punct::RBracket)?;
            layers.push(TypeLayer::Array(size));
        }

        Some(TypeSpecifier { base, cv, layers, span: start })
    }

    fn consume_cv(&mut self, cv: &mut CvQualifiers) {
        loop {
            if self.eat_kw(Keyword::Const) {
                cv.is_const = true;
            } else if self.eat_kw(Keyword::Volatile) {
                cv.is_volatile = true;
            } else {
                break;
            }
        }
    }

    fn parse_type_base(&mut self) -> Option<TypeBase> {
        if self.is_kw(Keyword::Decltype) {
            self.bump();
            self.expect_punct(Punct::LParen)?;
            let expr = self.parse_expr()?;
            self.expect_punct(Punct::RParen)?;
            return Some(TypeBase::Decltype(Box::new(expr)));
        }

        // Builtin arithmetic type keywords may combine (`unsigned long
        // long`, `long long int`, `signed char`). Collect all that apply,
        // then resolve the combination.
        let mut unsigned = false;
        let mut signed = false;
        let mut long_count = 0u8;
        let mut short = false;
        let mut saw_int = false;
        let mut saw_char = false;
        let mut saw_double = false;

        loop {
            if self.eat_kw(Keyword::Unsigned) {
                unsigned = true;
            } else if self.eat_kw(Keyword::Signed) {
                signed = true;
            } else if self.eat_kw(Keyword::Long) {
                long_count += 1;
            } else if self.eat_kw(Keyword::Short) {
                short = true;
            } else if self.eat_kw(Keyword::Int) {
                saw_int = true;
            } else if self.eat_kw(Keyword::Char) {
                saw_char = true;
            } else if self.eat_kw(Keyword::Double) {
                saw_double = true;
            } else {
                break;
            }
        }

        if unsigned || signed || long_count > 0 || short || saw_int || saw_char || saw_double {
            if saw_double {
                return Some(if long_count > 0 { TypeBase::LongDouble } else { TypeBase::Double });
            }
            if saw_char {
                return Some(if unsigned {
                    TypeBase::UChar
                } else if signed {
                    TypeBase::SChar
                } else {
                    TypeBase::Char
                });
            }
            if short {
                return Some(if unsigned { TypeBase::UShort } else { TypeBase::Short });
            }
            if long_count >= 2 {
                return Some(if unsigned { TypeBase::ULongLong } else { TypeBase::LongLong });
            }
            if long_count == 1 {
                return Some(if unsigned { TypeBase::ULong } else { TypeBase::Long });
            }
            return Some(if unsigned { TypeBase::UInt } else { TypeBase::Int });
        }

        match self.current_kind() {
            TokenKind::Keyword(Keyword::Void) => {
                self.bump();
                Some(TypeBase::Void)
            }
            TokenKind::Keyword(Keyword::Bool) => {
                self.bump();
                Some(TypeBase::Bool)
            }
            TokenKind::Keyword(Keyword::Char8T) => {
                self.bump();
                Some(TypeBase::Char8T)
            }
            TokenKind::Keyword(Keyword::Char16T) => {
                self.bump();
                Some(TypeBase::Char16T)
            }
            TokenKind::Keyword(Keyword::Char32T) => {
                self.bump();
                Some(TypeBase::Char32T)
            }
            TokenKind::Keyword(Keyword::WcharT) => {
                self.bump();
                Some(TypeBase::WCharT)
            }
            TokenKind::Keyword(Keyword::Float) => {
                self.bump();
                Some(TypeBase::Float)
            }
            TokenKind::Keyword(Keyword::Auto) => {
                self.bump();
                Some(TypeBase::Auto)
            }
            TokenKind::Keyword(Keyword::Typename) => {
                self.bump();
                self.parse_path().map(TypeBase::Named)
            }
            TokenKind::Ident(_) | TokenKind::Punct(Punct::ColonColon) => {
                self.parse_path().map(TypeBase::Named)
            }
            _ => {
                self.error(format!("expected a type, found {:?}", self.current_kind()));
                None
            }
        }
    }

    /// Parse a `(params...)` list for a function declarator.
    pub(crate) fn parse_param_list(&mut self) -> Option<(Vec<Param>, bool)> {
        self.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        let mut is_variadic = false;

        if self.is_punct(Punct::RParen) {
            self.bump();
            return Some((params, is_variadic));
        }
        // `(void)` is an empty parameter list, same as `()`.
        if self.is_kw(Keyword::Void) && matches!(self.peek(1).kind, TokenKind::Punct(Punct::RParen)) {
            self.bump();
            self.bump();
            return Some((params, is_variadic));
        }

        loop {
            if self.eat_punct(Punct::Ellipsis) {
                is_variadic = true;
                break;
            }
            let ty = self.parse_type_specifier()?;
            let name = if let TokenKind::Ident(sym) = self.current_kind() {
                self.bump();
                Some(sym)
            } else {
                None
            };
            let default = if self.eat_punct(Punct::Eq) { self.parse_assignment_expr() } else { None };
            params.push(Param { name, ty, default });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RParen)?;
        Some((params, is_variadic))
    }
}
