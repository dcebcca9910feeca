//! Declaration parsing: functions, classes/structs/unions, enums, and plain
//! variable declarations, shared between file/namespace scope and class
//! member scope.

use faxc_lex::{Keyword, Punct, TokenKind};

use crate::ast::*;
use crate::Parser;

/// Decl-specifiers collected ahead of a declarator (`static`, `virtual`,
/// `inline`, ...). Parsed once and consulted by both the function and the
/// variable branch of [`Parser::parse_declaration`].
#[derive(Default)]
struct DeclSpecifiers {
    is_static: bool,
    is_extern: bool,
    is_inline: bool,
    is_virtual: bool,
    is_explicit: bool,
    is_constexpr: bool,
    is_consteval: bool,
    is_thread_local: bool,
}

impl<'a> Parser<'a> {
    fn parse_decl_specifiers(&mut self) -> DeclSpecifiers {
        let mut spec = DeclSpecifiers::default();
        loop {
            if self.eat_kw(Keyword::Static) {
                spec.is_static = true;
            } else if self.eat_kw(Keyword::Extern) {
                spec.is_extern = true;
            } else if self.eat_kw(Keyword::Inline) {
                spec.is_inline = true;
            } else if self.eat_kw(Keyword::Virtual) {
                spec.is_virtual = true;
            } else if self.eat_kw(Keyword::Explicit) {
                spec.is_explicit = true;
            } else if self.eat_kw(Keyword::Constexpr) {
                spec.is_constexpr = true;
            } else if self.eat_kw(Keyword::Consteval) {
                spec.is_consteval = true;
            } else if self.eat_kw(Keyword::ThreadLocal) {
                spec.is_thread_local = true;
            } else {
                break;
            }
        }
        spec
    }

    /// Declarator name: a plain identifier, or an operator-function-name
    /// (`operator+`, `operator()`, `operator new`). Conversion operators
    /// (`operator Type()`) are not modeled as a distinct name — FIXME if
    /// user-defined conversions become a priority, they need a dedicated
    /// `MemberKind` rather than squeezing a type into a `Symbol`.
    fn parse_declarator_name(&mut self) -> Option<faxc_util::Symbol> {
        if self.is_kw(Keyword::Operator) {
            self.bump();
            if self.eat_kw(Keyword::New) {
                return Some(self.intern("operator new"));
            }
            if self.eat_kw(Keyword::Delete) {
                return Some(self.intern("operator delete"));
            }
            if self.eat_punct(Punct::LParen) {
                self.expect_punct(Punct::RParen)?;
                return Some(self.intern("operator()"));
            }
            if self.eat_punct(Punct::LBracket) {
                self.expect_punct(Punct::RBracket)?;
                return Some(self.intern("operator[]"));
            }
            if let TokenKind::Punct(p) = self.current_kind() {
                self.bump();
                return Some(self.intern(&format!("operator{}", p.spelling())));
            }
            self.error("expected an operator after 'operator'");
            return None;
        }
        self.expect_ident()
    }

    /// Skips trailing member-function qualifiers this compiler doesn't
    /// distinguish from the base signature: `override`, `final` (contextual
    /// keywords, lexed as plain identifiers), ref-qualifiers are not
    /// supported.
    fn skip_trailing_member_specifiers(&mut self) {
        loop {
            if let TokenKind::Ident(_) = self.current_kind() {
                // Only `override`/`final` are legal here syntactically;
                // anything else would be a syntax error the caller's next
                // `expect` surfaces.
                let save = self.checkpoint();
                self.bump();
                if !matches!(self.current_kind(), TokenKind::Punct(Punct::Semi) | TokenKind::Punct(Punct::LBrace) | TokenKind::Punct(Punct::Eq)) {
                    self.restore(save);
                    break;
                }
            } else {
                break;
            }
        }
    }

    /// Shared declaration grammar used at namespace scope (returns
    /// `Item::Function`/`Item::GlobalVar`) — class member scope has its own
    /// entry point, [`Parser::parse_member`], since members additionally
    /// recognize constructors/destructors and track visibility.
    pub(crate) fn parse_declaration(&mut self) -> Option<Item> {
        let start = self.span();
        let spec = self.parse_decl_specifiers();
        let ty = self.parse_type_specifier()?;
        let name = self.parse_declarator_name()?;

        if self.is_punct(Punct::LParen) {
            let (params, is_variadic) = self.parse_param_list()?;
            let is_const = self.eat_kw(Keyword::Const);
            let is_noexcept = self.parse_noexcept_clause();
            self.skip_attributes();
            self.skip_trailing_member_specifiers();

            let (body, is_deleted, is_defaulted) = self.parse_function_body()?;

            let linkage = if spec.is_static {
                Linkage::Internal
            } else if spec.is_inline {
                Linkage::Inline
            } else {
                Linkage::External
            };

            return Some(Item::Function(FunctionItem {
                name,
                params,
                is_variadic,
                ret_type: ty,
                body,
                linkage,
                calling_convention: CallingConvention::default(),
                is_virtual: spec.is_virtual,
                is_static: spec.is_static,
                is_const,
                is_noexcept,
                is_constexpr: spec.is_constexpr,
                is_consteval: spec.is_consteval,
                is_explicit: spec.is_explicit,
                is_deleted,
                is_defaulted,
                span: start,
            }));
        }

        let mut decls = Vec::new();
        loop {
            let decl_span = self.span();
            let decl_name = if decls.is_empty() { name } else { self.parse_declarator_name()? };
            let mut decl_ty = ty.clone();
            while self.eat_punct(Punct::Star) {
                decl_ty.layers.push(TypeLayer::Pointer(CvQualifiers::default()));
            }
            let initializer = if self.eat_punct(Punct::Eq) {
                self.parse_assignment_expr()
            } else if self.is_punct(Punct::LBrace) || self.is_punct(Punct::LParen) {
                self.parse_assignment_expr()
            } else {
                None
            };
            decls.push(VarDecl {
                name: decl_name,
                ty: decl_ty,
                initializer,
                is_static: spec.is_static,
                is_extern: spec.is_extern,
                is_thread_local: spec.is_thread_local,
                is_constexpr: spec.is_constexpr,
                span: decl_span,
            });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::Semi)?;

        let mut iter = decls.into_iter();
        let first = iter.next()?;
        for extra in iter {
            self.push_pending_item(Item::GlobalVar(extra));
        }
        Some(Item::GlobalVar(first))
    }

    fn parse_noexcept_clause(&mut self) -> bool {
        if self.eat_kw(Keyword::Noexcept) {
            if self.eat_punct(Punct::LParen) {
                let _ = self.parse_expr();
                self.expect_punct(Punct::RParen);
            }
            true
        } else {
            false
        }
    }

    /// Parses whatever follows a function signature: `;`, `= delete;`,
    /// `= default;`, or a body. Returns `(body, is_deleted, is_defaulted)`.
    fn parse_function_body(&mut self) -> Option<(Option<Block>, bool, bool)> {
        if self.eat_punct(Punct::Semi) {
            return Some((None, false, false));
        }
        if self.eat_punct(Punct::Eq) {
            let is_deleted = self.eat_kw(Keyword::Delete);
            let is_defaulted = !is_deleted && self.eat_kw(Keyword::Default);
            if !is_deleted && !is_defaulted {
                self.error("expected 'delete' or 'default' after '='");
            }
            self.expect_punct(Punct::Semi)?;
            return Some((None, is_deleted, is_defaulted));
        }
        // Constructor member-initializer list: `Ctor() : a(1), b(2) { ... }`.
        // Not modeled as distinct AST data (the initializers behave like
        // ordinary field-assignment statements prepended to the body);
        // they're parsed and discarded here, a simplification noted in
        // DESIGN.md.
        if self.eat_punct(Punct::Colon) {
            loop {
                let _ = self.parse_path();
                if self.eat_punct(Punct::LParen) {
                    if !self.is_punct(Punct::RParen) {
                        loop {
                            let _ = self.parse_assignment_expr();
                            if !self.eat_punct(Punct::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect_punct(Punct::RParen)?;
                } else if self.eat_punct(Punct::LBrace) {
                    if !self.is_punct(Punct::RBrace) {
                        loop {
                            let _ = self.parse_assignment_expr();
                            if !self.eat_punct(Punct::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect_punct(Punct::RBrace)?;
                }
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        let body = self.parse_block()?;
        Some((Some(body), false, false))
    }

    pub(crate) fn parse_enum_item(&mut self) -> Option<EnumItem> {
        let start = self.span();
        self.bump();
        let is_scoped = self.eat_kw(Keyword::Class) || self.eat_kw(Keyword::Struct);
        let name = self.expect_ident()?;
        let underlying = if self.eat_punct(Punct::Colon) { self.parse_type_specifier() } else { None };

        if self.eat_punct(Punct::Semi) {
            return Some(EnumItem { name, is_scoped, underlying, variants: Vec::new(), span: start });
        }

        self.expect_punct(Punct::LBrace)?;
        let mut variants = Vec::new();
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            let variant_name = match self.expect_ident() {
                Some(n) => n,
                None => break,
            };
            let value = if self.eat_punct(Punct::Eq) { self.parse_assignment_expr() } else { None };
            variants.push((variant_name, value));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RBrace)?;
        self.eat_punct(Punct::Semi);
        Some(EnumItem { name, is_scoped, underlying, variants, span: start })
    }

    pub(crate) fn parse_class_item(&mut self) -> Option<ClassItem> {
        let start = self.span();
        let key = if self.eat_kw(Keyword::Struct) {
            ClassKey::Struct
        } else if self.eat_kw(Keyword::Union) {
            ClassKey::Union
        } else {
            self.expect_kw(Keyword::Class)?;
            ClassKey::Class
        };
        self.skip_attributes();
        let name = self.expect_ident()?;

        let mut bases = Vec::new();
        if self.eat_punct(Punct::Colon) {
            loop {
                let is_virtual = self.eat_kw(Keyword::Virtual);
                let default_visibility = match key {
                    ClassKey::Struct | ClassKey::Union => Visibility::Public,
                    ClassKey::Class => Visibility::Private,
                };
                let visibility = if self.eat_kw(Keyword::Public) {
                    Visibility::Public
                } else if self.eat_kw(Keyword::Protected) {
                    Visibility::Protected
                } else if self.eat_kw(Keyword::Private) {
                    Visibility::Private
                } else {
                    default_visibility
                };
                let is_virtual = is_virtual || self.eat_kw(Keyword::Virtual);
                let path = self.parse_path()?;
                bases.push(BaseSpecifier { path, visibility, is_virtual });
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }

        if self.eat_punct(Punct::Semi) {
            return Some(ClassItem { key, name, bases, members: Vec::new(), is_complete: false, span: start });
        }

        self.expect_punct(Punct::LBrace)?;
        let mut visibility = match key {
            ClassKey::Class => Visibility::Private,
            ClassKey::Struct | ClassKey::Union => Visibility::Public,
        };
        let mut members = Vec::new();
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            if self.eat_kw(Keyword::Public) {
                visibility = Visibility::Public;
                self.expect_punct(Punct::Colon)?;
                continue;
            }
            if self.eat_kw(Keyword::Protected) {
                visibility = Visibility::Protected;
                self.expect_punct(Punct::Colon)?;
                continue;
            }
            if self.eat_kw(Keyword::Private) {
                visibility = Visibility::Private;
                self.expect_punct(Punct::Colon)?;
                continue;
            }
            match self.parse_member(visibility, name) {
                Some(mut new_members) => members.append(&mut new_members),
                None => self.recover_to_sync_point(),
            }
        }
        self.expect_punct(Punct::RBrace)?;
        self.eat_punct(Punct::Semi);

        let class = ClassItem { key, name, bases, members, is_complete: true, span: start };
        self.hooks_mut().on_class_complete(&class);
        Some(class)
    }

    fn parse_member(&mut self, visibility: Visibility, class_name: faxc_util::Symbol) -> Option<Vec<Member>> {
        self.skip_attributes();

        if self.is_kw(Keyword::StaticAssert) {
            self.bump();
            self.expect_punct(Punct::LParen)?;
            let condition = self.parse_expr()?;
            let message = if self.eat_punct(Punct::Comma) {
                if let TokenKind::StringLiteral(sym) = self.current_kind() {
                    self.bump();
                    Some(sym)
                } else {
                    None
                }
            } else {
                None
            };
            self.expect_punct(Punct::RParen)?;
            self.expect_punct(Punct::Semi)?;
            return Some(vec![Member { visibility, kind: MemberKind::StaticAssert { condition, message } }]);
        }

        if self.is_kw(Keyword::Struct) || self.is_kw(Keyword::Class) || self.is_kw(Keyword::Union) {
            let is_union = self.is_kw(Keyword::Union);
            let nested = self.parse_class_item()?;
            let item = if is_union { Item::Union(nested) } else { Item::Class(nested) };
            return Some(vec![Member { visibility, kind: MemberKind::NestedType(Box::new(item)) }]);
        }
        if self.is_kw(Keyword::Enum) {
            let nested = self.parse_enum_item()?;
            return Some(vec![Member { visibility, kind: MemberKind::NestedType(Box::new(Item::Enum(nested))) }]);
        }
        if self.is_kw(Keyword::Typedef) {
            let item = self.parse_item()?;
            return Some(vec![Member { visibility, kind: MemberKind::NestedType(Box::new(item)) }]);
        }
        if self.is_kw(Keyword::Using) || self.is_kw(Keyword::Template) || self.is_kw(Keyword::Friend) {
            let item = self.parse_item()?;
            return Some(vec![Member { visibility, kind: MemberKind::NestedType(Box::new(item)) }]);
        }

        let spec = self.parse_decl_specifiers();

        // Destructor: `~Name() ...`. Checked after decl-specifiers so
        // `virtual ~Name()` parses the same as a plain `~Name()`.
        if self.is_punct(Punct::Tilde) {
            let start = self.span();
            self.bump();
            let name = self.expect_ident()?;
            self.expect_punct(Punct::LParen)?;
            self.expect_punct(Punct::RParen)?;
            let is_noexcept = self.parse_noexcept_clause();
            self.skip_attributes();
            self.skip_trailing_member_specifiers();
            let (body, is_deleted, is_defaulted) = self.parse_function_body()?;
            let signature = FunctionItem {
                name,
                params: Vec::new(),
                is_variadic: false,
                ret_type: TypeSpecifier { base: TypeBase::Void, cv: CvQualifiers::default(), layers: Vec::new(), span: start },
                body,
                linkage: Linkage::External,
                calling_convention: CallingConvention::default(),
                is_virtual: spec.is_virtual,
                is_static: false,
                is_const: false,
                is_noexcept,
                is_constexpr: false,
                is_consteval: false,
                is_explicit: false,
                is_deleted,
                is_defaulted,
                span: start,
            };
            return Some(vec![Member { visibility, kind: MemberKind::Destructor(signature) }]);
        }

        // Constructor: the declarator name equals the class's own name and
        // is directly followed by `(`.
        if let TokenKind::Ident(sym) = self.current_kind() {
            if sym == class_name && matches!(self.peek(1).kind, TokenKind::Punct(Punct::LParen)) {
                let start = self.span();
                self.bump();
                let (params, is_variadic) = self.parse_param_list()?;
                let is_noexcept = self.parse_noexcept_clause();
                self.skip_attributes();
                self.skip_trailing_member_specifiers();
                let (body, is_deleted, is_defaulted) = self.parse_function_body()?;
                let signature = FunctionItem {
                    name: sym,
                    params,
                    is_variadic,
                    ret_type: TypeSpecifier { base: TypeBase::Void, cv: CvQualifiers::default(), layers: Vec::new(), span: start },
                    body,
                    linkage: Linkage::External,
                    calling_convention: CallingConvention::default(),
                    is_virtual: false,
                    is_static: false,
                    is_const: false,
                    is_noexcept,
                    is_constexpr: spec.is_constexpr,
                    is_consteval: spec.is_consteval,
                    is_explicit: spec.is_explicit,
                    is_deleted,
                    is_defaulted,
                    span: start,
                };
                return Some(vec![Member { visibility, kind: MemberKind::Constructor(signature) }]);
            }
        }

        let ty = self.parse_type_specifier()?;
        let name = self.parse_declarator_name()?;

        if self.is_punct(Punct::LParen) {
            let start = ty.span;
            let (params, is_variadic) = self.parse_param_list()?;
            let is_const = self.eat_kw(Keyword::Const);
            let is_noexcept = self.parse_noexcept_clause();
            self.skip_attributes();
            self.skip_trailing_member_specifiers();

            let signature = FunctionItem {
                name,
                params,
                is_variadic,
                ret_type: ty,
                body: None,
                linkage: Linkage::External,
                calling_convention: CallingConvention::default(),
                is_virtual: spec.is_virtual,
                is_static: spec.is_static,
                is_const,
                is_noexcept,
                is_constexpr: spec.is_constexpr,
                is_consteval: spec.is_consteval,
                is_explicit: spec.is_explicit,
                is_deleted: false,
                is_defaulted: false,
                span: start,
            };

            if self.is_punct(Punct::LBrace) {
                // Delayed parsing (spec §4.C): the body is skipped now and
                // re-parsed once the class is complete, since it may refer
                // to members declared later in the class body.
                let token_position = self.span().start;
                self.skip_balanced_braces();
                return Some(vec![Member { visibility, kind: MemberKind::DelayedMethod { signature, token_position } }]);
            }
            let (_, is_deleted, is_defaulted) = self.parse_function_body()?;
            let mut signature = signature;
            signature.is_deleted = is_deleted;
            signature.is_defaulted = is_defaulted;
            return Some(vec![Member { visibility, kind: MemberKind::Method(signature) }]);
        }

        // Field declaration(s), possibly several comma-separated, possibly
        // with a bitfield width or an in-class initializer.
        let mut members = Vec::new();
        let mut current_name = name;
        loop {
            let field_span = self.span();
            let mut field_ty = ty.clone();
            while self.eat_punct(Punct::Star) {
                field_ty.layers.push(TypeLayer::Pointer(CvQualifiers::default()));
            }
            let bitfield_width = if self.eat_punct(Punct::Colon) { self.parse_assignment_expr() } else { None };
            let initializer = if self.eat_punct(Punct::Eq) { self.parse_assignment_expr() } else { None };
            members.push(Member {
                visibility,
                kind: MemberKind::Field(FieldDecl {
                    name: current_name,
                    ty: field_ty,
                    bitfield_width,
                    initializer,
                    is_static: spec.is_static,
                    is_mutable: false,
                    span: field_span,
                }),
            });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
            current_name = self.parse_declarator_name()?;
        }
        self.expect_punct(Punct::Semi)?;
        Some(members)
    }

    /// Skips a `{ ... }` group without building any AST for its contents,
    /// used for delayed member-function body parsing.
    fn skip_balanced_braces(&mut self) {
        if !self.eat_punct(Punct::LBrace) {
            return;
        }
        let mut depth = 1;
        while depth > 0 && !self.at_eof() {
            if self.eat_punct(Punct::LBrace) {
                depth += 1;
            } else if self.eat_punct(Punct::RBrace) {
                depth -= 1;
            } else {
                self.bump();
            }
        }
    }
}
