//! Statement parsing: blocks, control flow, declarations-as-statements,
//! exception handling (both Itanium `try`/`catch` and MSVC `__try` SEH).

use faxc_lex::{Keyword, Punct, TokenKind};

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.span();
        self.expect_punct(Punct::LBrace)?;
        let mut stmts = Vec::new();
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.recover_to_sync_point(),
            }
        }
        self.expect_punct(Punct::RBrace)?;
        Some(Block { stmts, span: start })
    }

    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        self.skip_attributes();

        if self.is_punct(Punct::LBrace) {
            return self.parse_block().map(Stmt::Block);
        }
        if self.is_kw(Keyword::If) {
            return self.parse_if_stmt();
        }
        if self.is_kw(Keyword::While) {
            return self.parse_while_stmt();
        }
        if self.is_kw(Keyword::Do) {
            return self.parse_do_while_stmt();
        }
        if self.is_kw(Keyword::For) {
            return self.parse_for_stmt();
        }
        if self.is_kw(Keyword::Switch) {
            return self.parse_switch_stmt();
        }
        if self.is_kw(Keyword::Case) {
            let span = self.span();
            self.bump();
            let value = self.parse_expr()?;
            self.expect_punct(Punct::Colon)?;
            return Some(Stmt::Case { value, span });
        }
        if self.is_kw(Keyword::Default) {
            let span = self.span();
            self.bump();
            self.expect_punct(Punct::Colon)?;
            return Some(Stmt::Default { span });
        }
        if self.is_kw(Keyword::Break) {
            let span = self.span();
            self.bump();
            self.expect_punct(Punct::Semi)?;
            return Some(Stmt::Break(span));
        }
        if self.is_kw(Keyword::Continue) {
            let span = self.span();
            self.bump();
            self.expect_punct(Punct::Semi)?;
            return Some(Stmt::Continue(span));
        }
        if self.is_kw(Keyword::Goto) {
            let span = self.span();
            self.bump();
            let label = self.expect_ident()?;
            self.expect_punct(Punct::Semi)?;
            return Some(Stmt::Goto { label, span });
        }
        if self.is_kw(Keyword::Return) {
            let span = self.span();
            self.bump();
            let value = if self.is_punct(Punct::Semi) { None } else { self.parse_expr() };
            self.expect_punct(Punct::Semi)?;
            return Some(Stmt::Return { value, span });
        }
        if self.is_kw(Keyword::Throw) {
            let span = self.span();
            self.bump();
            let value = if self.is_punct(Punct::Semi) { None } else { self.parse_expr() };
            self.expect_punct(Punct::Semi)?;
            return Some(Stmt::Throw { value, span });
        }
        if self.is_kw(Keyword::Try) {
            return self.parse_try_stmt();
        }
        if self.is_kw(Keyword::Try__) {
            return self.parse_seh_try_stmt();
        }
        if self.is_kw(Keyword::Leave__) {
            let span = self.span();
            self.bump();
            self.expect_punct(Punct::Semi)?;
            return Some(Stmt::SehLeave(span));
        }
        if self.is_kw(Keyword::StaticAssert) {
            return self.parse_static_assert_stmt();
        }

        // A bare `name:` (not followed by `::`) is a label.
        if let TokenKind::Ident(name) = self.current_kind() {
            if matches!(self.peek(1).kind, TokenKind::Punct(Punct::Colon))
                && !matches!(self.peek(2).kind, TokenKind::Punct(Punct::Colon))
            {
                let span = self.span();
                self.bump();
                self.bump();
                return Some(Stmt::Label { name, span });
            }
        }

        if let Some(decls) = self.try_parse(|p| p.parse_decl_stmt()) {
            return Some(Stmt::Decl(decls));
        }

        let expr = self.parse_expr()?;
        self.expect_punct(Punct::Semi)?;
        Some(Stmt::Expr(expr))
    }

    /// A declaration used as a statement: `int x = 1, y = 2;`. Speculative
    /// (the caller backtracks to try parsing an expression statement
    /// instead) because `Foo(x);` is ambiguous between a declaration of `x`
    /// with type `Foo` and a call expression without full type information.
    fn parse_decl_stmt(&mut self) -> Option<Vec<VarDecl>> {
        let start = self.span();
        let is_static = self.eat_kw(Keyword::Static);
        let is_extern = self.eat_kw(Keyword::Extern);
        let is_thread_local = self.eat_kw(Keyword::ThreadLocal);
        let is_constexpr = self.eat_kw(Keyword::Constexpr);

        let ty = self.parse_type_specifier()?;
        let mut decls = Vec::new();
        loop {
            let decl_span = self.span();
            let name = self.expect_ident()?;
            let initializer = if self.eat_punct(Punct::Eq) {
                self.parse_assignment_expr()
            } else if self.is_punct(Punct::LBrace) {
                self.parse_assignment_expr()
            } else {
                None
            };
            decls.push(VarDecl {
                name,
                ty: ty.clone(),
                initializer,
                is_static,
                is_extern,
                is_thread_local,
                is_constexpr,
                span: decl_span,
            });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::Semi)?;
        let _ = start;
        Some(decls)
    }

    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        self.bump();
        let is_constexpr = self.eat_kw(Keyword::Constexpr);
        self.expect_punct(Punct::LParen)?;
        let init = self.try_parse(|p| p.parse_decl_stmt().map(|decls| Box::new(Stmt::Decl(decls))));
        let condition = self.parse_expr()?;
        self.expect_punct(Punct::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat_kw(Keyword::Else) { Some(Box::new(self.parse_stmt()?)) } else { None };
        Some(Stmt::If { init, is_constexpr, condition, then_branch, else_branch })
    }

    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        self.bump();
        self.expect_punct(Punct::LParen)?;
        let condition = self.parse_expr()?;
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Some(Stmt::While { condition, body })
    }

    fn parse_do_while_stmt(&mut self) -> Option<Stmt> {
        self.bump();
        let body = Box::new(self.parse_stmt()?);
        self.expect_kw(Keyword::While)?;
        self.expect_punct(Punct::LParen)?;
        let condition = self.parse_expr()?;
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::Semi)?;
        Some(Stmt::DoWhile { body, condition })
    }

    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        self.bump();
        self.expect_punct(Punct::LParen)?;

        let init = if self.is_punct(Punct::Semi) {
            self.bump();
            None
        } else {
            Some(Box::new(self.try_parse(|p| p.parse_decl_stmt().map(Stmt::Decl)).unwrap_or_else(|| {
                let expr = self.parse_expr_or_dummy();
                self.eat_punct(Punct::Semi);
                Stmt::Expr(expr)
            })))
        };

        // Ranged-for: `for (auto x : range)` — the declarator we just
        // parsed as `init` is reinterpreted if the next token is `:`.
        if let Some(init_stmt) = &init {
            if self.is_punct(Punct::Colon) {
                if let Stmt::Decl(decls) = init_stmt.as_ref() {
                    if let [single] = decls.as_slice() {
                        let binding = single.name;
                        let binding_ty = Some(single.ty.clone());
                        self.bump();
                        let range = self.parse_expr()?;
                        self.expect_punct(Punct::RParen)?;
                        let body = Box::new(self.parse_stmt()?);
                        return Some(Stmt::RangedFor { init: None, binding, binding_ty, range, body });
                    }
                }
            }
        }

        let condition = if self.is_punct(Punct::Semi) { None } else { self.parse_expr() };
        self.expect_punct(Punct::Semi)?;
        let increment = if self.is_punct(Punct::RParen) { None } else { self.parse_expr() };
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Some(Stmt::For { init, condition, increment, body })
    }

    /// Used only on the expression-statement fallback inside a `for`-init
    /// clause, where a parse failure shouldn't abort the whole statement.
    fn parse_expr_or_dummy(&mut self) -> Expr {
        self.parse_expr().unwrap_or(Expr { kind: ExprKind::BoolLiteral(true), span: self.span() })
    }

    fn parse_switch_stmt(&mut self) -> Option<Stmt> {
        self.bump();
        self.expect_punct(Punct::LParen)?;
        let init = self.try_parse(|p| p.parse_decl_stmt().map(|decls| Box::new(Stmt::Decl(decls))));
        let discriminant = self.parse_expr()?;
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Some(Stmt::Switch { init, discriminant, body })
    }

    fn parse_try_stmt(&mut self) -> Option<Stmt> {
        self.bump();
        let body = self.parse_block()?;
        let mut handlers = Vec::new();
        while self.eat_kw(Keyword::Catch) {
            self.expect_punct(Punct::LParen)?;
            let (exception, is_catch_all) = if self.eat_punct(Punct::Ellipsis) {
                (None, true)
            } else {
                let ty = self.parse_type_specifier()?;
                let name = if let TokenKind::Ident(sym) = self.current_kind() {
                    self.bump();
                    sym
                } else {
                    self.intern("")
                };
                (Some((name, ty)), false)
            };
            self.expect_punct(Punct::RParen)?;
            let handler_body = self.parse_block()?;
            handlers.push(CatchClause { exception, is_catch_all, body: handler_body });
        }
        Some(Stmt::Try { body, handlers })
    }

    fn parse_seh_try_stmt(&mut self) -> Option<Stmt> {
        self.bump();
        let body = self.parse_block()?;
        if self.eat_kw(Keyword::Except__) {
            self.expect_punct(Punct::LParen)?;
            let filter = self.parse_expr()?;
            self.expect_punct(Punct::RParen)?;
            let handler_body = self.parse_block()?;
            return Some(Stmt::SehTry { body, handler: SehHandler::Except { filter, body: handler_body } });
        }
        self.expect_kw(Keyword::Finally__)?;
        let handler_body = self.parse_block()?;
        Some(Stmt::SehTry { body, handler: SehHandler::Finally { body: handler_body } })
    }

    /// `static_assert` at block scope has the same condition/message shape
    /// as the file-scope `Item::StaticAssert`; there's no `Stmt` variant for
    /// it (block-scope static_asserts don't affect codegen, only
    /// diagnostics), so only the condition is kept, as a statement that
    /// evaluates it for the constant-expression checker to flag.
    fn parse_static_assert_stmt(&mut self) -> Option<Stmt> {
        self.bump();
        self.expect_punct(Punct::LParen)?;
        let condition = self.parse_expr()?;
        if self.eat_punct(Punct::Comma) {
            if let TokenKind::StringLiteral(_) = self.current_kind() {
                self.bump();
            }
        }
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::Semi)?;
        Some(Stmt::Expr(condition))
    }
}
