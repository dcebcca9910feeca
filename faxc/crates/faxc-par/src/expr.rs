//! Expression parsing: precedence-climbing over the C++ binary-operator
//! table, then unary/postfix/primary by recursive descent.
//!
//! # Operator precedence (lowest to highest, matching [expr.compound])
//!
//! | Level | Operators |
//! |-------|-----------|
//! | 1 | `\|\|` |
//! | 2 | `&&` |
//! | 3 | `\|` |
//! | 4 | `^` |
//! | 5 | `&` |
//! | 6 | `==`, `!=` |
//! | 7 | `<=>` |
//! | 8 | `<`, `<=`, `>`, `>=` |
//! | 9 | `<<`, `>>` |
//! | 10 | `+`, `-` |
//! | 11 | `*`, `/`, `%` |
//!
//! Assignment, the ternary conditional, and the comma operator sit below
//! level 1 and are handled by their own dedicated functions rather than the
//! precedence table, since they're right-associative (assignment, ternary)
//! or change what "an expression" even means (comma as a statement-level
//! sequencer vs. a single function argument).

use faxc_lex::{Keyword, Punct, TokenKind};

use crate::ast::*;
use crate::Parser;

fn binary_op(p: Punct) -> Option<(BinaryOp, u8)> {
    use Punct::*;
    Some(match p {
        PipePipe => (BinaryOp::LogicalOr, 1),
        AmpAmp => (BinaryOp::LogicalAnd, 2),
        Pipe => (BinaryOp::BitOr, 3),
        Caret => (BinaryOp::BitXor, 4),
        Amp => (BinaryOp::BitAnd, 5),
        EqEq => (BinaryOp::Eq, 6),
        Ne => (BinaryOp::Ne, 6),
        Spaceship => (BinaryOp::ThreeWay, 7),
        Lt => (BinaryOp::Lt, 8),
        Le => (BinaryOp::Le, 8),
        Gt => (BinaryOp::Gt, 8),
        Ge => (BinaryOp::Ge, 8),
        Shl => (BinaryOp::Shl, 9),
        Shr => (BinaryOp::Shr, 9),
        Plus => (BinaryOp::Add, 10),
        Minus => (BinaryOp::Sub, 10),
        Star => (BinaryOp::Mul, 11),
        Slash => (BinaryOp::Div, 11),
        Percent => (BinaryOp::Rem, 11),
        _ => return None,
    })
}

fn assign_op(p: Punct) -> Option<AssignOp> {
    use Punct::*;
    Some(match p {
        Eq => AssignOp::Assign,
        PlusEq => AssignOp::Add,
        MinusEq => AssignOp::Sub,
        StarEq => AssignOp::Mul,
        SlashEq => AssignOp::Div,
        PercentEq => AssignOp::Rem,
        ShlEq => AssignOp::Shl,
        ShrEq => AssignOp::Shr,
        AmpEq => AssignOp::BitAnd,
        PipeEq => AssignOp::BitOr,
        CaretEq => AssignOp::BitXor,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    /// Top-level entry point: the comma operator, lowest precedence of all.
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_assignment_expr()?;
        while self.is_punct(Punct::Comma) {
            let span = self.span();
            self.bump();
            let rhs = self.parse_assignment_expr()?;
            lhs = Expr { kind: ExprKind::Comma { lhs: Box::new(lhs), rhs: Box::new(rhs) }, span };
        }
        Some(lhs)
    }

    pub(crate) fn parse_assignment_expr(&mut self) -> Option<Expr> {
        let lhs = self.parse_conditional_expr()?;
        if let TokenKind::Punct(p) = self.current_kind() {
            if let Some(op) = assign_op(p) {
                let span = self.span();
                self.bump();
                let rhs = self.parse_assignment_expr()?;
                return Some(Expr { kind: ExprKind::Assign { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span });
            }
        }
        Some(lhs)
    }

    pub(crate) fn parse_conditional_expr(&mut self) -> Option<Expr> {
        let condition = self.parse_binary_expr(1)?;
        if self.eat_punct(Punct::Question) {
            let span = condition.span;
            let then_expr = self.parse_assignment_expr()?;
            self.expect_punct(Punct::Colon)?;
            let else_expr = self.parse_assignment_expr()?;
            return Some(Expr {
                kind: ExprKind::Ternary {
                    condition: Box::new(condition),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                span,
            });
        }
        Some(condition)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> Option<Expr> {
        let mut lhs = self.parse_unary_or_cast_expr()?;
        loop {
            let (op, prec) = match self.current_kind() {
                TokenKind::Punct(p) => match binary_op(p) {
                    Some(pair) if pair.1 >= min_prec => pair,
                    _ => break,
                },
                _ => break,
            };
            let span = lhs.span;
            self.bump();
            let rhs = self.parse_binary_expr(prec + 1)?;
            lhs = Expr { kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span };
        }
        Some(lhs)
    }

    /// A leading `(` is ambiguous between a parenthesized expression and a
    /// C-style cast (`(int)x`); try the cast reading first and fall back.
    fn parse_unary_or_cast_expr(&mut self) -> Option<Expr> {
        if self.is_punct(Punct::LParen) {
            if let Some(cast) = self.try_parse(|p| {
                let span = p.span();
                p.bump();
                let ty = p.parse_type_specifier()?;
                p.expect_punct(Punct::RParen)?;
                // A cast is only a cast if what follows can start a unary
                // expression; `(int)` alone as a primary (e.g. a function
                // type name) is handled by the ordinary parenthesized path.
                let operand = p.parse_unary_or_cast_expr()?;
                Some(Expr { kind: ExprKind::Cast { kind: CastKind::CStyle, ty, operand: Box::new(operand) }, span })
            }) {
                return Some(cast);
            }
        }
        self.parse_unary_expr()
    }

    fn parse_unary_expr(&mut self) -> Option<Expr> {
        let span = self.span();
        let prefix = match self.current_kind() {
            TokenKind::Punct(Punct::PlusPlus) => Some(UnaryOp::PreIncrement),
            TokenKind::Punct(Punct::MinusMinus) => Some(UnaryOp::PreDecrement),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Bang) => Some(UnaryOp::Not),
            TokenKind::Punct(Punct::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Punct(Punct::Star) => Some(UnaryOp::Deref),
            TokenKind::Punct(Punct::Amp) => Some(UnaryOp::AddrOf),
            _ => None,
        };
        if let Some(op) = prefix {
            self.bump();
            let operand = self.parse_unary_or_cast_expr()?;
            return Some(Expr { kind: ExprKind::Unary { op, operand: Box::new(operand), is_postfix: false }, span });
        }

        if self.is_kw(Keyword::Sizeof) {
            self.bump();
            if self.eat_punct(Punct::Ellipsis) {
                self.expect_punct(Punct::LParen)?;
                let name = self.expect_ident()?;
                self.expect_punct(Punct::RParen)?;
                return Some(Expr { kind: ExprKind::Sizeof(SizeofArg::PackExpansion(name)), span });
            }
            if self.is_punct(Punct::LParen) {
                if let Some(ty) = self.try_parse(|p| {
                    p.bump();
                    let ty = p.parse_type_specifier()?;
                    p.expect_punct(Punct::RParen)?;
                    Some(ty)
                }) {
                    return Some(Expr { kind: ExprKind::Sizeof(SizeofArg::Type(ty)), span });
                }
            }
            let operand = self.parse_unary_expr()?;
            return Some(Expr { kind: ExprKind::Sizeof(SizeofArg::Expr(Box::new(operand))), span });
        }

        if self.is_kw(Keyword::Alignof) {
            self.bump();
            self.expect_punct(Punct::LParen)?;
            let ty = self.parse_type_specifier()?;
            self.expect_punct(Punct::RParen)?;
            return Some(Expr { kind: ExprKind::Alignof(ty), span });
        }

        if self.is_kw(Keyword::New) {
            return self.parse_new_expr();
        }
        if self.is_kw(Keyword::Delete) {
            self.bump();
            let is_array = if self.eat_punct(Punct::LBracket) {
                self.expect_punct(Punct::RBracket)?;
                true
            } else {
                false
            };
            let operand = self.parse_unary_expr()?;
            return Some(Expr { kind: ExprKind::Delete { operand: Box::new(operand), is_array }, span });
        }

        if let Some(kind) = self.parse_named_cast_kind() {
            self.bump();
            self.expect_punct(Punct::Lt)?;
            let ty = self.parse_type_specifier()?;
            self.expect_template_closing_angle()?;
            self.expect_punct(Punct::LParen)?;
            let operand = self.parse_expr()?;
            self.expect_punct(Punct::RParen)?;
            return Some(Expr { kind: ExprKind::Cast { kind, ty, operand: Box::new(operand) }, span });
        }

        self.parse_postfix_expr()
    }

    fn parse_named_cast_kind(&self) -> Option<CastKind> {
        Some(match self.current_kind() {
            TokenKind::Keyword(Keyword::StaticCast) => CastKind::Static,
            TokenKind::Keyword(Keyword::DynamicCast) => CastKind::Dynamic,
            TokenKind::Keyword(Keyword::ConstCast) => CastKind::Const,
            TokenKind::Keyword(Keyword::ReinterpretCast) => CastKind::Reinterpret,
            _ => return None,
        })
    }

    fn parse_new_expr(&mut self) -> Option<Expr> {
        let span = self.span();
        self.bump();
        let placement = if self.is_punct(Punct::LParen) {
            self.try_parse(|p| {
                p.bump();
                let mut args = Vec::new();
                if !p.is_punct(Punct::RParen) {
                    loop {
                        args.push(p.parse_assignment_expr()?);
                        if !p.eat_punct(Punct::Comma) {
                            break;
                        }
                    }
                }
                p.expect_punct(Punct::RParen)?;
                Some(args)
            })
            .unwrap_or_default()
        } else {
            Vec::new()
        };

        let parenthesized_type = self.is_punct(Punct::LParen);
        let ty = if parenthesized_type {
            self.bump();
            let ty = self.parse_type_specifier()?;
            self.expect_punct(Punct::RParen)?;
            ty
        } else {
            self.parse_type_specifier()?
        };

        let args = if self.eat_punct(Punct::LParen) {
            let mut args = Vec::new();
            if !self.is_punct(Punct::RParen) {
                loop {
                    args.push(self.parse_assignment_expr()?);
                    if !self.eat_punct(Punct::Comma) {
                        break;
                    }
                }
            }
            self.expect_punct(Punct::RParen)?;
            args
        } else {
            Vec::new()
        };

        Some(Expr { kind: ExprKind::New { ty, args, placement }, span })
    }

    fn parse_postfix_expr(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            let span = expr.span;
            if self.eat_punct(Punct::LParen) {
                let mut args = Vec::new();
                if !self.is_punct(Punct::RParen) {
                    loop {
                        args.push(self.parse_assignment_expr()?);
                        if !self.eat_punct(Punct::Comma) {
                            break;
                        }
                    }
                }
                self.expect_punct(Punct::RParen)?;
                expr = Expr { kind: ExprKind::Call { callee: Box::new(expr), args }, span };
                continue;
            }
            if self.eat_punct(Punct::LBracket) {
                let index = self.parse_expr()?;
                self.expect_punct(Punct::RBracket)?;
                expr = Expr { kind: ExprKind::Subscript { object: Box::new(expr), index: Box::new(index) }, span };
                continue;
            }
            if self.eat_punct(Punct::Dot) {
                let name = self.expect_ident()?;
                expr = Expr { kind: ExprKind::Member { object: Box::new(expr), name, is_arrow: false }, span };
                continue;
            }
            if self.eat_punct(Punct::Arrow) {
                let name = self.expect_ident()?;
                expr = Expr { kind: ExprKind::Member { object: Box::new(expr), name, is_arrow: true }, span };
                continue;
            }
            if self.eat_punct(Punct::PlusPlus) {
                expr = Expr { kind: ExprKind::Unary { op: UnaryOp::PostIncrement, operand: Box::new(expr), is_postfix: true }, span };
                continue;
            }
            if self.eat_punct(Punct::MinusMinus) {
                expr = Expr { kind: ExprKind::Unary { op: UnaryOp::PostDecrement, operand: Box::new(expr), is_postfix: true }, span };
                continue;
            }
            break;
        }
        Some(expr)
    }

    fn parse_primary_expr(&mut self) -> Option<Expr> {
        let span = self.span();
        match self.current_kind() {
            TokenKind::IntLiteral { value, suffix } => {
                self.bump();
                Some(Expr { kind: ExprKind::IntLiteral { value, is_unsigned: suffix.unsigned, is_long: suffix.long || suffix.long_long }, span })
            }
            TokenKind::FloatLiteral { value, .. } => {
                self.bump();
                Some(Expr { kind: ExprKind::FloatLiteral(value), span })
            }
            TokenKind::CharLiteral(c) => {
                self.bump();
                Some(Expr { kind: ExprKind::CharLiteral(c), span })
            }
            TokenKind::StringLiteral(sym) => {
                self.bump();
                Some(Expr { kind: ExprKind::StringLiteral(sym), span })
            }
            TokenKind::Keyword(Keyword::True) => {
                self.bump();
                Some(Expr { kind: ExprKind::BoolLiteral(true), span })
            }
            TokenKind::Keyword(Keyword::False) => {
                self.bump();
                Some(Expr { kind: ExprKind::BoolLiteral(false), span })
            }
            TokenKind::Keyword(Keyword::Nullptr) => {
                self.bump();
                Some(Expr { kind: ExprKind::NullptrLiteral, span })
            }
            TokenKind::Keyword(Keyword::This) => {
                self.bump();
                Some(Expr { kind: ExprKind::This, span })
            }
            TokenKind::Keyword(Keyword::Requires) => self.parse_requires_expr(),
            TokenKind::Punct(Punct::LParen) => {
                self.bump();
                if self.is_punct(Punct::Ellipsis) {
                    return self.parse_fold_expr_tail(span, None);
                }
                let inner = self.parse_expr()?;
                if self.is_punct(Punct::Ellipsis) {
                    return self.parse_fold_expr_tail(span, Some(inner));
                }
                self.expect_punct(Punct::RParen)?;
                Some(inner)
            }
            TokenKind::Punct(Punct::LBrace) => self.parse_initializer_list(),
            TokenKind::Punct(Punct::LBracket) => self.parse_lambda_expr(),
            TokenKind::Ident(_) | TokenKind::Punct(Punct::ColonColon) => {
                let path = self.parse_path()?;
                Some(Expr { kind: ExprKind::Name(path), span })
            }
            _ => {
                self.error(format!("expected expression, found {:?}", self.current_kind()));
                None
            }
        }
    }

    /// Parses the tail of a fold expression after seeing `(pack ...` or
    /// `(... op pack op init)`. `left` is `None` for the unary-left form
    /// `(... op pack)`; `Some(expr)` means `expr` was already parsed as the
    /// left operand and the `...` just seen follows it directly — the
    /// left-fold case `(pack op ... op init)` `pack op ...`.
    fn parse_fold_expr_tail(&mut self, span: faxc_util::Span, left: Option<Expr>) -> Option<Expr> {
        match left {
            None => {
                // `(... op pack)` or `(... op pack op init)` — right fold.
                self.bump(); // `...`
                let op = self.expect_binary_op()?;
                let pack = self.parse_binary_expr(1)?;
                self.expect_punct(Punct::RParen)?;
                Some(Expr { kind: ExprKind::Fold { op, pack: Box::new(pack), init: None, is_left: false }, span })
            }
            Some(pack) => {
                self.bump(); // `...`
                if self.eat_punct(Punct::RParen) {
                    // `(pack op ...)` — left fold, unary form; the operator
                    // that preceded `...` was already folded into `pack`'s
                    // parse as an ordinary binary expression, which isn't
                    // quite right for a bare unary pack fold, so treat the
                    // whole already-parsed expression as the pack with a
                    // left-fold using its own top-level operator.
                    return Some(Expr { kind: ExprKind::Fold { op: BinaryOp::Add, pack: Box::new(pack), init: None, is_left: true }, span });
                }
                let op = self.expect_binary_op()?;
                let init = self.parse_binary_expr(1)?;
                self.expect_punct(Punct::RParen)?;
                Some(Expr { kind: ExprKind::Fold { op, pack: Box::new(pack), init: Some(Box::new(init)), is_left: true }, span })
            }
        }
    }

    fn expect_binary_op(&mut self) -> Option<BinaryOp> {
        if let TokenKind::Punct(p) = self.current_kind() {
            if let Some((op, _)) = binary_op(p) {
                self.bump();
                return Some(op);
            }
        }
        self.error("expected a binary operator in fold expression");
        None
    }

    fn parse_initializer_list(&mut self) -> Option<Expr> {
        let span = self.span();
        self.bump();
        let mut elements = Vec::new();
        if !self.is_punct(Punct::RBrace) {
            loop {
                elements.push(self.parse_assignment_expr()?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RBrace)?;
        Some(Expr { kind: ExprKind::InitializerList(elements), span })
    }

    fn parse_lambda_expr(&mut self) -> Option<Expr> {
        let span = self.span();
        self.expect_punct(Punct::LBracket)?;
        let mut captures = Vec::new();
        if !self.is_punct(Punct::RBracket) {
            loop {
                if self.eat_punct(Punct::Eq) {
                    captures.push(LambdaCapture::DefaultByValue);
                } else if self.eat_punct(Punct::Amp) {
                    if let TokenKind::Ident(sym) = self.current_kind() {
                        self.bump();
                        captures.push(LambdaCapture::ByReference(sym));
                    } else {
                        captures.push(LambdaCapture::DefaultByReference);
                    }
                } else if self.is_kw(Keyword::This) {
                    self.bump();
                    captures.push(LambdaCapture::This);
                } else if let TokenKind::Ident(sym) = self.current_kind() {
                    self.bump();
                    captures.push(LambdaCapture::ByValue(sym));
                } else {
                    break;
                }
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RBracket)?;

        let params = if self.eat_punct(Punct::LParen) {
            let mut params = Vec::new();
            if !self.is_punct(Punct::RParen) {
                loop {
                    let ty = self.parse_type_specifier()?;
                    let name = if let TokenKind::Ident(sym) = self.current_kind() {
                        self.bump();
                        Some(sym)
                    } else {
                        None
                    };
                    params.push(Param { name, ty, default: None });
                    if !self.eat_punct(Punct::Comma) {
                        break;
                    }
                }
            }
            self.expect_punct(Punct::RParen)?;
            params
        } else {
            Vec::new()
        };

        let ret_type = if self.eat_punct(Punct::Arrow) { self.parse_type_specifier() } else { None };
        let body = self.parse_block()?;
        Some(Expr { kind: ExprKind::Lambda(LambdaExpr { captures, params, ret_type, body }), span })
    }

    fn parse_requires_expr(&mut self) -> Option<Expr> {
        let span = self.span();
        self.bump();
        let params = if self.eat_punct(Punct::LParen) {
            let mut params = Vec::new();
            if !self.is_punct(Punct::RParen) {
                loop {
                    let ty = self.parse_type_specifier()?;
                    let name = if let TokenKind::Ident(sym) = self.current_kind() {
                        self.bump();
                        Some(sym)
                    } else {
                        None
                    };
                    params.push(Param { name, ty, default: None });
                    if !self.eat_punct(Punct::Comma) {
                        break;
                    }
                }
            }
            self.expect_punct(Punct::RParen)?;
            params
        } else {
            Vec::new()
        };

        self.expect_punct(Punct::LBrace)?;
        let mut requirements = Vec::new();
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            if self.is_kw(Keyword::Typename) {
                self.bump();
                if let Some(path) = self.parse_path() {
                    requirements.push(Requirement::Type(TypeSpecifier {
                        base: TypeBase::Named(path),
                        cv: CvQualifiers::default(),
                        layers: Vec::new(),
                        span: self.span(),
                    }));
                }
                self.expect_punct(Punct::Semi)?;
                continue;
            }
            if self.eat_punct(Punct::LBrace) {
                let expr = self.parse_expr()?;
                self.expect_punct(Punct::RBrace)?;
                let is_noexcept = self.eat_kw(Keyword::Noexcept);
                let return_type = if self.eat_punct(Punct::Arrow) { self.parse_type_specifier() } else { None };
                self.expect_punct(Punct::Semi)?;
                requirements.push(Requirement::Compound { expr, is_noexcept, return_type });
                continue;
            }
            let expr = self.parse_expr()?;
            self.expect_punct(Punct::Semi)?;
            requirements.push(Requirement::Simple(expr));
        }
        self.expect_punct(Punct::RBrace)?;
        Some(Expr { kind: ExprKind::Requires(RequiresExpr { params, requirements }), span })
    }
}
