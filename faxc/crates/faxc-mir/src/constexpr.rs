//! Compile-time constant evaluation for `if constexpr` branch selection and
//! `static_assert` conditions.
//!
//! This is a small, literal-and-operator-only evaluator, not the general
//! constexpr interpreter C++ allows (no constexpr function calls, no loops).
//! It's grounded on `optimize.rs`'s `fold_bin`/`fold_un`: the same constant
//! arithmetic, just driven from the AST instead of from `Rvalue`s.

use faxc_par::ast::{BinaryOp, Expr, ExprKind, UnaryOp};

/// A compile-time constant value, narrowed to what a condition needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i128),
    Bool(bool),
    Float(f64),
}

impl ConstValue {
    pub fn as_bool(self) -> bool {
        match self {
            ConstValue::Int(i) => i != 0,
            ConstValue::Bool(b) => b,
            ConstValue::Float(f) => f != 0.0,
        }
    }

    fn as_int(self) -> Option<i128> {
        match self {
            ConstValue::Int(i) => Some(i),
            ConstValue::Bool(b) => Some(b as i128),
            ConstValue::Float(_) => None,
        }
    }

    fn as_float(self) -> f64 {
        match self {
            ConstValue::Int(i) => i as f64,
            ConstValue::Bool(b) => b as i128 as f64,
            ConstValue::Float(f) => f,
        }
    }
}

/// Evaluates `expr` as a constant expression, returning `None` for anything
/// this evaluator doesn't cover (names, calls, anything non-literal) rather
/// than guessing.
pub fn eval_const(expr: &Expr) -> Option<ConstValue> {
    match &expr.kind {
        ExprKind::IntLiteral { value, .. } => Some(ConstValue::Int(*value as i128)),
        ExprKind::BoolLiteral(b) => Some(ConstValue::Bool(*b)),
        ExprKind::CharLiteral(c) => Some(ConstValue::Int(*c as i128)),
        ExprKind::FloatLiteral(bits) => Some(ConstValue::Float(f64::from_bits(*bits))),
        ExprKind::Unary { op, operand, .. } => eval_unary(*op, eval_const(operand)?),
        ExprKind::Binary { op, lhs, rhs } => eval_binary(*op, eval_const(lhs)?, eval_const(rhs)?),
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            if eval_const(condition)?.as_bool() {
                eval_const(then_expr)
            } else {
                eval_const(else_expr)
            }
        }
        _ => None,
    }
}

fn eval_unary(op: UnaryOp, v: ConstValue) -> Option<ConstValue> {
    match op {
        UnaryOp::Plus => Some(v),
        UnaryOp::Neg => match v {
            ConstValue::Int(i) => Some(ConstValue::Int(-i)),
            ConstValue::Float(f) => Some(ConstValue::Float(-f)),
            ConstValue::Bool(b) => Some(ConstValue::Int(-(b as i128))),
        },
        UnaryOp::Not => Some(ConstValue::Bool(!v.as_bool())),
        UnaryOp::BitNot => Some(ConstValue::Int(!v.as_int()?)),
        UnaryOp::Deref
        | UnaryOp::AddrOf
        | UnaryOp::PreIncrement
        | UnaryOp::PreDecrement
        | UnaryOp::PostIncrement
        | UnaryOp::PostDecrement => None,
    }
}

fn eval_binary(op: BinaryOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    if matches!(lhs, ConstValue::Float(_)) || matches!(rhs, ConstValue::Float(_)) {
        let l = lhs.as_float();
        let r = rhs.as_float();
        return match op {
            BinaryOp::Add => Some(ConstValue::Float(l + r)),
            BinaryOp::Sub => Some(ConstValue::Float(l - r)),
            BinaryOp::Mul => Some(ConstValue::Float(l * r)),
            BinaryOp::Div if r != 0.0 => Some(ConstValue::Float(l / r)),
            BinaryOp::Eq => Some(ConstValue::Bool(l == r)),
            BinaryOp::Ne => Some(ConstValue::Bool(l != r)),
            BinaryOp::Lt => Some(ConstValue::Bool(l < r)),
            BinaryOp::Le => Some(ConstValue::Bool(l <= r)),
            BinaryOp::Gt => Some(ConstValue::Bool(l > r)),
            BinaryOp::Ge => Some(ConstValue::Bool(l >= r)),
            _ => None,
        };
    }

    match op {
        BinaryOp::LogicalAnd => return Some(ConstValue::Bool(lhs.as_bool() && rhs.as_bool())),
        BinaryOp::LogicalOr => return Some(ConstValue::Bool(lhs.as_bool() || rhs.as_bool())),
        _ => {}
    }

    let l = lhs.as_int()?;
    let r = rhs.as_int()?;
    match op {
        BinaryOp::Add => Some(ConstValue::Int(l.wrapping_add(r))),
        BinaryOp::Sub => Some(ConstValue::Int(l.wrapping_sub(r))),
        BinaryOp::Mul => Some(ConstValue::Int(l.wrapping_mul(r))),
        BinaryOp::Div if r != 0 => Some(ConstValue::Int(l / r)),
        BinaryOp::Rem if r != 0 => Some(ConstValue::Int(l % r)),
        BinaryOp::Shl => Some(ConstValue::Int(l.wrapping_shl(r as u32))),
        BinaryOp::Shr => Some(ConstValue::Int(l.wrapping_shr(r as u32))),
        BinaryOp::BitAnd => Some(ConstValue::Int(l & r)),
        BinaryOp::BitOr => Some(ConstValue::Int(l | r)),
        BinaryOp::BitXor => Some(ConstValue::Int(l ^ r)),
        BinaryOp::Eq => Some(ConstValue::Bool(l == r)),
        BinaryOp::Ne => Some(ConstValue::Bool(l != r)),
        BinaryOp::Lt => Some(ConstValue::Bool(l < r)),
        BinaryOp::Le => Some(ConstValue::Bool(l <= r)),
        BinaryOp::Gt => Some(ConstValue::Bool(l > r)),
        BinaryOp::Ge => Some(ConstValue::Bool(l >= r)),
        BinaryOp::Div | BinaryOp::Rem => None,
        BinaryOp::ThreeWay | BinaryOp::LogicalAnd | BinaryOp::LogicalOr => None,
    }
}

/// Evaluates an `if constexpr` condition, selecting which branch of the
/// statement survives. Returns `None` if the condition isn't a constant
/// this evaluator can fold, in which case the caller should lower both
/// branches as an ordinary runtime `if`.
pub fn eval_if_constexpr(condition: &Expr) -> Option<bool> {
    eval_const(condition).map(|v| v.as_bool())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::Span;

    fn int(v: u128) -> Expr {
        Expr { kind: ExprKind::IntLiteral { value: v, is_unsigned: false, is_long: false }, span: Span::DUMMY }
    }

    #[test]
    fn folds_arithmetic() {
        let expr = Expr {
            kind: ExprKind::Binary { op: BinaryOp::Add, lhs: Box::new(int(2)), rhs: Box::new(int(3)) },
            span: Span::DUMMY,
        };
        assert_eq!(eval_const(&expr), Some(ConstValue::Int(5)));
    }

    #[test]
    fn short_circuits_division_by_zero() {
        let expr = Expr {
            kind: ExprKind::Binary { op: BinaryOp::Div, lhs: Box::new(int(1)), rhs: Box::new(int(0)) },
            span: Span::DUMMY,
        };
        assert_eq!(eval_const(&expr), None);
    }

    #[test]
    fn if_constexpr_selects_branch() {
        let cond = Expr {
            kind: ExprKind::Binary { op: BinaryOp::Gt, lhs: Box::new(int(5)), rhs: Box::new(int(1)) },
            span: Span::DUMMY,
        };
        assert_eq!(eval_if_constexpr(&cond), Some(true));
    }
}
