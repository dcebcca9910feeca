//! AST to MIR lowering.
//!
//! Walks a resolved `faxc_par::ast::FunctionItem` directly into a
//! `mir::Function` — there's no separate HIR stage between them.

pub mod ast_to_mir;

pub use ast_to_mir::{lower_function, lower_method};
