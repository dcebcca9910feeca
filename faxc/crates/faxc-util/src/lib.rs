//! Foundation types shared by every stage of the compiler: interned
//! identifiers, typed arena indices, source locations, diagnostics, and the
//! arenas that back node graphs built during parsing and lowering.
//!
//! Nothing in this crate knows about C++ syntax or semantics; it is the
//! vocabulary the rest of the compiler is written in.

pub mod arena;
pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod logging;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use error::{
    DiagnosticError, DiagnosticResult, IndexVecError, IndexVecResult, InternalError,
    InternalResult, SourceMapError, SourceMapResult, SymbolError, SymbolResult,
};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::{InternerStats, StringTable, Symbol};

pub use rustc_hash::{FxHashMap, FxHashSet};
