//! LIR (Low-level Intermediate Representation) Crate
//!
//! MIR-LIR-CODEGEN-DEV-001: Subtask 2
//! Provides LIR constructs with x86-64 instruction set,
//! virtual register management, and System V AMD64 ABI support.

pub mod calling_convention;
pub mod lir;
pub mod lower;
pub mod optimize;
pub mod stack_frame;
// Superseded by the inline test modules in lir.rs/lower.rs/calling_convention.rs/
// stack_frame.rs: this one still calls the pre-rewrite `Symbol::intern` and
// `StackFrame::calculate_frame_size` APIs. Left on disk for the final trim.
// mod tests;
// #[cfg(test)]
// mod edge_cases;

pub use calling_convention::*;
pub use lir::*;
pub use lower::*;
pub use optimize::*;
pub use stack_frame::*;

/// Re-exported so `faxc-gen` can match on a `Function::eh_regions` entry's
/// shape without taking its own dependency on `faxc-mir`.
pub use faxc_mir::{CatchHandler, EhRegion, EhRegionId, EhRegionKind};
