//! Error types for native code generation
//!
//! Covers every stage this crate drives: eliminating virtual registers,
//! encoding x86-64 machine code, and writing the ELF64/COFF object file.

use thiserror::Error;

/// Error type for code generation
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// A jump/call target never had a label defined for it
    #[error("Target block '{0}' not found")]
    BlockNotFound(String),

    /// Missing comparison before conditional jump
    #[error("No comparison before conditional jump")]
    MissingComparison,

    /// An instruction shape the encoder doesn't (yet) support
    #[error("Cannot encode instruction: {0}")]
    UnencodableInstruction(String),

    /// Function not found
    #[error("Function '{0}' not found")]
    FunctionNotFound(String),

    /// Invalid operand type
    #[error("Invalid operand type: {0}")]
    InvalidOperandType(String),

    /// Type mapping error
    #[error("Type mapping error: {0}")]
    TypeMappingError(String),

    /// Register allocation failed
    #[error("Register allocation failed: {0}")]
    RegisterAllocationFailed(String),

    /// Stack frame error
    #[error("Stack frame error: {0}")]
    StackFrameError(String),

    /// ABI error
    #[error("ABI error: {0}")]
    AbiError(String),

    /// A branch offset didn't fit the encoding it was patched into (e.g. a
    /// rel8 jump whose target ended up more than 127 bytes away)
    #[error("Branch offset out of range: {0}")]
    BranchOutOfRange(String),

    /// Object file construction failed (section/symbol table inconsistency)
    #[error("Object writer error: {0}")]
    ObjectWriterError(String),

    /// Compilation error (target, linking, etc.)
    #[error("Compilation error: {0}")]
    CompilationError(String),

    /// Internal error - indicates a bug
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O failure writing the object/assembly file to disk
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for code generation operations
pub type Result<T> = std::result::Result<T, CodeGenError>;
