//! Native code generation for the Fax compiler
//!
//! Takes the LIR `faxc-lir` produces and turns it into a relocatable object
//! file: eliminate virtual registers onto stack slots ([`regalloc`]), encode
//! x86-64 machine code and collect branch/relocation fixups ([`encoder`],
//! [`emitter`]), build exception tables and RTTI records ([`eh`], [`rtti`]),
//! and write the result as ELF64 or PE/COFF ([`object`]). [`asm_text`]
//! renders the same post-regalloc instruction stream as human-readable
//! assembly for diagnostics. [`linker`] shells out to the platform linker to
//! turn one or more object files into an executable.

pub mod asm_text;
pub mod eh;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod linker;
pub mod object;
pub mod regalloc;
pub mod rtti;

pub use emitter::{EmittedFunction, Relocation};
pub use error::{CodeGenError, Result};
pub use object::{ObjectBuilder, ObjectFormat};
pub use regalloc::{eliminate_virtual_registers, AllocationResult};
