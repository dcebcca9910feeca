//! Exception-handling metadata: per-function tables the unwinder consults
//! to find a landing pad for the address an exception was thrown (or
//! propagating) through.
//!
//! `itanium` targets System V/ELF (`.gcc_except_table`, read by
//! `__gxx_personality_v0`); `coff` targets Windows/PE (`__CxxFrameHandler3`'s
//! `FuncInfo`). Both read the same [`faxc_lir::EhRegion`] data
//! `faxc-lir::lower` attached to each function; only the on-disk table shape
//! differs.

pub mod coff;
pub mod itanium;
