//! Run-time type information records
//!
//! `faxc_mir::Rvalue::Typeid`/`DynamicCast` lower to a `Lea` of
//! `faxc_lir::rtti_symbol_name(ty)` (see `faxc-lir::lower`) without ever
//! emitting the record itself — that's this module's job, run once per
//! distinct `Type` a translation unit actually names in a `typeid`/
//! `dynamic_cast` expression.
//!
//! This is a type *descriptor*, not an Itanium-conforming `std::type_info`
//! subobject: there's no class hierarchy or offset-to-base data available to
//! this crate (that lives in `faxc-sem`'s resolver, several layers up from
//! where object emission happens), so `faxc_rt_dynamic_cast` can only do
//! identity comparison between descriptors, not walk a real vtable. Good
//! enough for single-inheritance `dynamic_cast`/`typeid` within one
//! compilation unit; multiple inheritance and cross-TU RTTI both need a
//! mangler this crate doesn't have access to.

use faxc_sem::Type;

/// One `typeid`/`dynamic_cast` target's descriptor: a name string plus the
/// record that points at it.
pub struct RttiRecord {
    /// Symbol for the descriptor itself (what `Lea`'d `Address::NamedGlobal`
    /// names point at).
    pub symbol: String,
    /// Symbol for the descriptor's name bytes, placed in the same section.
    pub name_symbol: String,
    /// `Debug`-rendered type, nul-terminated, stored at `name_symbol`.
    pub name_bytes: Vec<u8>,
}

pub fn build_record(ty: &Type) -> RttiRecord {
    let symbol = faxc_lir::rtti_symbol_name(ty);
    let name_symbol = format!("{symbol}_name");
    let mut name_bytes = format!("{ty:?}").into_bytes();
    name_bytes.push(0);
    RttiRecord { symbol, name_symbol, name_bytes }
}

/// A descriptor's on-disk shape: one 8-byte pointer field naming
/// `name_symbol`, relocated once the object writer knows where that string
/// ends up.
pub struct RecordLayout {
    pub bytes: Vec<u8>,
    /// `(offset into bytes, symbol the object writer relocates against)`.
    pub relocations: Vec<(u32, String)>,
}

pub fn layout(record: &RttiRecord) -> RecordLayout {
    RecordLayout {
        bytes: vec![0u8; 8],
        relocations: vec![(0, record.name_symbol.clone())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_types_produce_identical_symbols() {
        let a = build_record(&Type::Int);
        let b = build_record(&Type::Int);
        assert_eq!(a.symbol, b.symbol);
    }

    #[test]
    fn distinct_types_produce_distinct_symbols() {
        let a = build_record(&Type::Int);
        let b = build_record(&Type::Double);
        assert_ne!(a.symbol, b.symbol);
    }

    #[test]
    fn name_bytes_are_nul_terminated() {
        let record = build_record(&Type::Bool);
        assert_eq!(*record.name_bytes.last().unwrap(), 0);
    }
}
