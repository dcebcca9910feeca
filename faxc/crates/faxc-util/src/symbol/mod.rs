//! Interned identifiers.
//!
//! A [`Symbol`] is a 4-byte handle into a session's [`StringTable`]. Unlike
//! the rest of the compiler's typed indices it isn't produced by an
//! [`IndexVec`](crate::IndexVec) push — it's produced by
//! [`StringTable::intern`] — but it follows the same idea: carry an integer,
//! not a pointer, and make the two non-interchangeable with other index
//! spaces via the type system.
//!
//! `Symbol` has no interning or resolution methods of its own because it
//! does not own a table. Every session threads its `&mut StringTable` (or
//! `&StringTable` for reads) explicitly, so a `Symbol` minted by one session
//! can't be silently resolved against another session's table.

mod interner;

pub use interner::{InternerStats, StringTable};

use std::fmt;

/// An interned identifier, operator spelling, or keyword.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    pub(crate) index: u32,
}

impl Symbol {
    /// Symbols below this index are keywords, operator spellings, or other
    /// well-known identifiers seeded by [`StringTable::new`].
    pub const RESERVED_END: u32 = interner::KNOWN_SYMBOLS.len() as u32;

    pub const fn from_u32(index: u32) -> Self {
        Self { index }
    }

    pub const fn as_u32(self) -> u32 {
        self.index
    }

    pub fn is_known(self) -> bool {
        self.index < Self::RESERVED_END
    }

    /// Resolve this symbol against `table`. Panics if `table` did not mint
    /// this symbol (or a table with an identical seed prefix).
    pub fn as_str(self, table: &StringTable) -> &'static str {
        table.resolve(self.index)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.index)
    }
}

macro_rules! known_symbols {
    ($($name:ident => $idx:expr),* $(,)?) => {
        $(pub const $name: Symbol = Symbol { index: $idx };)*
    };
}

known_symbols! {
    KW_ALIGNAS => 0, KW_ALIGNOF => 1, KW_ASM => 2, KW_AUTO => 3, KW_BOOL => 4,
    KW_BREAK => 5, KW_CASE => 6, KW_CATCH => 7, KW_CHAR => 8, KW_CHAR8_T => 9,
    KW_CHAR16_T => 10, KW_CHAR32_T => 11, KW_CLASS => 12, KW_CONCEPT => 13,
    KW_CONST => 14, KW_CONSTEVAL => 15, KW_CONSTEXPR => 16, KW_CONSTINIT => 17,
    KW_CONST_CAST => 18, KW_CONTINUE => 19, KW_DECLTYPE => 20, KW_DEFAULT => 21,
    KW_DELETE => 22, KW_DO => 23, KW_DOUBLE => 24, KW_DYNAMIC_CAST => 25,
    KW_ELSE => 26, KW_ENUM => 27, KW_EXPLICIT => 28, KW_EXPORT => 29,
    KW_EXTERN => 30, KW_FALSE => 31, KW_FLOAT => 32, KW_FOR => 33,
    KW_FRIEND => 34, KW_GOTO => 35, KW_IF => 36, KW_INLINE => 37, KW_INT => 38,
    KW_LONG => 39, KW_MUTABLE => 40, KW_NAMESPACE => 41, KW_NEW => 42,
    KW_NOEXCEPT => 43, KW_NULLPTR => 44, KW_OPERATOR => 45, KW_PRIVATE => 46,
    KW_PROTECTED => 47, KW_PUBLIC => 48, KW_REGISTER => 49,
    KW_REINTERPRET_CAST => 50, KW_REQUIRES => 51, KW_RETURN => 52,
    KW_SHORT => 53, KW_SIGNED => 54, KW_SIZEOF => 55, KW_STATIC => 56,
    KW_STATIC_ASSERT => 57, KW_STATIC_CAST => 58, KW_STRUCT => 59,
    KW_SWITCH => 60, KW_TEMPLATE => 61, KW_THIS => 62, KW_THREAD_LOCAL => 63,
    KW_THROW => 64, KW_TRUE => 65, KW_TRY => 66, KW_TYPEDEF => 67,
    KW_TYPEID => 68, KW_TYPENAME => 69, KW_UNION => 70, KW_UNSIGNED => 71,
    KW_USING => 72, KW_VIRTUAL => 73, KW_VOID => 74, KW_VOLATILE => 75,
    KW_WCHAR_T => 76, KW_WHILE => 77,

    ID_MAIN => 78, ID_STD => 79, ID_SIZE_T => 80, ID_PTRDIFF_T => 81,
    ID_NULLPTR_T => 82, ID_INITIALIZER_LIST => 83,

    OP_PLUS => 84, OP_MINUS => 85, OP_STAR => 86, OP_SLASH => 87,
    OP_PERCENT => 88, OP_EQ_EQ => 89, OP_NE => 90, OP_LT => 91, OP_LE => 92,
    OP_GT => 93, OP_GE => 94, OP_INDEX => 95, OP_CALL => 96, OP_ARROW => 97,
    OP_ASSIGN => 98, OP_NEW => 99, OP_DELETE => 100,

    ID_CXA_BEGIN_CATCH => 101, ID_CXA_END_CATCH => 102, ID_CXA_THROW => 103,
    ID_CXA_RETHROW => 104, ID_CXA_ALLOCATE_EXCEPTION => 105,
    ID_CXA_FREE_EXCEPTION => 106, ID_UNWIND_RESUME => 107, ID_TERMINATE => 108,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_constants_resolve_through_a_fresh_table() {
        let table = StringTable::new();
        assert_eq!(KW_IF.as_str(&table), "if");
        assert_eq!(KW_TEMPLATE.as_str(&table), "template");
        assert_eq!(ID_MAIN.as_str(&table), "main");
        assert_eq!(OP_ARROW.as_str(&table), "operator->");
    }

    #[test]
    fn non_reserved_symbol_round_trips() {
        let mut table = StringTable::new();
        let idx = table.intern("my_variable");
        let sym = Symbol::from_u32(idx);
        assert!(!sym.is_known());
        assert_eq!(sym.as_str(&table), "my_variable");
    }
}
