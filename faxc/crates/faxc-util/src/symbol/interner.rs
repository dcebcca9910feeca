//! The string table backing [`Symbol`](super::Symbol).
//!
//! Unlike a long-lived process tool, a compiler invocation owns exactly one
//! `StringTable` for the lifetime of its `CompileSession`. There is no
//! cross-thread sharing and no global: the table lives on the session and is
//! dropped with it, so two sessions in the same process never see each
//! other's symbols.

use rustc_hash::FxHashMap;

/// Interned string storage for a single compile session.
///
/// Strings are bump-allocated so `&'static str` slices can be handed out
/// without tying their lifetime to `&self`; the arena is never freed or
/// reset before the table itself is dropped.
///
/// # Lookup
///
/// `intern` is amortized O(1) via a hash map keyed on the string; `resolve`
/// is O(1) via a parallel `Vec<&str>` indexed by the symbol itself, unlike
/// the linear scan a concurrent hash-sharded design needs for the reverse
/// direction.
pub struct StringTable {
    map: FxHashMap<Box<str>, u32>,
    strings: Vec<&'static str>,
    arena: bumpalo::Bump,
}

impl StringTable {
    pub fn new() -> Self {
        let mut table = Self {
            map: FxHashMap::default(),
            strings: Vec::new(),
            arena: bumpalo::Bump::new(),
        };
        table.seed_known_symbols();
        table
    }

    /// Intern `s`, returning the index to use as a `Symbol`'s payload.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.map.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        let stored: &'static str = unsafe {
            // SAFETY: the arena outlives every borrow we hand out here,
            // since it is only ever dropped along with the whole table.
            std::mem::transmute::<&str, &'static str>(self.arena.alloc_str(s))
        };
        self.strings.push(stored);
        self.map.insert(stored.into(), idx);
        idx
    }

    /// Resolve a previously interned index back to its string.
    pub fn resolve(&self, idx: u32) -> &'static str {
        self.strings[idx as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn stats(&self) -> InternerStats {
        InternerStats {
            count: self.strings.len(),
            capacity: self.strings.capacity(),
        }
    }

    /// Pre-intern the C++ keywords, operator names and well-known
    /// identifiers so their indices are fixed constants (see the `KW_*`,
    /// `OP_*` and `ID_*` constants in [`super`]). Order here must match the
    /// order those constants are declared in.
    fn seed_known_symbols(&mut self) {
        for kw in KNOWN_SYMBOLS {
            self.intern(kw);
        }
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Lightweight snapshot of interner occupancy, reported by `faxt --show-timing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InternerStats {
    pub count: usize,
    pub capacity: usize,
}

impl InternerStats {
    pub fn load_factor(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.count as f64 / self.capacity as f64
        }
    }
}

/// Every symbol interned by [`StringTable::seed_known_symbols`], in order.
/// The index of an entry here is its eventual `Symbol` index, so this array
/// is append-only: inserting in the middle would renumber every constant
/// declared after it.
pub(super) const KNOWN_SYMBOLS: &[&str] = &[
    // --- keywords (ISO C++20 [lex.key]) ---
    "alignas", "alignof", "asm", "auto", "bool", "break", "case", "catch",
    "char", "char8_t", "char16_t", "char32_t", "class", "concept", "const",
    "consteval", "constexpr", "constinit", "const_cast", "continue",
    "decltype", "default", "delete", "do", "double", "dynamic_cast", "else",
    "enum", "explicit", "export", "extern", "false", "float", "for",
    "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace",
    "new", "noexcept", "nullptr", "operator", "private", "protected",
    "public", "register", "reinterpret_cast", "requires", "return", "short",
    "signed", "sizeof", "static", "static_assert", "static_cast", "struct",
    "switch", "template", "this", "thread_local", "throw", "true", "try",
    "typedef", "typeid", "typename", "union", "unsigned", "using", "virtual",
    "void", "volatile", "wchar_t", "while",
    // --- well-known identifiers the compiler tests by symbol identity ---
    "main", "std", "size_t", "ptrdiff_t", "nullptr_t", "initializer_list",
    "operator+", "operator-", "operator*", "operator/", "operator%",
    "operator==", "operator!=", "operator<", "operator<=", "operator>",
    "operator>=", "operator[]", "operator()", "operator->", "operator=",
    "operator new", "operator delete", "__cxa_begin_catch", "__cxa_end_catch",
    "__cxa_throw", "__cxa_rethrow", "__cxa_allocate_exception",
    "__cxa_free_exception", "_Unwind_Resume", "terminate",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_and_resolves() {
        let mut t = StringTable::new();
        let a = t.intern("foo");
        let b = t.intern("bar");
        let a2 = t.intern("foo");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(t.resolve(a), "foo");
        assert_eq!(t.resolve(b), "bar");
    }

    #[test]
    fn known_symbols_are_seeded_at_fixed_indices() {
        let t = StringTable::new();
        assert_eq!(t.resolve(0), "alignas");
        assert!(t.len() >= KNOWN_SYMBOLS.len());
    }

    #[test]
    fn two_tables_do_not_share_state() {
        let mut t1 = StringTable::new();
        let mut t2 = StringTable::new();
        let base = KNOWN_SYMBOLS.len() as u32;
        let x1 = t1.intern("only_in_t1");
        let x2 = t2.intern("only_in_t2");
        assert_eq!(x1, base);
        assert_eq!(x2, base);
        assert_eq!(t1.resolve(x1), "only_in_t1");
        assert_eq!(t2.resolve(x2), "only_in_t2");
    }
}
