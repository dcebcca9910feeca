//! The definition table: every function, class, enum, variable, and
//! namespace the program declares gets one [`DefId`] here, minted once and
//! referenced everywhere downstream (name resolution, type lowering,
//! mangling, `faxc-mir` lowering).

use faxc_par::ast;
use faxc_util::{DefId, DefIdGenerator, IndexVec, Span, Symbol};

use crate::types::Type;

#[derive(Debug)]
pub struct DefInfo {
    pub name: Symbol,
    pub kind: DefKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum DefKind {
    Function(FunctionSig),
    Class(ClassInfo),
    Enum(EnumInfo),
    Variable(Type),
    Namespace,
    /// A template's parameter list and its un-substituted body, kept around
    /// for instantiation. [`crate::Resolver::instantiate_path`] substitutes
    /// `params` into `body` (see [`crate::templates`]) the first time a
    /// particular argument list is used, then memoizes the result.
    Template { params: Vec<ast::TemplateParam>, body: Box<ast::Item> },
}

#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub params: Vec<Type>,
    pub ret: Type,
    pub is_variadic: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_const: bool,
}

#[derive(Debug)]
pub struct ClassInfo {
    pub key: ast::ClassKey,
    pub bases: Vec<DefId>,
    pub fields: Vec<(Symbol, Type)>,
    pub methods: Vec<DefId>,
    pub is_complete: bool,
}

#[derive(Debug)]
pub struct EnumInfo {
    pub is_scoped: bool,
    pub underlying: Type,
    pub variants: Vec<(Symbol, i64)>,
}

/// Owns every [`DefId`] minted during analysis.
pub struct DefTable {
    gen: DefIdGenerator,
    defs: IndexVec<DefId, DefInfo>,
}

impl DefTable {
    pub fn new() -> Self {
        Self { gen: DefIdGenerator::new(), defs: IndexVec::new() }
    }

    pub fn declare(&mut self, name: Symbol, kind: DefKind, span: Span) -> DefId {
        let id = self.gen.next();
        // DefIdGenerator and the IndexVec are both append-only and driven
        // from the same sequence of `declare` calls, so `id`'s index always
        // matches the slot `push` is about to create.
        let pushed = self.defs.push(DefInfo { name, kind, span });
        debug_assert_eq!(pushed, id);
        id
    }

    pub fn get(&self, id: DefId) -> Option<&DefInfo> {
        self.defs.get(id)
    }

    pub fn get_mut(&mut self, id: DefId) -> Option<&mut DefInfo> {
        self.defs.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DefId, &DefInfo)> {
        self.defs.iter_enumerated()
    }
}

impl Default for DefTable {
    fn default() -> Self {
        Self::new()
    }
}
