//! AST node definitions for a C++20 translation unit.
//!
//! Like the rest of the compiler, nodes are plain tagged-sum structs/enums
//! rather than trait objects: a `Stmt` is a `Stmt` value you match on, never
//! a `dyn Stmt` you call a virtual method on. Child nodes are owned
//! (`Box`/`Vec`), not arena handles — unlike `faxc-mir`'s `Function`, the
//! AST for one translation unit is built once and walked once, so the extra
//! indirection an arena buys isn't worth the API complexity here.

use faxc_util::{DefId, Span, Symbol};

pub type TranslationUnit = Vec<Item>;

#[derive(Debug, Clone)]
pub enum Item {
    Function(FunctionItem),
    Class(ClassItem),
    Enum(EnumItem),
    Union(ClassItem),
    Typedef { name: Symbol, ty: TypeSpecifier, span: Span },
    UsingAlias { name: Symbol, ty: TypeSpecifier, span: Span },
    UsingDirective { path: Path, span: Span },
    Namespace { name: Option<Symbol>, items: Vec<Item>, span: Span },
    Template(TemplateItem),
    StaticAssert { condition: Expr, message: Option<Symbol>, span: Span },
    ExternBlock { abi: Symbol, items: Vec<Item>, span: Span },
    GlobalVar(VarDecl),
    Friend(Box<Item>),
}

#[derive(Debug, Clone)]
pub struct TemplateItem {
    pub params: Vec<TemplateParam>,
    pub requires_clause: Option<Expr>,
    pub body: Box<Item>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TemplateParam {
    Type { name: Symbol, default: Option<TypeSpecifier>, is_pack: bool },
    NonType { name: Symbol, ty: TypeSpecifier, default: Option<Expr>, is_pack: bool },
    Template { name: Symbol, params: Vec<TemplateParam>, default: Option<Path> },
}

#[derive(Debug, Clone)]
pub enum TemplateArg {
    Type(TypeSpecifier),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct FunctionItem {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub is_variadic: bool,
    pub ret_type: TypeSpecifier,
    pub body: Option<Block>,
    pub linkage: Linkage,
    pub calling_convention: CallingConvention,
    pub is_virtual: bool,
    pub is_static: bool,
    pub is_const: bool,
    pub is_noexcept: bool,
    pub is_constexpr: bool,
    pub is_consteval: bool,
    pub is_explicit: bool,
    pub is_deleted: bool,
    pub is_defaulted: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Internal,
    External,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    /// System V AMD64 on ELF targets, the implicit default on COFF too
    /// unless overridden by an attribute.
    Cdecl,
    Stdcall,
    Fastcall,
    Thiscall,
    Vectorcall,
}

impl Default for CallingConvention {
    fn default() -> Self {
        CallingConvention::Cdecl
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Option<Symbol>,
    pub ty: TypeSpecifier,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKey {
    Struct,
    Class,
    Union,
}

#[derive(Debug, Clone)]
pub struct ClassItem {
    pub key: ClassKey,
    pub name: Symbol,
    pub bases: Vec<BaseSpecifier>,
    pub members: Vec<Member>,
    pub is_complete: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BaseSpecifier {
    pub path: Path,
    pub visibility: Visibility,
    pub is_virtual: bool,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub visibility: Visibility,
    pub kind: MemberKind,
}

#[derive(Debug, Clone)]
pub enum MemberKind {
    Field(FieldDecl),
    Method(FunctionItem),
    /// A method body seen while the enclosing class was still incomplete;
    /// re-parsed from `token_position` once the class is complete (spec
    /// §4.C "delayed parsing").
    DelayedMethod { signature: FunctionItem, token_position: usize },
    Constructor(FunctionItem),
    Destructor(FunctionItem),
    NestedType(Box<Item>),
    StaticAssert { condition: Expr, message: Option<Symbol> },
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Symbol,
    pub ty: TypeSpecifier,
    pub bitfield_width: Option<Expr>,
    pub initializer: Option<Expr>,
    pub is_static: bool,
    pub is_mutable: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumItem {
    pub name: Symbol,
    pub is_scoped: bool,
    pub underlying: Option<TypeSpecifier>,
    pub variants: Vec<(Symbol, Option<Expr>)>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: Symbol,
    pub ty: TypeSpecifier,
    pub initializer: Option<Expr>,
    pub is_static: bool,
    pub is_extern: bool,
    pub is_thread_local: bool,
    pub is_constexpr: bool,
    pub span: Span,
}

/// A qualified name: `std::vector<int>::iterator`, `::foo`, or a plain
/// unqualified identifier.
#[derive(Debug, Clone)]
pub struct Path {
    pub is_global: bool,
    pub segments: Vec<PathSegment>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct PathSegment {
    pub name: Symbol,
    pub template_args: Vec<TemplateArg>,
}

/// The full declarator-chain type model: a base specifier plus the
/// cv-qualifiers and pointer/reference/array layers wrapping it, composed
/// outside-in the way a declarator is read (spec §4.D step 2 composes
/// these under reference-collapsing during substitution).
#[derive(Debug, Clone)]
pub struct TypeSpecifier {
    pub base: TypeBase,
    pub cv: CvQualifiers,
    pub layers: Vec<TypeLayer>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CvQualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
}

#[derive(Debug, Clone)]
pub enum TypeLayer {
    Pointer(CvQualifiers),
    LValueRef,
    RValueRef,
    Array(Option<Expr>),
    Function { params: Vec<TypeSpecifier>, is_variadic: bool, is_noexcept: bool },
}

#[derive(Debug, Clone)]
pub enum TypeBase {
    Void,
    Bool,
    Char,
    Char8T,
    Char16T,
    Char32T,
    WCharT,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
    Auto,
    Named(Path),
    /// A template parameter referenced by name before substitution;
    /// resolved to a concrete `TypeBase` during instantiation.
    TemplateParam(Symbol),
    Decltype(Box<Expr>),
    /// Resolved during semantic analysis; unused by the parser itself.
    Resolved(DefId),
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Decl(Vec<VarDecl>),
    Block(Block),
    If {
        init: Option<Box<Stmt>>,
        is_constexpr: bool,
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    RangedFor {
        init: Option<Box<Stmt>>,
        binding: Symbol,
        binding_ty: Option<TypeSpecifier>,
        range: Expr,
        body: Box<Stmt>,
    },
    While { condition: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, condition: Expr },
    Switch { init: Option<Box<Stmt>>, discriminant: Expr, body: Box<Stmt> },
    Case { value: Expr, span: Span },
    Default { span: Span },
    Break(Span),
    Continue(Span),
    Goto { label: Symbol, span: Span },
    Label { name: Symbol, span: Span },
    Return { value: Option<Expr>, span: Span },
    Try { body: Block, handlers: Vec<CatchClause> },
    Throw { value: Option<Expr>, span: Span },
    SehTry { body: Block, handler: SehHandler },
    SehLeave(Span),
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub exception: Option<(Symbol, TypeSpecifier)>,
    pub is_catch_all: bool,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub enum SehHandler {
    Except { filter: Expr, body: Block },
    Finally { body: Block },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral { value: u128, is_unsigned: bool, is_long: bool },
    FloatLiteral(u64),
    CharLiteral(char),
    StringLiteral(Symbol),
    BoolLiteral(bool),
    NullptrLiteral,
    Name(Path),
    This,
    Unary { op: UnaryOp, operand: Box<Expr>, is_postfix: bool },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Assign { op: AssignOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Ternary { condition: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
    Comma { lhs: Box<Expr>, rhs: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Member { object: Box<Expr>, name: Symbol, is_arrow: bool },
    Subscript { object: Box<Expr>, index: Box<Expr> },
    Cast { kind: CastKind, ty: TypeSpecifier, operand: Box<Expr> },
    Sizeof(SizeofArg),
    Alignof(TypeSpecifier),
    New { ty: TypeSpecifier, args: Vec<Expr>, placement: Vec<Expr> },
    Delete { operand: Box<Expr>, is_array: bool },
    Lambda(LambdaExpr),
    Fold { op: BinaryOp, pack: Box<Expr>, init: Option<Box<Expr>>, is_left: bool },
    Requires(RequiresExpr),
    InitializerList(Vec<Expr>),
}

#[derive(Debug, Clone)]
pub enum SizeofArg {
    Expr(Box<Expr>),
    Type(TypeSpecifier),
    PackExpansion(Symbol),
}

#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub captures: Vec<LambdaCapture>,
    pub params: Vec<Param>,
    pub ret_type: Option<TypeSpecifier>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub enum LambdaCapture {
    ByValue(Symbol),
    ByReference(Symbol),
    DefaultByValue,
    DefaultByReference,
    This,
}

#[derive(Debug, Clone)]
pub struct RequiresExpr {
    pub params: Vec<Param>,
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone)]
pub enum Requirement {
    Simple(Expr),
    Type(TypeSpecifier),
    Compound { expr: Expr, is_noexcept: bool, return_type: Option<TypeSpecifier> },
    Nested(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    CStyle,
    Static,
    Dynamic,
    Const,
    Reinterpret,
    Functional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    BitNot,
    Deref,
    AddrOf,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Rem,
    Shl, Shr,
    BitAnd, BitOr, BitXor,
    LogicalAnd, LogicalOr,
    Eq, Ne, Lt, Le, Gt, Ge, ThreeWay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add, Sub, Mul, Div, Rem,
    Shl, Shr, BitAnd, BitOr, BitXor,
}
