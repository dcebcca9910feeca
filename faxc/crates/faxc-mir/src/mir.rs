//! MIR (Mid-level Intermediate Representation) for Fax Compiler
//! 
//! MIR-LIR-CODEGEN-DEV-001: Subtask 1 - MIR Development
//! Enhanced with complete constructs, CFG support, and optimization hooks.

use faxc_sem::Type;
use faxc_util::{Idx, IndexVec, Span, Symbol, DefId};

/// MIR Function with complete Control Flow Graph
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub locals: IndexVec<LocalId, Local>,
    pub blocks: IndexVec<BlockId, BasicBlock>,
    pub entry_block: BlockId,
    pub return_ty: Type,
    pub arg_count: usize,
    pub arg_locals: Vec<LocalId>,
    /// Every protected region (`try`/`catch` or `__try`/`__except`/
    /// `__finally`) in the function, in source order. `faxc-gen` reads this
    /// to build the Itanium LSDA (`.gcc_except_table`) or the Windows
    /// `.xdata`/`.pdata`/`FuncInfo` tables — it doesn't rediscover region
    /// boundaries by scanning `Statement::TryBegin`/`TryEnd` markers itself.
    pub eh_regions: Vec<EhRegion>,
}

impl Function {
    pub fn new(name: Symbol, return_ty: Type, arg_count: usize) -> Self {
        Self {
            name,
            locals: IndexVec::new(),
            blocks: IndexVec::new(),
            entry_block: BlockId(0),
            return_ty,
            arg_count,
            arg_locals: Vec::new(),
            eh_regions: Vec::new(),
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("block_count", &self.block_count())
            .field("local_count", &self.local_count())
            .field("return_ty", &self.return_ty)
            .finish()
    }
}

/// Local variable
#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub ty: Type,
    pub span: Span,
    pub name: Option<Symbol>,
}

/// Local ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

impl Idx for LocalId {
    fn from_usize(idx: usize) -> Self { LocalId(idx as u32) }
    fn index(self) -> usize { self.0 as usize }
}

/// Block ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl Idx for BlockId {
    fn from_usize(idx: usize) -> Self { BlockId(idx as u32) }
    fn index(self) -> usize { self.0 as usize }
}

/// Basic Block
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub statements: Vec<Statement>,
    pub terminator: Terminator,
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign(Place, Rvalue),
    StorageLive(LocalId),
    StorageDead(LocalId),
    /// Marks the first/last block of an Itanium `try` region. Redundant
    /// with `Function::eh_regions`' `try_blocks`, but keeping the marker
    /// inline lets `faxc-gen` find a region's boundary while walking a
    /// block's statement stream instead of cross-referencing block IDs.
    TryBegin(EhRegionId),
    TryEnd(EhRegionId),
    /// Enters/leaves the `handlers[index]`'th catch clause of `region`.
    CatchBegin(EhRegionId, usize),
    CatchEnd(EhRegionId),
    SehTryBegin(EhRegionId),
    SehTryEnd(EhRegionId),
    /// `__except`'s filter raised `EXCEPTION_EXECUTE_HANDLER` while the
    /// stack was already unwinding for a different reason — SEH's
    /// `abnormal_termination()` predicate becomes true for the rest of the
    /// enclosing `__finally`.
    SehAbnormalTermination,
    Nop,
}

/// One protected region: an Itanium `try`/`catch` landing pad, or a Windows
/// `__try` scope. Carries everything `faxc-gen::eh` needs to emit a
/// call-site/action-table entry or a `FuncInfo`/`UnwindMapEntry` without
/// re-deriving it from the block graph.
#[derive(Debug, Clone, PartialEq)]
pub struct EhRegion {
    pub id: EhRegionId,
    /// Every block lowered from the region's protected body, in order.
    pub try_blocks: Vec<BlockId>,
    /// Where control transfers to on an exception raised inside `try_blocks`.
    pub landing_pad: BlockId,
    pub kind: EhRegionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EhRegionKind {
    /// One action-table entry per handler, tried in declaration order
    /// against the thrown object's `typeid`.
    Landingpad { handlers: Vec<CatchHandler> },
    /// `__try`/`__except(filter)`: `filter_block` evaluates the filter
    /// expression, `handler_block` runs if it selects
    /// `EXCEPTION_EXECUTE_HANDLER`.
    SehExcept { filter_block: BlockId, handler_block: BlockId },
    /// `__try`/`__finally`: `finally_block` always runs on the way out,
    /// normal exit or unwind alike.
    SehFinally { finally_block: BlockId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchHandler {
    /// `None` for `catch (...)`.
    pub exception_ty: Option<Type>,
    pub exception_local: Option<LocalId>,
    pub handler_block: BlockId,
}

/// Exception region ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EhRegionId(pub u32);

impl Idx for EhRegionId {
    fn from_usize(idx: usize) -> Self { EhRegionId(idx as u32) }
    fn index(self) -> usize { self.0 as usize }
}

/// Place - a memory location
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Local(LocalId),
    Projection(Box<Place>, Projection),
}

/// Projection onto a place
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Field(u32),
    Index(LocalId),
    ConstantIndex { offset: u64, min_length: u64, from_end: bool },
    Deref,
    Subslice { from: u64, to: u64, from_end: bool },
}

/// Rvalue
#[derive(Debug, Clone, PartialEq)]
pub enum Rvalue {
    Use(Operand),
    Ref(Place, Mutability),
    AddressOf(Place, Mutability),
    UnaryOp(UnOp, Operand),
    BinaryOp(BinOp, Box<Operand>, Box<Operand>),
    CheckedBinaryOp(BinOp, Box<Operand>, Box<Operand>),
    NullaryOp(NullOp, Type),
    Cast(CastKind, Operand, Type),
    Discriminant(Place),
    Aggregate(AggregateKind, Vec<Operand>),
    /// `typeid(expr)`/`typeid(T)`: yields a reference to the `std::type_info`
    /// `faxc-gen::rtti` emits for `ty`.
    Typeid(Type),
    /// `dynamic_cast<to>(operand)`. `is_reference` distinguishes the
    /// pointer form (null on failure) from the reference form (throws
    /// `std::bad_cast` on failure, spec §3's RTTI opcode set).
    DynamicCast { operand: Operand, from: Type, to: Type, is_reference: bool },
}

/// Operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Copy(Place),
    Move(Place),
    Constant(Constant),
}

/// Constant value
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub ty: Type,
    pub kind: ConstantKind,
}

/// Kind of constant
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantKind {
    Int(i64),
    Float(f64),
    String(Symbol),
    Bool(bool),
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutability { Mutable, Immutable }

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnOp { Neg, Not }

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add, Sub, Mul, Div, Rem,
    Eq, Ne, Lt, Le, Gt, Ge,
    BitAnd, BitOr, BitXor,
    Shl, Shr, Offset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NullOp { SizeOf, AlignOf }

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastKind {
    IntToInt, IntToFloat, FloatToInt, FloatToFloat,
    PtrToPtr, PtrToInt, IntToPtr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateKind {
    Tuple,
    Array(Type),
    Struct(DefId),
    Closure(DefId),
}

/// Terminator
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Goto { target: BlockId },
    If { cond: Operand, then_block: BlockId, else_block: BlockId },
    SwitchInt {
        discr: Operand,
        switch_ty: Type,
        targets: Vec<(u128, BlockId)>,
        otherwise: BlockId,
    },
    Return,
    Unreachable,
    Call {
        func: Operand,
        args: Vec<Operand>,
        destination: Place,
        target: Option<BlockId>,
        cleanup: Option<BlockId>,
    },
    Resume,
    Abort,
    /// `throw expr;` — raises a new exception object of type `ty`.
    /// `target` is `None` when no enclosing region catches locally (the
    /// unwind just leaves the function); `Some` when `cleanup` in an
    /// enclosing `Call` or this function's own `eh_regions` names a
    /// landing pad to run destructors in first.
    Throw { value: Option<Operand>, ty: Option<Type>, target: Option<BlockId> },
    /// Bare `throw;` inside a catch handler — re-raises the exception
    /// currently being handled rather than constructing a new one.
    Rethrow { target: Option<BlockId> },
}
