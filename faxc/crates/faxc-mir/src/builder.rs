use crate::mir::*;
use faxc_sem::Type;
use faxc_util::Span;
use faxc_util::Symbol;

/// Incrementally assembles a [`Function`], tracking the block currently
/// being appended to the way `faxc-par`'s `Parser` tracks its cursor.
pub struct Builder {
    pub function: Function,
    pub current_block: BlockId,
}

impl Builder {
    pub fn new(name: Symbol, return_ty: Type, arg_count: usize) -> Self {
        let mut function = Function::new(name, return_ty, arg_count);
        let entry = function.blocks.push(BasicBlock {
            id: BlockId(0),
            statements: Vec::new(),
            terminator: Terminator::Unreachable,
        });
        function.entry_block = entry;
        Self { function, current_block: entry }
    }

    pub fn add_local(&mut self, ty: Type, name: Option<Symbol>, span: Span) -> LocalId {
        self.function.locals.push(Local { ty, span, name })
    }

    pub fn new_block(&mut self) -> BlockId {
        self.function.blocks.push(BasicBlock {
            id: BlockId(self.function.blocks.len() as u32),
            statements: Vec::new(),
            terminator: Terminator::Unreachable,
        })
    }

    pub fn set_current_block(&mut self, block: BlockId) {
        self.current_block = block;
    }

    pub fn statement(&mut self, stmt: Statement) {
        self.function.blocks[self.current_block].statements.push(stmt);
    }

    pub fn assign(&mut self, place: Place, rvalue: Rvalue) {
        self.statement(Statement::Assign(place, rvalue));
    }

    pub fn terminator(&mut self, terminator: Terminator) {
        self.function.blocks[self.current_block].terminator = terminator;
    }

    /// Whether the current block's terminator is still the placeholder set
    /// by `new_block` — callers use this to avoid overwriting a terminator
    /// (e.g. a `Return`) already emitted by an earlier `if`/`return` branch.
    pub fn current_block_is_open(&self) -> bool {
        matches!(self.function.blocks[self.current_block].terminator, Terminator::Unreachable)
    }

    /// Reserves a region slot before its protected body is lowered, so a
    /// `TryBegin`/`SehTryBegin` marker can carry a stable `EhRegionId` even
    /// though the body (and any region nested inside it) isn't lowered yet.
    /// [`Builder::finish_eh_region`] fills the placeholder in once the
    /// region's blocks are known.
    pub fn reserve_eh_region(&mut self) -> EhRegionId {
        let id = EhRegionId(self.function.eh_regions.len() as u32);
        self.function.eh_regions.push(EhRegion {
            id,
            try_blocks: Vec::new(),
            landing_pad: self.current_block,
            kind: EhRegionKind::Landingpad { handlers: Vec::new() },
        });
        id
    }

    pub fn finish_eh_region(&mut self, id: EhRegionId, try_blocks: Vec<BlockId>, landing_pad: BlockId, kind: EhRegionKind) {
        let region = &mut self.function.eh_regions[id.0 as usize];
        region.try_blocks = try_blocks;
        region.landing_pad = landing_pad;
        region.kind = kind;
    }

    pub fn build(self) -> Function {
        self.function
    }
}
