//! Windows/PE exception data: a `FuncInfo`-shaped table consumed by
//! `__CxxFrameHandler3` (`faxc_rt_frame_handler`, standing in for the MSVC
//! runtime's own handler) during unwinding.
//!
//! This is structurally faithful to MSVC's scheme — an unwind map, a try map
//! and a per-try handler list — but not byte-for-bit compatible with real
//! `__CxxFrameHandler3` data (that format is undocumented in places and
//! depends on MSVC-specific name mangling this compiler doesn't produce).
//! `faxc_rt_frame_handler` only ever reads tables this compiler itself
//! wrote, so the simplification is self-consistent even though it wouldn't
//! interoperate with `cl.exe`-compiled objects.

use crate::rtti;
use faxc_lir::{EhRegion, EhRegionKind};

/// `__finally`/unwind-cleanup entries, one per nesting level, matching
/// MSVC's `UnwindMapEntry`: `to_state` is the enclosing level to transition
/// to once this level's cleanup action has run.
pub struct UnwindMapEntry {
    pub to_state: i32,
    pub action_symbol: Option<String>,
}

/// One `__try`/`__except` region: a state range plus the handlers tried
/// against it.
pub struct TryMapEntry {
    pub try_low: i32,
    pub try_high: i32,
    pub catch_high: i32,
    pub handlers: Vec<HandlerType>,
}

pub struct HandlerType {
    /// `None` for a catch-all (`catch (...)` or a bare `__except` filter
    /// that always selects `EXCEPTION_EXECUTE_HANDLER`).
    pub type_symbol: Option<String>,
    pub handler_block_label: String,
}

pub struct FuncInfo {
    pub unwind_map: Vec<UnwindMapEntry>,
    pub try_map: Vec<TryMapEntry>,
    /// RTTI symbols `try_map` entries reference, so the object writer can
    /// place relocations once it knows where each descriptor landed.
    pub type_relocations: Vec<String>,
}

pub fn build(regions: &[EhRegion]) -> FuncInfo {
    let mut unwind_map = Vec::new();
    let mut try_map = Vec::new();
    let mut type_relocations = Vec::new();

    for (state, region) in regions.iter().enumerate() {
        let state = state as i32;
        match &region.kind {
            EhRegionKind::SehFinally { finally_block } => {
                unwind_map.push(UnwindMapEntry {
                    to_state: state - 1,
                    action_symbol: Some(format!(".Lbb{}", finally_block.0)),
                });
            }
            EhRegionKind::SehExcept { filter_block, handler_block } => {
                unwind_map.push(UnwindMapEntry { to_state: state - 1, action_symbol: None });
                try_map.push(TryMapEntry {
                    try_low: state,
                    try_high: state,
                    catch_high: state + 1,
                    handlers: vec![HandlerType {
                        type_symbol: Some(format!(".Lbb{}", filter_block.0)),
                        handler_block_label: format!(".Lbb{}", handler_block.0),
                    }],
                });
            }
            EhRegionKind::Landingpad { handlers } => {
                // An Itanium landing pad crossing into COFF output (a unit
                // compiled for both targets) degrades to a single
                // catch-all try map entry; `eh::itanium::build` remains the
                // authoritative table for ELF output.
                unwind_map.push(UnwindMapEntry { to_state: state - 1, action_symbol: None });
                let mapped = handlers
                    .iter()
                    .map(|h| {
                        let type_symbol = h.exception_ty.as_ref().map(|ty| {
                            let record = rtti::build_record(ty);
                            type_relocations.push(record.symbol.clone());
                            record.symbol
                        });
                        HandlerType {
                            type_symbol,
                            handler_block_label: format!(".Lbb{}", h.handler_block.0),
                        }
                    })
                    .collect();
                try_map.push(TryMapEntry { try_low: state, try_high: state, catch_high: state + 1, handlers: mapped });
            }
        }
    }

    FuncInfo { unwind_map, try_map, type_relocations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_lir::{CatchHandler, EhRegionId};
    use faxc_mir::BlockId;

    #[test]
    fn a_finally_region_becomes_one_unwind_map_entry_with_no_try_map_entry() {
        let region = EhRegion {
            id: EhRegionId(0),
            try_blocks: vec![BlockId(0)],
            landing_pad: BlockId(1),
            kind: EhRegionKind::SehFinally { finally_block: BlockId(2) },
        };
        let info = build(&[region]);
        assert_eq!(info.unwind_map.len(), 1);
        assert!(info.try_map.is_empty());
    }

    #[test]
    fn an_except_region_becomes_one_try_map_entry() {
        let region = EhRegion {
            id: EhRegionId(0),
            try_blocks: vec![BlockId(0)],
            landing_pad: BlockId(1),
            kind: EhRegionKind::SehExcept { filter_block: BlockId(2), handler_block: BlockId(3) },
        };
        let info = build(&[region]);
        assert_eq!(info.try_map.len(), 1);
        assert_eq!(info.try_map[0].handlers.len(), 1);
    }

    #[test]
    fn a_typed_landingpad_handler_collects_a_type_relocation() {
        let region = EhRegion {
            id: EhRegionId(0),
            try_blocks: vec![BlockId(0)],
            landing_pad: BlockId(1),
            kind: EhRegionKind::Landingpad {
                handlers: vec![CatchHandler {
                    exception_ty: Some(faxc_sem::Type::Int),
                    exception_local: None,
                    handler_block: BlockId(1),
                }],
            },
        };
        let info = build(&[region]);
        assert_eq!(info.type_relocations.len(), 1);
    }
}
