//! System V/ELF exception tables: a `.gcc_except_table`-style LSDA
//! (language-specific data area) per function, read by the personality
//! routine (`faxc_rt_personality`, standing in for `__gxx_personality_v0`)
//! during unwinding.
//!
//! Layout, in the order bytes are written:
//!   - call-site table: one entry per protected region, `(start, length,
//!     landing_pad, action)`, all ULEB128 except the leading header.
//!   - action table: one entry per handler, `(type_filter, next_action)`
//!     SLEB128 pairs, forming a singly linked list for `catch (...)`
//!     fallthrough.
//!   - type table: one 8-byte slot per distinct exception type, holding the
//!     symbol of that type's RTTI descriptor (see [`crate::rtti`]).
//!
//! `landing_pad`/`action` are both 0 for a call site with nothing to do on
//! unwind (falls straight through to the caller's frame).

use crate::rtti;
use faxc_lir::{CatchHandler, EhRegion, EhRegionKind};
use std::collections::HashMap;

/// One call-site table entry, already resolved to code offsets.
pub struct CallSite {
    pub start: u32,
    pub length: u32,
    pub landing_pad: u32,
    /// 0 means "no action", 1-based index into the action table otherwise.
    pub action: u32,
}

/// A function's full LSDA, plus the relocations the object writer needs to
/// resolve the type-table's RTTI pointers against.
pub struct Lsda {
    pub call_sites: Vec<CallSite>,
    /// SLEB128-encoded `(type_filter, next_action)` pairs, concatenated.
    pub action_table: Vec<u8>,
    /// One 8-byte slot per type-table entry, in the order the action table
    /// references them (index 0 is unused; Itanium type filters are 1-based,
    /// negative filters denote exception specifications this compiler never
    /// emits).
    pub type_table: Vec<u8>,
    pub type_table_relocations: Vec<(u32, String)>,
}

/// Builds the LSDA for one function's regions.
///
/// `label_offsets` and `function_length` come from `emitter::EmittedFunction`
/// so a region's `BlockId`s can be turned into code offsets; a protected
/// region's length runs from its first block's label to the next region (or
/// function end) since MIR doesn't record a block's own length.
pub fn build(
    regions: &[EhRegion],
    label_offsets: &HashMap<String, u32>,
    function_length: u32,
) -> Lsda {
    let mut call_sites = Vec::new();
    let mut action_table = Vec::new();
    let mut type_table = Vec::new();
    let mut type_table_relocations = Vec::new();
    let mut type_index: HashMap<String, u32> = HashMap::new();

    for region in regions {
        let EhRegionKind::Landingpad { handlers } = &region.kind else {
            // SEH regions have no place in an Itanium LSDA; `eh::coff`
            // handles `SehExcept`/`SehFinally` separately.
            continue;
        };
        if region.try_blocks.is_empty() {
            continue;
        }
        let action = if handlers.is_empty() {
            0
        } else {
            emit_action_chain(handlers, &mut type_table, &mut type_table_relocations, &mut type_index, &mut action_table)
        };
        let landing_pad = *label_offsets
            .get(&format!(".Lbb{}", region.landing_pad.0))
            .unwrap_or(&0);

        let region_start = region
            .try_blocks
            .iter()
            .filter_map(|b| label_offsets.get(&format!(".Lbb{}", b.0)))
            .min()
            .copied()
            .unwrap_or(0);
        let region_end = next_region_start(regions, region, label_offsets).unwrap_or(function_length);

        call_sites.push(CallSite {
            start: region_start,
            length: region_end.saturating_sub(region_start),
            landing_pad,
            action,
        });
    }

    call_sites.sort_by_key(|c| c.start);
    Lsda { call_sites, action_table, type_table, type_table_relocations }
}

/// A region's protected span ends where the next region (by start offset)
/// begins. Best-effort: MIR doesn't give us an authoritative end, and nested
/// `try` blocks aren't modeled here.
fn next_region_start(regions: &[EhRegion], current: &EhRegion, label_offsets: &HashMap<String, u32>) -> Option<u32> {
    let current_start = current
        .try_blocks
        .iter()
        .filter_map(|b| label_offsets.get(&format!(".Lbb{}", b.0)))
        .min()
        .copied()?;
    regions
        .iter()
        .filter(|r| r.id != current.id)
        .filter_map(|r| {
            r.try_blocks
                .iter()
                .filter_map(|b| label_offsets.get(&format!(".Lbb{}", b.0)))
                .min()
                .copied()
        })
        .filter(|&start| start > current_start)
        .min()
}

fn emit_action_chain(
    handlers: &[CatchHandler],
    type_table: &mut Vec<u8>,
    type_table_relocations: &mut Vec<(u32, String)>,
    type_index: &mut HashMap<String, u32>,
    action_table: &mut Vec<u8>,
) -> u32 {
    // Itanium chains handlers back-to-front: the last handler's action
    // record has `next_action = 0`, each earlier one points at the record
    // after it, so a linear type-match scan at unwind time tries handlers in
    // declaration order.
    let mut next_action_offset = 0i64;
    let mut first_offset = 0u32;
    for (i, handler) in handlers.iter().enumerate() {
        let filter = type_filter(handler, type_table, type_table_relocations, type_index);
        let record_offset = action_table.len() as u32;
        if i == 0 {
            first_offset = record_offset;
        }
        write_sleb128(action_table, filter as i64);
        write_sleb128(action_table, next_action_offset);
        next_action_offset = -((action_table.len() as i64) - record_offset as i64);
    }
    // Action numbers are 1-based byte offsets into the action table.
    first_offset + 1
}

/// `catch (...)` uses filter 0 (matches anything); a typed `catch (T&)` gets
/// a 1-based type-table index, encoded as a negative filter per Itanium's
/// "the filter value addresses `-index` into the type table read
/// backwards" convention — simplified here to a positive forward index
/// since this compiler also controls the table's consumer.
fn type_filter(
    handler: &CatchHandler,
    type_table: &mut Vec<u8>,
    type_table_relocations: &mut Vec<(u32, String)>,
    type_index: &mut HashMap<String, u32>,
) -> u32 {
    let Some(ty) = &handler.exception_ty else {
        return 0;
    };
    let record = rtti::build_record(ty);
    if let Some(&idx) = type_index.get(&record.symbol) {
        return idx;
    }
    let idx = (type_table.len() / 8) as u32 + 1;
    let offset = type_table.len() as u32;
    type_table.extend_from_slice(&[0u8; 8]);
    type_table_relocations.push((offset, record.symbol.clone()));
    type_index.insert(record.symbol, idx);
    idx
}

fn write_sleb128(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if !done {
            byte |= 0x80;
        }
        out.push(byte);
        if done {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_lir::EhRegionId;
    use faxc_mir::BlockId;
    use faxc_sem::Type;

    fn label_at(offsets: &mut HashMap<String, u32>, block: u32, offset: u32) {
        offsets.insert(format!(".Lbb{block}"), offset);
    }

    #[test]
    fn a_catch_all_region_gets_a_zero_filter_action() {
        let region = EhRegion {
            id: EhRegionId(0),
            try_blocks: vec![BlockId(0)],
            landing_pad: BlockId(1),
            kind: EhRegionKind::Landingpad {
                handlers: vec![CatchHandler { exception_ty: None, exception_local: None, handler_block: BlockId(1) }],
            },
        };
        let mut offsets = HashMap::new();
        label_at(&mut offsets, 0, 0);
        label_at(&mut offsets, 1, 20);
        let lsda = build(std::slice::from_ref(&region), &offsets, 40);
        assert_eq!(lsda.call_sites.len(), 1);
        assert_eq!(lsda.call_sites[0].landing_pad, 20);
        assert_ne!(lsda.call_sites[0].action, 0);
    }

    #[test]
    fn a_typed_catch_adds_one_type_table_entry() {
        let region = EhRegion {
            id: EhRegionId(0),
            try_blocks: vec![BlockId(0)],
            landing_pad: BlockId(1),
            kind: EhRegionKind::Landingpad {
                handlers: vec![CatchHandler {
                    exception_ty: Some(Type::Int),
                    exception_local: None,
                    handler_block: BlockId(1),
                }],
            },
        };
        let mut offsets = HashMap::new();
        label_at(&mut offsets, 0, 0);
        label_at(&mut offsets, 1, 20);
        let lsda = build(std::slice::from_ref(&region), &offsets, 40);
        assert_eq!(lsda.type_table.len(), 8);
        assert_eq!(lsda.type_table_relocations.len(), 1);
    }

    #[test]
    fn a_region_with_no_handlers_gets_action_zero() {
        let region = EhRegion {
            id: EhRegionId(0),
            try_blocks: vec![BlockId(0)],
            landing_pad: BlockId(1),
            kind: EhRegionKind::Landingpad { handlers: vec![] },
        };
        let mut offsets = HashMap::new();
        label_at(&mut offsets, 0, 0);
        label_at(&mut offsets, 1, 20);
        let lsda = build(std::slice::from_ref(&region), &offsets, 40);
        assert_eq!(lsda.call_sites[0].action, 0);
    }
}
