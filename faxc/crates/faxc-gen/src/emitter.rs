//! Per-function two-pass emission: encode every instruction once, then
//! patch every branch that targets a label inside the same function.
//!
//! Call/lea fixups against symbols outside the function (runtime helpers,
//! other translation-unit functions, RTTI records) are left as relocation
//! entries for `object::elf`/`object::coff` to resolve against the section
//! and symbol table they own.

use crate::encoder::{self, FixupKind};
use crate::error::{CodeGenError, Result};
use crate::regalloc::eliminate_virtual_registers;
use faxc_lir::{EhRegion, Function, Instruction};
use faxc_util::StringTable;
use std::collections::HashMap;

/// A relocation against a symbol this function's code doesn't define: the
/// object writer turns this into an ELF `R_X86_64_PLT32`/COFF `IMAGE_REL_AMD64_REL32`
/// entry once it knows the symbol's final section/offset (or leaves it for
/// the linker to resolve against another object file).
#[derive(Debug, Clone)]
pub struct Relocation {
    /// Byte offset within this function's code where the rel32 field lives.
    pub offset: u32,
    pub symbol: String,
}

/// One function's fully resolved machine code, ready to be appended to an
/// object file's text section.
pub struct EmittedFunction {
    pub name: String,
    pub code: Vec<u8>,
    pub relocations: Vec<Relocation>,
    pub eh_regions: Vec<EhRegion>,
    /// Byte offset of each `.Lbb{n}`-style label, kept around so
    /// `eh::itanium`/`eh::coff` can turn a region's `BlockId`s into code
    /// offsets for the LSDA/`FuncInfo` tables.
    pub label_offsets: HashMap<String, u32>,
}

pub fn emit_function(func: &Function, table: &StringTable) -> Result<EmittedFunction> {
    let name = func.name.as_str(table).to_string();
    let allocation = eliminate_virtual_registers(func);

    let prologue = encoder::encode_instruction(
        &Instruction::EnterFrame { frame_size: allocation.frame.frame_size },
        0,
        table,
    )?;
    let mut code = prologue.bytes;
    let mut pending: Vec<(usize, FixupKind)> = Vec::new();
    let mut label_offsets = HashMap::new();

    for instr in &allocation.instructions {
        if let Instruction::Label { name } = instr {
            label_offsets.insert(name.clone(), code.len() as u32);
        }
        // `Ret` needs the epilogue (`leave`) emitted immediately before it;
        // `regalloc` only guarantees the return value already sits in RAX.
        if matches!(instr, Instruction::Ret { .. }) {
            let leave = encoder::encode_instruction(&Instruction::LeaveFrame, code.len(), table)?;
            code.extend_from_slice(&leave.bytes);
        }
        let at = code.len();
        let encoded = encoder::encode_instruction(instr, at, table)?;
        code.extend_from_slice(&encoded.bytes);
        for fixup in encoded.fixups {
            pending.push((fixup.at, fixup.kind));
        }
    }

    let mut relocations = Vec::new();
    for (at, kind) in pending {
        match kind {
            FixupKind::LocalLabel(label) => {
                let target = *label_offsets
                    .get(&label)
                    .ok_or_else(|| CodeGenError::BlockNotFound(label.clone()))?;
                patch_rel32(&mut code, at, target)?;
            }
            FixupKind::ExternalSymbol(symbol) => {
                relocations.push(Relocation { offset: at as u32, symbol });
            }
        }
    }

    Ok(EmittedFunction {
        name,
        code,
        relocations,
        eh_regions: func.eh_regions.clone(),
        label_offsets,
    })
}

/// Patches the 4-byte rel32 field at `at` so that `at + 4 + rel32 == target`,
/// the PC-relative convention every branch/call encoding in this crate uses
/// (the displacement is relative to the address of the *next* instruction).
fn patch_rel32(code: &mut [u8], at: usize, target: u32) -> Result<()> {
    let next_instr = at as i64 + 4;
    let rel = target as i64 - next_instr;
    if rel < i32::MIN as i64 || rel > i32::MAX as i64 {
        return Err(CodeGenError::BranchOutOfRange(format!(
            "branch at offset {at} to {target} does not fit in rel32"
        )));
    }
    code[at..at + 4].copy_from_slice(&(rel as i32).to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_lir::lower_mir_to_lir;
    use faxc_mir::Builder;
    use faxc_sem::Type;
    use faxc_util::Symbol;

    #[test]
    fn a_function_returning_a_constant_emits_nonempty_code_and_no_unresolved_local_labels() {
        let mut table = StringTable::new();
        let name = Symbol::from_u32(table.intern("answer"));
        let mut builder = Builder::new(name, Type::Int, 0);
        let x = builder.add_local(Type::Int, None, faxc_util::Span::DUMMY);
        builder.assign(
            faxc_mir::Place::Local(x),
            faxc_mir::Rvalue::Use(faxc_mir::Operand::Constant(faxc_mir::Constant {
                ty: Type::Int,
                kind: faxc_mir::ConstantKind::Int(42),
            })),
        );
        builder.terminator(faxc_mir::Terminator::Return);
        let mir_fn = builder.build();
        let lir_fn = lower_mir_to_lir(&mir_fn);

        let emitted = emit_function(&lir_fn, &table).unwrap();
        assert_eq!(emitted.name, "answer");
        assert!(!emitted.code.is_empty());
        // ends with `leave; ret`
        assert_eq!(&emitted.code[emitted.code.len() - 2..], &[0xC9, 0xC3]);
    }

    #[test]
    fn a_forward_jump_resolves_to_the_right_offset() {
        let mut table = StringTable::new();
        let mut func = Function::new(Symbol::from_u32(table.intern("branchy")));
        func.instructions.push(Instruction::Jmp { target: ".Lbb1".into() });
        func.instructions.push(Instruction::Label { name: ".Lbb1".into() });
        func.instructions.push(Instruction::Ret { value: None });

        let emitted = emit_function(&func, &table).unwrap();
        // jmp rel32 is 5 bytes (E9 + 4); its target is right after it.
        let jmp_at = emitted.code.iter().position(|&b| b == 0xE9).unwrap();
        let rel = i32::from_le_bytes(emitted.code[jmp_at + 1..jmp_at + 5].try_into().unwrap());
        assert_eq!(rel, 0);
    }

    #[test]
    fn calling_an_unknown_symbol_produces_a_relocation_not_an_error() {
        let mut table = StringTable::new();
        let mut func = Function::new(Symbol::from_u32(table.intern("caller")));
        func.instructions.push(Instruction::Call { target: faxc_lir::CallTarget::Runtime("faxc_rt_throw") });
        func.instructions.push(Instruction::Ret { value: None });

        let emitted = emit_function(&func, &table).unwrap();
        assert_eq!(emitted.relocations.len(), 1);
        assert_eq!(emitted.relocations[0].symbol, "faxc_rt_throw");
    }

    #[test]
    fn unresolvable_local_label_is_reported_not_silently_skipped() {
        let mut table = StringTable::new();
        let mut func = Function::new(Symbol::from_u32(table.intern("dangling")));
        func.instructions.push(Instruction::Jmp { target: ".Lbb99".into() });
        let err = emit_function(&func, &table).unwrap_err();
        assert!(matches!(err, CodeGenError::BlockNotFound(_)));
    }
}
