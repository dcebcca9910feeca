//! Virtual register elimination
//!
//! `faxc_lir::lower` hands us a function whose working values live in
//! `VirtualRegister`s with an unbounded id space. The encoder only
//! understands `PhysicalRegister`s and memory operands, so this pass walks
//! every instruction once and rewrites each virtual register reference into
//! a load from (or store to) a dedicated stack slot, round-tripping through
//! one of two scratch registers that never survive past the instruction that
//! borrowed them.
//!
//! This is the simplest allocator that is still correct: every virtual
//! register gets its own slot for the whole function, nothing is ever kept
//! live in a physical register across instructions. A linear-scan or
//! graph-coloring pass would keep hot values in registers instead, but nothing
//! upstream of this crate tracks the liveness information such a pass needs.

use faxc_lir::{
    Address, CallTarget, Condition, Function, Instruction, Operand, PhysicalRegister, StackFrame,
    VirtualRegister,
};
use std::collections::HashMap;

/// Scratch registers available to the spill-everything allocator. Both are
/// caller-saved and outside `SystemVAbi::ARG_REGS`, so borrowing them for the
/// span of a single instruction never clobbers a live argument or a
/// callee-saved value the caller expects preserved.
const SCRATCH_A: PhysicalRegister = PhysicalRegister::R10;
const SCRATCH_B: PhysicalRegister = PhysicalRegister::R11;

/// Output of [`eliminate_virtual_registers`]: a physical-register-only
/// instruction stream plus the frame layout the slots were carved from.
pub struct AllocationResult {
    pub instructions: Vec<Instruction>,
    pub frame: StackFrame,
}

pub fn eliminate_virtual_registers(func: &Function) -> AllocationResult {
    let mut alloc = Allocator {
        frame: StackFrame::new(),
        slots: HashMap::new(),
        out: Vec::with_capacity(func.instructions.len()),
    };
    for instr in &func.instructions {
        alloc.lower(instr);
    }
    // `save_callee_regs = true`: functions with calls or eh landing pads
    // need RBX/R12-R15 preserved; a function that doesn't use them still
    // only pays for the push/pop pair emitted around the frame, not for the
    // slot itself (SaveCalleeSaved/RestoreCalleeSaved only emits the
    // registers actually listed on the instruction).
    alloc
        .frame
        .frame_size(0, alloc.slots.len(), true);
    AllocationResult { instructions: alloc.out, frame: alloc.frame }
}

struct Allocator {
    frame: StackFrame,
    slots: HashMap<u32, i32>,
    out: Vec<Instruction>,
}

impl Allocator {
    fn slot_addr(&mut self, vreg: VirtualRegister) -> Address {
        let frame = &mut self.frame;
        let offset = *self
            .slots
            .entry(vreg.id)
            .or_insert_with(|| frame.allocate_spill_slot());
        Address::StackRelative { offset: -offset }
    }

    /// Resolves an operand for reading: virtual registers load through
    /// `scratch`, everything else (immediates, physical registers, memory,
    /// labels) passes through unchanged.
    fn read(&mut self, op: &Operand, scratch: PhysicalRegister) -> Operand {
        match op {
            Operand::Reg(v) => {
                let addr = self.slot_addr(*v);
                self.out.push(Instruction::Mov {
                    dest: Operand::PhysReg(scratch),
                    src: Operand::Mem(addr),
                });
                Operand::PhysReg(scratch)
            }
            other => other.clone(),
        }
    }

    /// Resolves a write-only destination: a virtual register becomes its
    /// stack slot directly (no prior load needed since nothing reads the old
    /// value), anything else passes through.
    fn write_only_dest(&mut self, op: &Operand) -> Operand {
        match op {
            Operand::Reg(v) => Operand::Mem(self.slot_addr(*v)),
            other => other.clone(),
        }
    }

    /// Emits a read-modify-write sequence for `dest`/`src`, building the
    /// physical-only instruction via `build`. `dest` is loaded into
    /// `SCRATCH_A` first (if it's a virtual register) and stored back after.
    fn rmw(
        &mut self,
        dest: &Operand,
        src: &Operand,
        build: impl FnOnce(Operand, Operand) -> Instruction,
    ) {
        let src_resolved = self.read(src, SCRATCH_B);
        match dest {
            Operand::Reg(v) => {
                let addr = self.slot_addr(*v);
                self.out.push(Instruction::Mov {
                    dest: Operand::PhysReg(SCRATCH_A),
                    src: Operand::Mem(addr.clone()),
                });
                self.out
                    .push(build(Operand::PhysReg(SCRATCH_A), src_resolved));
                self.out.push(Instruction::Mov {
                    dest: Operand::Mem(addr),
                    src: Operand::PhysReg(SCRATCH_A),
                });
            }
            other => self.out.push(build(other.clone(), src_resolved)),
        }
    }

    /// Emits a read-modify-write sequence for a single-operand instruction
    /// (`Neg`, `Not`, `Inc`, `Dec`).
    fn rmw1(&mut self, dest: &Operand, build: impl FnOnce(Operand) -> Instruction) {
        match dest {
            Operand::Reg(v) => {
                let addr = self.slot_addr(*v);
                self.out.push(Instruction::Mov {
                    dest: Operand::PhysReg(SCRATCH_A),
                    src: Operand::Mem(addr.clone()),
                });
                self.out.push(build(Operand::PhysReg(SCRATCH_A)));
                self.out.push(Instruction::Mov {
                    dest: Operand::Mem(addr),
                    src: Operand::PhysReg(SCRATCH_A),
                });
            }
            other => self.out.push(build(other.clone())),
        }
    }

    fn lower(&mut self, instr: &Instruction) {
        match instr {
            Instruction::Nop => self.out.push(Instruction::Nop),

            Instruction::Mov { dest, src } => {
                let src = self.read(src, SCRATCH_A);
                let dest = self.write_only_dest(dest);
                self.out.push(Instruction::Mov { dest, src });
            }
            Instruction::Movsx { dest, src, sign_extend } => {
                let src = self.read(src, SCRATCH_A);
                let dest = self.write_only_dest(dest);
                self.out.push(Instruction::Movsx { dest, src, sign_extend: *sign_extend });
            }
            Instruction::Movzx { dest, src } => {
                let src = self.read(src, SCRATCH_A);
                let dest = self.write_only_dest(dest);
                self.out.push(Instruction::Movzx { dest, src });
            }
            Instruction::Lea { dest, addr } => {
                let dest = self.write_only_dest(dest);
                self.out.push(Instruction::Lea { dest, addr: addr.clone() });
            }
            Instruction::Push { src } => {
                let src = self.read(src, SCRATCH_A);
                self.out.push(Instruction::Push { src });
            }
            Instruction::Pop { dest } => {
                let dest = self.write_only_dest(dest);
                self.out.push(Instruction::Pop { dest });
            }
            Instruction::Xchg { dest, src } => {
                // Both operands are read and written; round-trip both
                // through scratch registers and swap there.
                let (dest_addr, dest_val) = match dest {
                    Operand::Reg(v) => {
                        let addr = self.slot_addr(*v);
                        self.out.push(Instruction::Mov { dest: Operand::PhysReg(SCRATCH_A), src: Operand::Mem(addr.clone()) });
                        (Some(addr), Operand::PhysReg(SCRATCH_A))
                    }
                    other => (None, other.clone()),
                };
                let src_resolved = self.read(src, SCRATCH_B);
                self.out.push(Instruction::Xchg { dest: dest_val.clone(), src: src_resolved });
                if let Some(addr) = dest_addr {
                    self.out.push(Instruction::Mov { dest: Operand::Mem(addr), src: dest_val });
                }
            }
            Instruction::Cmov { cond, dest, src } => {
                let src = self.read(src, SCRATCH_B);
                self.rmw(dest, &src, |d, s| Instruction::Cmov { cond: *cond, dest: d, src: s })
            }

            Instruction::Load { dest, addr, width } => {
                let dest = self.write_only_dest(dest);
                self.out.push(Instruction::Load { dest, addr: addr.clone(), width: *width });
            }
            Instruction::Store { addr, src, width } => {
                let src = self.read(src, SCRATCH_A);
                self.out.push(Instruction::Store { addr: addr.clone(), src, width: *width });
            }

            Instruction::Add { dest, src } => self.rmw(dest, src, |d, s| Instruction::Add { dest: d, src: s }),
            Instruction::Sub { dest, src } => self.rmw(dest, src, |d, s| Instruction::Sub { dest: d, src: s }),
            Instruction::And { dest, src } => self.rmw(dest, src, |d, s| Instruction::And { dest: d, src: s }),
            Instruction::Or { dest, src } => self.rmw(dest, src, |d, s| Instruction::Or { dest: d, src: s }),
            Instruction::Xor { dest, src } => self.rmw(dest, src, |d, s| Instruction::Xor { dest: d, src: s }),
            Instruction::Mul { dest, src, signed } => {
                self.rmw(dest, src, |d, s| Instruction::Mul { dest: d, src: s, signed: *signed })
            }
            Instruction::Idiv { dest, src } => self.rmw(dest, src, |d, s| Instruction::Idiv { dest: d, src: s }),
            Instruction::IdivUnsigned { dest, src } => {
                self.rmw(dest, src, |d, s| Instruction::IdivUnsigned { dest: d, src: s })
            }
            Instruction::Imul { dest, src1, src2 } => {
                let src1 = self.read(src1, SCRATCH_A);
                let src2 = match src2 {
                    Some(s) => Some(self.read(s, SCRATCH_B)),
                    None => None,
                };
                let dest = self.write_only_dest(dest);
                self.out.push(Instruction::Imul { dest, src1, src2 });
            }
            Instruction::Inc { dest } => self.rmw1(dest, |d| Instruction::Inc { dest: d }),
            Instruction::Dec { dest } => self.rmw1(dest, |d| Instruction::Dec { dest: d }),
            Instruction::Neg { dest } => self.rmw1(dest, |d| Instruction::Neg { dest: d }),
            Instruction::Not { dest } => self.rmw1(dest, |d| Instruction::Not { dest: d }),

            Instruction::Div { divisor } => {
                let divisor = self.read(divisor, SCRATCH_A);
                self.out.push(Instruction::Div { divisor });
            }
            Instruction::IdivSigned { divisor } => {
                let divisor = self.read(divisor, SCRATCH_A);
                self.out.push(Instruction::IdivSigned { divisor });
            }

            Instruction::Shl { dest, count } => self.rmw(dest, count, |d, c| Instruction::Shl { dest: d, count: c }),
            Instruction::Shr { dest, count } => self.rmw(dest, count, |d, c| Instruction::Shr { dest: d, count: c }),
            Instruction::Sar { dest, count } => self.rmw(dest, count, |d, c| Instruction::Sar { dest: d, count: c }),
            Instruction::Rol { dest, count } => self.rmw(dest, count, |d, c| Instruction::Rol { dest: d, count: c }),
            Instruction::Ror { dest, count } => self.rmw(dest, count, |d, c| Instruction::Ror { dest: d, count: c }),

            Instruction::Cmp { src1, src2 } => {
                let src1 = self.read(src1, SCRATCH_A);
                let src2 = self.read(src2, SCRATCH_B);
                self.out.push(Instruction::Cmp { src1, src2 });
            }
            Instruction::Test { src1, src2 } => {
                let src1 = self.read(src1, SCRATCH_A);
                let src2 = self.read(src2, SCRATCH_B);
                self.out.push(Instruction::Test { src1, src2 });
            }

            Instruction::Jmp { target } => self.out.push(Instruction::Jmp { target: target.clone() }),
            Instruction::Jcc { cond, target } => {
                self.out.push(Instruction::Jcc { cond: *cond, target: target.clone() })
            }
            Instruction::Call { target } => {
                let target = match target {
                    CallTarget::Indirect(op) => CallTarget::Indirect(self.read(op, SCRATCH_A)),
                    other => other.clone(),
                };
                self.out.push(Instruction::Call { target });
            }
            Instruction::Ret { value } => {
                if let Some(v) = value {
                    let resolved = self.read(v, SCRATCH_A);
                    self.out.push(Instruction::Mov {
                        dest: Operand::PhysReg(PhysicalRegister::RAX),
                        src: resolved,
                    });
                }
                self.out.push(Instruction::Ret { value: None });
            }
            Instruction::Label { name } => self.out.push(Instruction::Label { name: name.clone() }),

            Instruction::EnterFrame { .. } => {
                // The frame size placed here by the lowering pass predates
                // knowing how many spill slots this allocator would need;
                // `encoder.rs` re-emits the prologue itself from
                // `AllocationResult::frame` instead of trusting this value.
            }
            Instruction::LeaveFrame => self.out.push(Instruction::LeaveFrame),
            Instruction::Alloca { dest, size } => {
                let size = self.read(size, SCRATCH_A);
                let dest = self.write_only_dest(dest);
                self.out.push(Instruction::Alloca { dest, size });
            }

            Instruction::SaveCalleeSaved { regs } => {
                self.out.push(Instruction::SaveCalleeSaved { regs: regs.clone() })
            }
            Instruction::RestoreCalleeSaved { regs } => {
                self.out.push(Instruction::RestoreCalleeSaved { regs: regs.clone() })
            }
        }
    }
}

/// Condition a caller can pass straight through to the encoder; re-exported
/// here so `encoder.rs` doesn't need a second `use faxc_lir::Condition`.
pub type Cond = Condition;

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_lir::{Function, VirtualRegister};
    use faxc_util::{Symbol, StringTable};

    fn reg(id: u32) -> VirtualRegister {
        VirtualRegister::new(id)
    }

    #[test]
    fn every_virtual_register_gets_its_own_slot() {
        let mut table = StringTable::new();
        let mut func = Function::new(Symbol::from_u32(table.intern("f")));
        func.instructions.push(Instruction::Mov { dest: Operand::Reg(reg(0)), src: Operand::Imm(1) });
        func.instructions.push(Instruction::Add { dest: Operand::Reg(reg(0)), src: Operand::Reg(reg(0)) });
        func.instructions.push(Instruction::Ret { value: Some(Operand::Reg(reg(0))) });

        let result = eliminate_virtual_registers(&func);
        assert!(result.instructions.iter().all(|i| !references_virtual_register(i)));
        assert!(result.frame.frame_size > 0);
    }

    #[test]
    fn call_through_a_virtual_register_resolves_to_a_physical_register() {
        let mut table = StringTable::new();
        let mut func = Function::new(Symbol::from_u32(table.intern("f")));
        func.instructions.push(Instruction::Mov { dest: Operand::Reg(reg(0)), src: Operand::Imm(0) });
        func.instructions.push(Instruction::Call { target: CallTarget::Indirect(Operand::Reg(reg(0))) });

        let result = eliminate_virtual_registers(&func);
        assert!(result.instructions.iter().any(|i| matches!(
            i,
            Instruction::Call { target: CallTarget::Indirect(Operand::PhysReg(_)) }
        )));
    }

    fn references_virtual_register(instr: &Instruction) -> bool {
        fn op_is_virtual(op: &Operand) -> bool {
            matches!(op, Operand::Reg(_))
        }
        match instr {
            Instruction::Mov { dest, src } => op_is_virtual(dest) || op_is_virtual(src),
            Instruction::Add { dest, src } => op_is_virtual(dest) || op_is_virtual(src),
            Instruction::Ret { value: Some(v) } => op_is_virtual(v),
            _ => false,
        }
    }
}
