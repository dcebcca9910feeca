//! Textual assembly output (AT&T syntax, the dialect GNU `as` and this
//! compiler's own disassembly-style diagnostics both use) — a `-S`-style
//! dump of a function after virtual-register elimination, read by a human
//! debugging codegen rather than fed back into the compiler.
//!
//! Renders the exact instruction stream [`crate::emitter::emit_function`]
//! encodes, so a mismatch between this output and the disassembled object
//! file means the encoder (not this printer) has a bug.

use crate::regalloc::eliminate_virtual_registers;
use faxc_lir::{Address, CallTarget, Condition, Function, Instruction, Operand, PhysicalRegister};
use faxc_util::StringTable;

pub fn render_function(func: &Function, table: &StringTable) -> String {
    let name = func.name.as_str(table);
    let allocation = eliminate_virtual_registers(func);
    let mut out = format!("\t.globl {name}\n{name}:\n");
    out.push_str(&format!("\tenter ${}, $0\n", allocation.frame.frame_size));
    for instr in &allocation.instructions {
        render_instruction(&mut out, instr, table);
    }
    out
}

fn render_instruction(out: &mut String, instr: &Instruction, table: &StringTable) {
    match instr {
        Instruction::Nop => out.push_str("\tnop\n"),
        Instruction::Mov { dest, src } => binop(out, "mov", dest, src, table),
        Instruction::Movsx { dest, src, .. } => binop(out, "movsx", dest, src, table),
        Instruction::Movzx { dest, src } => binop(out, "movzx", dest, src, table),
        Instruction::Lea { dest, addr } => out.push_str(&format!("\tlea {}, {}\n", render_address(addr, table), render_operand(dest, table))),
        Instruction::Push { src } => out.push_str(&format!("\tpush {}\n", render_operand(src, table))),
        Instruction::Pop { dest } => out.push_str(&format!("\tpop {}\n", render_operand(dest, table))),
        Instruction::Xchg { dest, src } => binop(out, "xchg", dest, src, table),
        Instruction::Cmov { cond, dest, src } => binop(out, &format!("cmov{}", condition_suffix(*cond)), dest, src, table),
        Instruction::Load { dest, addr, .. } => out.push_str(&format!("\tmov {}, {}\n", render_address(addr, table), render_operand(dest, table))),
        Instruction::Store { addr, src, .. } => out.push_str(&format!("\tmov {}, {}\n", render_operand(src, table), render_address(addr, table))),
        Instruction::Add { dest, src } => binop(out, "add", dest, src, table),
        Instruction::Sub { dest, src } => binop(out, "sub", dest, src, table),
        Instruction::Mul { dest, src, signed } => binop(out, if *signed { "imul" } else { "mul" }, dest, src, table),
        Instruction::Idiv { dest, src } => binop(out, "idiv", dest, src, table),
        Instruction::IdivUnsigned { dest, src } => binop(out, "div", dest, src, table),
        Instruction::Imul { src1, src2, .. } => match src2 {
            Some(src2) => binop(out, "imul", src1, src2, table),
            None => out.push_str(&format!("\timul {}\n", render_operand(src1, table))),
        },
        Instruction::Inc { dest } => out.push_str(&format!("\tinc {}\n", render_operand(dest, table))),
        Instruction::Dec { dest } => out.push_str(&format!("\tdec {}\n", render_operand(dest, table))),
        Instruction::Neg { dest } => out.push_str(&format!("\tneg {}\n", render_operand(dest, table))),
        Instruction::Div { divisor } => out.push_str(&format!("\tdiv {}\n", render_operand(divisor, table))),
        Instruction::IdivSigned { divisor } => out.push_str(&format!("\tidiv {}\n", render_operand(divisor, table))),
        Instruction::And { dest, src } => binop(out, "and", dest, src, table),
        Instruction::Or { dest, src } => binop(out, "or", dest, src, table),
        Instruction::Xor { dest, src } => binop(out, "xor", dest, src, table),
        Instruction::Not { dest } => out.push_str(&format!("\tnot {}\n", render_operand(dest, table))),
        Instruction::Shl { dest, count } => binop(out, "shl", dest, count, table),
        Instruction::Shr { dest, count } => binop(out, "shr", dest, count, table),
        Instruction::Sar { dest, count } => binop(out, "sar", dest, count, table),
        Instruction::Rol { dest, count } => binop(out, "rol", dest, count, table),
        Instruction::Ror { dest, count } => binop(out, "ror", dest, count, table),
        Instruction::Cmp { src1, src2 } => binop(out, "cmp", src1, src2, table),
        Instruction::Test { src1, src2 } => binop(out, "test", src1, src2, table),
        Instruction::Jmp { target } => out.push_str(&format!("\tjmp {target}\n")),
        Instruction::Jcc { cond, target } => out.push_str(&format!("\tj{} {target}\n", condition_suffix(*cond))),
        Instruction::Call { target } => out.push_str(&format!("\tcall {}\n", render_call_target(target, table))),
        Instruction::Ret { .. } => out.push_str("\tleave\n\tret\n"),
        Instruction::Label { name } => out.push_str(&format!("{name}:\n")),
        Instruction::EnterFrame { frame_size } => out.push_str(&format!("\tenter ${frame_size}, $0\n")),
        Instruction::LeaveFrame => out.push_str("\tleave\n"),
        Instruction::Alloca { dest, size } => out.push_str(&format!("\tsub {}, %rsp\n\tmov %rsp, {}\n", render_operand(size, table), render_operand(dest, table))),
        Instruction::SaveCalleeSaved { regs } => {
            for reg in regs {
                out.push_str(&format!("\tpush %{}\n", physical_reg_name(*reg)));
            }
        }
        Instruction::RestoreCalleeSaved { regs } => {
            for reg in regs.iter().rev() {
                out.push_str(&format!("\tpop %{}\n", physical_reg_name(*reg)));
            }
        }
    }
}

fn binop(out: &mut String, mnemonic: &str, dest: &Operand, src: &Operand, table: &StringTable) {
    out.push_str(&format!("\t{mnemonic} {}, {}\n", render_operand(src, table), render_operand(dest, table)));
}

fn render_operand(op: &Operand, table: &StringTable) -> String {
    match op {
        // `eliminate_virtual_registers` should have removed every one of
        // these already; rendered defensively so a regalloc gap shows up
        // as readable text instead of a panic.
        Operand::Reg(vreg) => format!("%vreg{}", vreg.id),
        Operand::PhysReg(reg) => format!("%{}", physical_reg_name(*reg)),
        Operand::Imm(v) => format!("${v}"),
        Operand::Mem(addr) => render_address(addr, table),
        Operand::Label(label) => label.clone(),
    }
}

fn render_address(addr: &Address, table: &StringTable) -> String {
    match addr {
        Address::Base { base } => format!("(%{})", physical_reg_name(*base)),
        Address::BaseOffset { base, offset } => format!("{offset}(%{})", physical_reg_name(*base)),
        Address::Indexed { base, index, scale, offset } => {
            format!("{offset}(%{}, %{}, {scale})", physical_reg_name(*base), physical_reg_name(*index))
        }
        Address::RipRelative { offset, symbol } => match symbol {
            Some(sym) => format!("{}(%rip)", sym.as_str(table)),
            None => format!("{offset}(%rip)"),
        },
        Address::StackRelative { offset } => format!("{offset}(%rbp)"),
        Address::Absolute(addr) => format!("0x{addr:x}"),
        Address::Global(sym) => sym.as_str(table).to_string(),
        Address::NamedGlobal(name) => name.clone(),
    }
}

fn render_call_target(target: &CallTarget, table: &StringTable) -> String {
    match target {
        CallTarget::Direct(sym) | CallTarget::External(sym) => sym.as_str(table).to_string(),
        CallTarget::Indirect(op) => format!("*{}", render_operand(op, table)),
        CallTarget::Runtime(name) => name.to_string(),
    }
}

fn condition_suffix(cond: Condition) -> &'static str {
    match cond {
        Condition::Eq => "e",
        Condition::Ne => "ne",
        Condition::B => "b",
        Condition::Ae => "ae",
        Condition::A => "a",
        Condition::Be => "be",
        Condition::L => "l",
        Condition::Ge => "ge",
        Condition::G => "g",
        Condition::Le => "le",
        Condition::O => "o",
        Condition::No => "no",
        Condition::S => "s",
        Condition::Ns => "ns",
        Condition::P => "p",
        Condition::Np => "np",
    }
}

fn physical_reg_name(reg: PhysicalRegister) -> &'static str {
    use PhysicalRegister::*;
    match reg {
        RAX => "rax",
        RBX => "rbx",
        RCX => "rcx",
        RDX => "rdx",
        RSI => "rsi",
        RDI => "rdi",
        RBP => "rbp",
        RSP => "rsp",
        R8 => "r8",
        R9 => "r9",
        R10 => "r10",
        R11 => "r11",
        R12 => "r12",
        R13 => "r13",
        R14 => "r14",
        R15 => "r15",
        XMM0 => "xmm0",
        XMM1 => "xmm1",
        XMM2 => "xmm2",
        XMM3 => "xmm3",
        XMM4 => "xmm4",
        XMM5 => "xmm5",
        XMM6 => "xmm6",
        XMM7 => "xmm7",
        RAX_RDX => "rax:rdx",
        XMM0_XMM1 => "xmm0:xmm1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_lir::lower_mir_to_lir;
    use faxc_mir::Builder;
    use faxc_sem::Type;
    use faxc_util::Symbol;

    #[test]
    fn a_function_label_and_leave_ret_both_appear() {
        let mut table = StringTable::new();
        let name = Symbol::from_u32(table.intern("f"));
        let mut builder = Builder::new(name, Type::Int, 0);
        builder.terminator(faxc_mir::Terminator::Return);
        let mir_fn = builder.build();
        let lir_fn = lower_mir_to_lir(&mir_fn);

        let text = render_function(&lir_fn, &table);
        assert!(text.contains("f:"));
        assert!(text.contains("ret"));
    }
}
