//! x86-64 instruction encoder
//!
//! Turns a single [`Instruction`] (after [`crate::regalloc`] has removed every
//! virtual register) into its machine code bytes. Byte emission follows the
//! manual `write_u8`/`write_u16`/`write_u32`-into-`Vec<u8>` style used
//! throughout this pack's object-file writers rather than reaching for a
//! bitfield crate — there's no ambient dependency for x86 encoding in this
//! stack, so this module *is* the ambient stack for it.
//!
//! Every GPR operation is encoded 64-bit (`REX.W` set); `Load`/`Store` honor
//! their explicit [`RegisterWidth`] since those are the only opcodes that
//! carry one.

use crate::error::{CodeGenError, Result};
use faxc_lir::{Address, CallTarget, Condition, Instruction, Operand, PhysicalRegister, RegisterWidth};
use faxc_util::StringTable;

/// A fixup the two-pass driver in `emitter.rs` must resolve once it knows
/// either a local label's offset or an external symbol's relocation slot.
#[derive(Debug, Clone)]
pub struct Fixup {
    /// Byte offset of the first byte of the rel32 field to patch.
    pub at: usize,
    pub kind: FixupKind,
}

#[derive(Debug, Clone)]
pub enum FixupKind {
    /// Branch/call to a label defined in this same function (`.Lbb{n}`).
    LocalLabel(String),
    /// Call/lea against a symbol the object writer resolves — emitted as an
    /// `R_X86_64_PLT32`/`R_X86_64_PC32`-style relocation.
    ExternalSymbol(String),
}

/// One encoded instruction: its bytes plus any fixups landing inside them,
/// expressed relative to the start of `bytes` (the caller rebases `at` by
/// the function-wide offset before storing it).
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub fixups: Vec<Fixup>,
}

fn reg_code(reg: PhysicalRegister) -> Result<u8> {
    use PhysicalRegister::*;
    Ok(match reg {
        RAX => 0, RCX => 1, RDX => 2, RBX => 3, RSP => 4, RBP => 5, RSI => 6, RDI => 7,
        R8 => 8, R9 => 9, R10 => 10, R11 => 11, R12 => 12, R13 => 13, R14 => 14, R15 => 15,
        XMM0 => 0, XMM1 => 1, XMM2 => 2, XMM3 => 3, XMM4 => 4, XMM5 => 5, XMM6 => 6, XMM7 => 7,
        RAX_RDX | XMM0_XMM1 => {
            return Err(CodeGenError::UnencodableInstruction(
                "composite register pair has no single encoding".into(),
            ))
        }
    })
}

/// `true` when `reg`'s 4-bit code has its high bit set (R8-R15), needing the
/// corresponding REX extension bit.
fn is_extended(reg: PhysicalRegister) -> bool {
    matches!(
        reg,
        PhysicalRegister::R8
            | PhysicalRegister::R9
            | PhysicalRegister::R10
            | PhysicalRegister::R11
            | PhysicalRegister::R12
            | PhysicalRegister::R13
            | PhysicalRegister::R14
            | PhysicalRegister::R15
    )
}

struct Buf(Vec<u8>);

impl Buf {
    fn new() -> Self {
        Buf(Vec::with_capacity(16))
    }
    fn u8(&mut self, b: u8) {
        self.0.push(b);
    }
    fn bytes(&mut self, b: &[u8]) {
        self.0.extend_from_slice(b);
    }
    fn i32(&mut self, v: i32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }
    fn i64(&mut self, v: i64) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }
    fn len(&self) -> usize {
        self.0.len()
    }

    /// REX prefix: `W` for 64-bit operand size, `R` extends ModRM.reg, `X`
    /// extends SIB.index, `B` extends ModRM.rm or SIB.base. Only emitted
    /// when at least one bit (including W) is set, matching what a real
    /// assembler does for byte-identical output on plain 32-bit forms.
    fn rex(&mut self, w: bool, r: bool, x: bool, b: bool) {
        if w || r || x || b {
            self.u8(0x40 | (w as u8) << 3 | (r as u8) << 2 | (x as u8) << 1 | (b as u8));
        }
    }
}

/// Encodes `reg`/`rm` as a register-direct ModRM byte (mod=11).
fn modrm_direct(reg_field: u8, rm_field: u8) -> u8 {
    0xC0 | ((reg_field & 7) << 3) | (rm_field & 7)
}

/// Appends the ModRM (+ SIB + displacement) bytes addressing `addr`, with
/// `reg_field` in the ModRM.reg slot (an opcode extension or a real
/// register). Returns the REX.X/REX.B bits the caller must fold into the
/// instruction's REX prefix, and any fixup the displacement needs.
fn encode_address(buf: &mut Buf, reg_field: u8, addr: &Address) -> Result<(bool, bool, Option<FixupKind>)> {
    match addr {
        Address::Base { base } => {
            let b = reg_code(*base)?;
            if b & 7 == 5 {
                // RBP/R13 as a bare base needs an explicit disp8=0; mod=00
                // with rm=101 means RIP-relative instead.
                buf.u8(0x40 | ((reg_field & 7) << 3) | (b & 7));
                buf.u8(0);
            } else if b & 7 == 4 {
                buf.u8(((reg_field & 7) << 3) | (b & 7));
                buf.u8(0x24); // SIB: scale=00 index=100(none) base=RSP/R12
            } else {
                buf.u8(((reg_field & 7) << 3) | (b & 7));
            }
            Ok((false, is_extended(*base), None))
        }
        Address::BaseOffset { base, offset } => {
            let b = reg_code(*base)?;
            let short = *offset >= -128 && *offset <= 127;
            let mode = if short { 0x40 } else { 0x80 };
            buf.u8(mode | ((reg_field & 7) << 3) | (b & 7));
            if b & 7 == 4 {
                buf.u8(0x24);
            }
            if short {
                buf.u8(*offset as i8 as u8);
            } else {
                buf.i32(*offset);
            }
            Ok((false, is_extended(*base), None))
        }
        Address::StackRelative { offset } => {
            encode_address(buf, reg_field, &Address::BaseOffset { base: PhysicalRegister::RBP, offset: *offset })
        }
        Address::Indexed { base, index, scale, offset } => {
            let b = reg_code(*base)?;
            let i = reg_code(*index)?;
            let short = *offset >= -128 && *offset <= 127;
            let mode = if short { 0x40 } else { 0x80 };
            buf.u8(mode | ((reg_field & 7) << 3) | 0x04);
            let scale_bits = match scale {
                1 => 0u8,
                2 => 1,
                4 => 2,
                8 => 3,
                other => {
                    return Err(CodeGenError::UnencodableInstruction(format!(
                        "invalid SIB scale {other}"
                    )))
                }
            };
            buf.u8((scale_bits << 6) | ((i & 7) << 3) | (b & 7));
            if short {
                buf.u8(*offset as i8 as u8);
            } else {
                buf.i32(*offset);
            }
            Ok((is_extended(*index), is_extended(*base), None))
        }
        Address::RipRelative { offset, symbol: _ } => {
            // No current lowering path produces this variant with a symbol
            // attached (`Global`/`NamedGlobal` carry compile-unit symbols
            // instead); a bare numeric offset is all this needs to support.
            buf.u8(((reg_field & 7) << 3) | 0x05);
            buf.i32(*offset);
            Ok((false, false, None))
        }
        Address::Absolute(addr) => {
            // No base register: mod=00, rm=100, SIB disp32-only form.
            buf.u8(((reg_field & 7) << 3) | 0x04);
            buf.u8(0x25);
            buf.i32(*addr as i32);
            Ok((false, false, None))
        }
        Address::NamedGlobal(_) => {
            // Data this compilation unit owns: address it RIP-relative and
            // let the object writer's relocation entry fill in the real
            // displacement once section layout is known.
            buf.u8(((reg_field & 7) << 3) | 0x05);
            buf.i32(0);
            Ok((false, false, None))
        }
        Address::Global(_) => {
            // No lowering path constructs this variant yet (`Symbol`-named
            // globals would need a `StringTable` threaded into the encoder
            // to turn the symbol back into a name); `NamedGlobal` covers
            // every compiler-synthesized global in use today.
            Err(CodeGenError::UnencodableInstruction(
                "Address::Global is not wired to a symbol table yet; use NamedGlobal".into(),
            ))
        }
    }
}

fn symbol_name_of(addr: &Address) -> Option<String> {
    match addr {
        Address::NamedGlobal(s) => Some(s.clone()),
        Address::Global(_) => None, // resolved by the caller via its StringTable
        _ => None,
    }
}

struct Enc {
    buf: Buf,
    fixups: Vec<Fixup>,
}

impl Enc {
    fn new() -> Self {
        Enc { buf: Buf::new(), fixups: Vec::new() }
    }

    /// REX must precede the opcode byte, but whether REX.X/REX.B are needed
    /// depends on the addressing bytes that come *after* the opcode. Probe
    /// them into a scratch buffer first so the REX prefix can be emitted (by
    /// the caller, via [`Enc::rex_for_mem`]) before the opcode is written.
    fn address_rex_bits(addr: &Address) -> Result<(bool, bool)> {
        let mut probe = Buf::new();
        let (x, b, _fixup) = encode_address(&mut probe, 0, addr)?;
        Ok((x, b))
    }

    /// Writes the ModRM/SIB/displacement bytes addressing `addr` with
    /// `reg_field` in the ModRM.reg slot. Call after the opcode (and any
    /// REX prefix) have already been written.
    fn mem_op(&mut self, reg_field: u8, addr: &Address, _rex_w: bool) -> Result<()> {
        let (_, _, _) = encode_address(&mut self.buf, reg_field & 7, addr)?;
        if let Some(name) = symbol_name_of(addr) {
            // The disp32 field for a NamedGlobal/Global RIP-relative operand
            // is always the last 4 bytes `encode_address` just wrote.
            let at = self.buf.len() - 4;
            self.fixups.push(Fixup { at, kind: FixupKind::ExternalSymbol(name) });
        }
        Ok(())
    }

    /// Emits the REX prefix for an opcode whose ModRM.reg is `reg_field` and
    /// whose ModRM/SIB addresses `addr`. Must be called before the opcode
    /// byte(s), with `mem_op` following the opcode.
    fn rex_for_mem(&mut self, reg_field: u8, addr: &Address, rex_w: bool) -> Result<()> {
        let (x, b) = Self::address_rex_bits(addr)?;
        self.buf.rex(rex_w, reg_field > 7, x, b);
        Ok(())
    }

    fn reg_reg(&mut self, opcode: &[u8], reg_field: PhysicalRegister, rm_field: PhysicalRegister, rex_w: bool) -> Result<()> {
        let r = reg_code(reg_field)?;
        let m = reg_code(rm_field)?;
        self.buf.rex(rex_w, is_extended(reg_field), false, is_extended(rm_field));
        self.buf.bytes(opcode);
        self.buf.u8(modrm_direct(r, m));
        Ok(())
    }
}

fn operand_reg(op: &Operand) -> Result<PhysicalRegister> {
    match op {
        Operand::PhysReg(r) => Ok(*r),
        other => Err(CodeGenError::InvalidOperandType(format!(
            "expected a physical register after virtual register elimination, found {other:?}"
        ))),
    }
}

/// Encodes one instruction in isolation. `at` is this instruction's offset
/// within the function, used to turn `Fixup::at` into an absolute position
/// the two-pass driver in `emitter.rs` can patch directly. `table` resolves
/// the `Symbol`s carried by `CallTarget::Direct`/`External` into names for
/// the relocation entries the object writer emits.
pub fn encode_instruction(instr: &Instruction, at: usize, table: &StringTable) -> Result<Encoded> {
    let mut e = Enc::new();
    match instr {
        Instruction::Nop => e.buf.u8(0x90),

        Instruction::Mov { dest, src } => encode_mov(&mut e, dest, src)?,
        Instruction::Movzx { dest, src } => encode_movx(&mut e, dest, src, false)?,
        Instruction::Movsx { dest, src, .. } => encode_movx(&mut e, dest, src, true)?,
        Instruction::Lea { dest, addr } => {
            let r = operand_reg(dest)?;
            e.rex_for_mem(reg_code(r)?, addr, true)?;
            e.buf.u8(0x8D);
            e.mem_op(reg_code(r)?, addr, true)?;
        }
        Instruction::Push { src } => {
            let r = operand_reg(src)?;
            if is_extended(r) {
                e.buf.rex(false, false, false, true);
            }
            e.buf.u8(0x50 + (reg_code(r)? & 7));
        }
        Instruction::Pop { dest } => {
            let r = operand_reg(dest)?;
            if is_extended(r) {
                e.buf.rex(false, false, false, true);
            }
            e.buf.u8(0x58 + (reg_code(r)? & 7));
        }
        Instruction::Xchg { dest, src } => {
            let d = operand_reg(dest)?;
            let s = operand_reg(src)?;
            e.reg_reg(&[0x87], s, d, true)?;
        }
        Instruction::Cmov { cond, dest, src } => {
            let d = operand_reg(dest)?;
            let s = operand_reg(src)?;
            e.reg_reg(&[0x0F, 0x40 + condition_code(*cond)], d, s, true)?;
        }

        Instruction::Load { dest, addr, width } => encode_load(&mut e, dest, addr, *width)?,
        Instruction::Store { addr, src, width } => encode_store(&mut e, addr, src, *width)?,

        Instruction::Add { dest, src } => encode_alu(&mut e, 0x00, dest, src)?,
        Instruction::Or { dest, src } => encode_alu(&mut e, 0x08, dest, src)?,
        Instruction::And { dest, src } => encode_alu(&mut e, 0x20, dest, src)?,
        Instruction::Sub { dest, src } => encode_alu(&mut e, 0x28, dest, src)?,
        Instruction::Xor { dest, src } => encode_alu(&mut e, 0x30, dest, src)?,
        Instruction::Cmp { src1, src2 } => encode_alu(&mut e, 0x38, src1, src2)?,
        Instruction::Test { src1, src2 } => {
            let d = operand_reg(src1)?;
            let s = operand_reg(src2)?;
            e.reg_reg(&[0x85], s, d, true)?;
        }

        Instruction::Mul { dest, src, signed } => {
            let d = operand_reg(dest)?;
            let s = operand_reg(src)?;
            if *signed {
                e.reg_reg(&[0x0F, 0xAF], d, s, true)?;
            } else {
                return Err(CodeGenError::UnencodableInstruction(
                    "unsigned two-operand multiply has no direct x86 form; lower through IdivUnsigned's RDX:RAX convention instead".into(),
                ));
            }
        }
        Instruction::Imul { dest, src1, src2 } => {
            let d = operand_reg(dest)?;
            match src2 {
                Some(s2) => {
                    let s1 = operand_reg(src1)?;
                    let s2v = operand_reg(s2)?;
                    if s1 != d {
                        e.reg_reg(&[0x89], s1, d, true)?; // mov dest, src1
                    }
                    e.reg_reg(&[0x0F, 0xAF], d, s2v, true)?;
                }
                None => {
                    let s1 = operand_reg(src1)?;
                    e.reg_reg(&[0x0F, 0xAF], d, s1, true)?;
                }
            }
        }
        Instruction::Idiv { dest, src } | Instruction::IdivUnsigned { dest, src } => {
            // dest = dest / src via RAX:RDX, result moved back into dest.
            let d = operand_reg(dest)?;
            let s = operand_reg(src)?;
            let signed = matches!(instr, Instruction::Idiv { .. });
            emit_division(&mut e, d, s, signed)?;
        }
        Instruction::Div { divisor } => {
            let s = operand_reg(divisor)?;
            e.buf.rex(true, false, false, is_extended(s));
            e.buf.u8(0xF7);
            e.buf.u8(modrm_direct(6, reg_code(s)?));
        }
        Instruction::IdivSigned { divisor } => {
            let s = operand_reg(divisor)?;
            e.buf.rex(true, false, false, is_extended(s));
            e.buf.u8(0xF7);
            e.buf.u8(modrm_direct(7, reg_code(s)?));
        }
        Instruction::Inc { dest } => encode_unary(&mut e, 0xFF, 0, dest)?,
        Instruction::Dec { dest } => encode_unary(&mut e, 0xFF, 1, dest)?,
        Instruction::Not { dest } => encode_unary(&mut e, 0xF7, 2, dest)?,
        Instruction::Neg { dest } => encode_unary(&mut e, 0xF7, 3, dest)?,

        Instruction::Shl { dest, count } => encode_shift(&mut e, 4, dest, count)?,
        Instruction::Shr { dest, count } => encode_shift(&mut e, 5, dest, count)?,
        Instruction::Sar { dest, count } => encode_shift(&mut e, 7, dest, count)?,
        Instruction::Rol { dest, count } => encode_shift(&mut e, 0, dest, count)?,
        Instruction::Ror { dest, count } => encode_shift(&mut e, 1, dest, count)?,

        Instruction::Jmp { target } => {
            e.buf.u8(0xE9);
            let at_rel = e.buf.len();
            e.buf.i32(0);
            e.fixups.push(Fixup { at: at_rel, kind: FixupKind::LocalLabel(target.clone()) });
        }
        Instruction::Jcc { cond, target } => {
            e.buf.u8(0x0F);
            e.buf.u8(0x80 + condition_code(*cond));
            let at_rel = e.buf.len();
            e.buf.i32(0);
            e.fixups.push(Fixup { at: at_rel, kind: FixupKind::LocalLabel(target.clone()) });
        }
        Instruction::Call { target } => encode_call(&mut e, target, table)?,
        Instruction::Ret { value: None } => e.buf.u8(0xC3),
        Instruction::Ret { value: Some(_) } => {
            return Err(CodeGenError::Internal(
                "Ret with an operand must be lowered to RAX by regalloc before encoding".into(),
            ))
        }
        Instruction::Label { .. } => {}

        Instruction::EnterFrame { frame_size } => {
            e.buf.u8(0x55); // push rbp
            e.buf.rex(true, false, false, false);
            e.buf.u8(0x89);
            e.buf.u8(modrm_direct(reg_code(PhysicalRegister::RSP)?, reg_code(PhysicalRegister::RBP)?)); // mov rbp, rsp
            if *frame_size > 0 {
                e.buf.rex(true, false, false, false);
                e.buf.u8(0x81);
                e.buf.u8(modrm_direct(5, reg_code(PhysicalRegister::RSP)?));
                e.buf.i32(*frame_size as i32);
            }
        }
        Instruction::LeaveFrame => e.buf.u8(0xC9), // leave: mov rsp,rbp; pop rbp

        Instruction::Alloca { dest, size } => {
            // sub rsp, size; mov dest, rsp
            let d = operand_reg(dest)?;
            let s = operand_reg(size)?;
            e.reg_reg(&[0x29], s, PhysicalRegister::RSP, true)?; // sub rsp, size  (0x29 = SUB r/m, reg)
            e.reg_reg(&[0x89], PhysicalRegister::RSP, d, true)?;
        }
        Instruction::SaveCalleeSaved { regs } => {
            for r in regs {
                if is_extended(*r) {
                    e.buf.rex(false, false, false, true);
                }
                e.buf.u8(0x50 + (reg_code(*r)? & 7));
            }
        }
        Instruction::RestoreCalleeSaved { regs } => {
            for r in regs.iter().rev() {
                if is_extended(*r) {
                    e.buf.rex(false, false, false, true);
                }
                e.buf.u8(0x58 + (reg_code(*r)? & 7));
            }
        }
    }

    let fixups = e
        .fixups
        .into_iter()
        .map(|f| Fixup { at: at + f.at, kind: f.kind })
        .collect();
    Ok(Encoded { bytes: e.buf.0, fixups })
}

fn encode_mov(e: &mut Enc, dest: &Operand, src: &Operand) -> Result<()> {
    match (dest, src) {
        (Operand::PhysReg(d), Operand::PhysReg(s)) => e.reg_reg(&[0x89], *s, *d, true),
        (Operand::PhysReg(d), Operand::Imm(imm)) => {
            e.buf.rex(true, false, false, is_extended(*d));
            e.buf.u8(0xB8 + (reg_code(*d)? & 7));
            e.buf.i64(*imm);
            Ok(())
        }
        (Operand::PhysReg(d), Operand::Mem(addr)) => {
            e.rex_for_mem(reg_code(*d)?, addr, true)?;
            e.buf.u8(0x8B);
            e.mem_op(reg_code(*d)?, addr, true)
        }
        (Operand::Mem(addr), Operand::PhysReg(s)) => {
            e.rex_for_mem(reg_code(*s)?, addr, true)?;
            e.buf.u8(0x89);
            e.mem_op(reg_code(*s)?, addr, true)
        }
        (Operand::Mem(addr), Operand::Imm(imm)) => {
            e.rex_for_mem(0, addr, true)?;
            e.buf.u8(0xC7);
            e.mem_op(0, addr, true)?;
            if *imm < i32::MIN as i64 || *imm > i32::MAX as i64 {
                return Err(CodeGenError::UnencodableInstruction(
                    "mov to memory only takes a sign-extended 32-bit immediate".into(),
                ));
            }
            e.buf.i32(*imm as i32);
            Ok(())
        }
        _ => Err(CodeGenError::InvalidOperandType(format!(
            "unsupported mov operand combination: {dest:?} <- {src:?}"
        ))),
    }
}

fn encode_movx(e: &mut Enc, dest: &Operand, src: &Operand, sign_extend: bool) -> Result<()> {
    let d = operand_reg(dest)?;
    let opcode: &[u8] = if sign_extend { &[0x0F, 0xBE] } else { &[0x0F, 0xB6] };
    match src {
        Operand::PhysReg(s) => e.reg_reg(opcode, d, *s, true),
        Operand::Mem(addr) => {
            e.rex_for_mem(reg_code(d)?, addr, true)?;
            e.buf.bytes(opcode);
            e.mem_op(reg_code(d)?, addr, true)
        }
        other => Err(CodeGenError::InvalidOperandType(format!(
            "movzx/movsx source must be a register or memory operand, found {other:?}"
        ))),
    }
}

fn encode_alu(e: &mut Enc, base_opcode: u8, dest: &Operand, src: &Operand) -> Result<()> {
    match (dest, src) {
        (Operand::PhysReg(d), Operand::PhysReg(s)) => e.reg_reg(&[base_opcode + 1], *s, *d, true),
        (Operand::PhysReg(d), Operand::Imm(imm)) => {
            e.buf.rex(true, false, false, is_extended(*d));
            e.buf.u8(0x81);
            e.buf.u8(modrm_direct(base_opcode / 8, reg_code(*d)? & 7));
            if *imm < i32::MIN as i64 || *imm > i32::MAX as i64 {
                return Err(CodeGenError::UnencodableInstruction(
                    "ALU immediate must fit in 32 bits".into(),
                ));
            }
            e.buf.i32(*imm as i32);
            Ok(())
        }
        (Operand::PhysReg(d), Operand::Mem(addr)) => {
            e.rex_for_mem(reg_code(*d)?, addr, true)?;
            e.buf.u8(base_opcode + 3);
            e.mem_op(reg_code(*d)?, addr, true)
        }
        _ => Err(CodeGenError::InvalidOperandType(format!(
            "unsupported ALU operand combination: {dest:?}, {src:?}"
        ))),
    }
}

fn encode_unary(e: &mut Enc, opcode: u8, ext: u8, dest: &Operand) -> Result<()> {
    let d = operand_reg(dest)?;
    e.buf.rex(true, false, false, is_extended(d));
    e.buf.u8(opcode);
    e.buf.u8(modrm_direct(ext, reg_code(d)? & 7));
    Ok(())
}

fn encode_shift(e: &mut Enc, ext: u8, dest: &Operand, count: &Operand) -> Result<()> {
    let d = operand_reg(dest)?;
    match count {
        Operand::Imm(1) => {
            e.buf.rex(true, false, false, is_extended(d));
            e.buf.u8(0xD1);
            e.buf.u8(modrm_direct(ext, reg_code(d)? & 7));
            Ok(())
        }
        Operand::Imm(n) => {
            e.buf.rex(true, false, false, is_extended(d));
            e.buf.u8(0xC1);
            e.buf.u8(modrm_direct(ext, reg_code(d)? & 7));
            e.buf.u8(*n as u8);
            Ok(())
        }
        Operand::PhysReg(PhysicalRegister::RCX) => {
            e.buf.rex(true, false, false, is_extended(d));
            e.buf.u8(0xD3);
            e.buf.u8(modrm_direct(ext, reg_code(d)? & 7));
            Ok(())
        }
        other => Err(CodeGenError::InvalidOperandType(format!(
            "shift count must be an immediate or CL, found {other:?}"
        ))),
    }
}

fn encode_load(e: &mut Enc, dest: &Operand, addr: &Address, width: RegisterWidth) -> Result<()> {
    let d = operand_reg(dest)?;
    match width {
        RegisterWidth::W64 => {
            e.rex_for_mem(reg_code(d)?, addr, true)?;
            e.buf.u8(0x8B);
            e.mem_op(reg_code(d)?, addr, true)
        }
        RegisterWidth::W32 => {
            e.rex_for_mem(reg_code(d)?, addr, false)?;
            e.buf.u8(0x8B);
            e.mem_op(reg_code(d)?, addr, false)
        }
        RegisterWidth::W16 => {
            e.buf.u8(0x66);
            e.rex_for_mem(reg_code(d)?, addr, false)?;
            e.buf.u8(0x8B);
            e.mem_op(reg_code(d)?, addr, false)
        }
        RegisterWidth::W8 => {
            e.rex_for_mem(reg_code(d)?, addr, false)?;
            e.buf.u8(0x8A);
            e.mem_op(reg_code(d)?, addr, false)
        }
    }
}

fn encode_store(e: &mut Enc, addr: &Address, src: &Operand, width: RegisterWidth) -> Result<()> {
    let s = operand_reg(src)?;
    match width {
        RegisterWidth::W64 => {
            e.rex_for_mem(reg_code(s)?, addr, true)?;
            e.buf.u8(0x89);
            e.mem_op(reg_code(s)?, addr, true)
        }
        RegisterWidth::W32 => {
            e.rex_for_mem(reg_code(s)?, addr, false)?;
            e.buf.u8(0x89);
            e.mem_op(reg_code(s)?, addr, false)
        }
        RegisterWidth::W16 => {
            e.buf.u8(0x66);
            e.rex_for_mem(reg_code(s)?, addr, false)?;
            e.buf.u8(0x89);
            e.mem_op(reg_code(s)?, addr, false)
        }
        RegisterWidth::W8 => {
            e.rex_for_mem(reg_code(s)?, addr, false)?;
            e.buf.u8(0x88);
            e.mem_op(reg_code(s)?, addr, false)
        }
    }
}

fn emit_division(e: &mut Enc, dest: PhysicalRegister, src: PhysicalRegister, signed: bool) -> Result<()> {
    // mov rax, dest; cqo (sign) / xor edx,edx (unsigned); idiv/div src; mov dest, rax
    e.reg_reg(&[0x89], dest, PhysicalRegister::RAX, true)?;
    if signed {
        e.buf.rex(true, false, false, false);
        e.buf.u8(0x99); // cqo
    } else {
        e.reg_reg(&[0x31], PhysicalRegister::RDX, PhysicalRegister::RDX, false)?; // xor edx,edx
    }
    e.buf.rex(true, false, false, is_extended(src));
    e.buf.u8(0xF7);
    e.buf.u8(modrm_direct(if signed { 7 } else { 6 }, reg_code(src)? & 7));
    e.reg_reg(&[0x89], PhysicalRegister::RAX, dest, true)?;
    Ok(())
}

fn encode_call(e: &mut Enc, target: &CallTarget, table: &StringTable) -> Result<()> {
    match target {
        CallTarget::Direct(_) | CallTarget::External(_) | CallTarget::Runtime(_) => {
            e.buf.u8(0xE8);
            let at_rel = e.buf.len();
            e.buf.i32(0);
            let name = match target {
                CallTarget::Runtime(n) => n.to_string(),
                CallTarget::Direct(sym) | CallTarget::External(sym) => sym.as_str(table).to_string(),
                CallTarget::Indirect(_) => unreachable!(),
            };
            e.fixups.push(Fixup { at: at_rel, kind: FixupKind::ExternalSymbol(name) });
            Ok(())
        }
        CallTarget::Indirect(op) => {
            let r = operand_reg(op)?;
            if is_extended(r) {
                e.buf.rex(false, false, false, true);
            }
            e.buf.u8(0xFF);
            e.buf.u8(modrm_direct(2, reg_code(r)? & 7));
            Ok(())
        }
    }
}

fn condition_code(cond: Condition) -> u8 {
    match cond {
        Condition::O => 0x0,
        Condition::No => 0x1,
        Condition::B => 0x2,
        Condition::Ae => 0x3,
        Condition::Eq => 0x4,
        Condition::Ne => 0x5,
        Condition::Be => 0x6,
        Condition::A => 0x7,
        Condition::S => 0x8,
        Condition::Ns => 0x9,
        Condition::P => 0xA,
        Condition::Np => 0xB,
        Condition::L => 0xC,
        Condition::Ge => 0xD,
        Condition::Le => 0xE,
        Condition::G => 0xF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::StringTable;

    #[test]
    fn ret_encodes_to_a_single_byte() {
        let table = StringTable::new();
        let enc = encode_instruction(&Instruction::Ret { value: None }, 0, &table).unwrap();
        assert_eq!(enc.bytes, vec![0xC3]);
    }

    #[test]
    fn mov_immediate_into_register_uses_rex_w_and_b8_plus_reg() {
        let table = StringTable::new();
        let enc = encode_instruction(
            &Instruction::Mov { dest: Operand::PhysReg(PhysicalRegister::RAX), src: Operand::Imm(42) },
            0,
            &table,
        )
        .unwrap();
        assert_eq!(&enc.bytes[0..2], &[0x48, 0xB8]);
        assert_eq!(i64::from_le_bytes(enc.bytes[2..10].try_into().unwrap()), 42);
    }

    #[test]
    fn jmp_records_a_local_label_fixup_at_the_right_offset() {
        let table = StringTable::new();
        let enc = encode_instruction(&Instruction::Jmp { target: ".Lbb1".into() }, 100, &table).unwrap();
        assert_eq!(enc.bytes[0], 0xE9);
        assert_eq!(enc.fixups.len(), 1);
        assert_eq!(enc.fixups[0].at, 101);
        assert!(matches!(&enc.fixups[0].kind, FixupKind::LocalLabel(l) if l == ".Lbb1"));
    }

    #[test]
    fn call_to_a_runtime_helper_emits_an_external_fixup() {
        let table = StringTable::new();
        let enc = encode_instruction(&Instruction::Call { target: CallTarget::Runtime("faxc_rt_throw") }, 0, &table).unwrap();
        assert_eq!(enc.bytes[0], 0xE8);
        assert!(matches!(&enc.fixups[0].kind, FixupKind::ExternalSymbol(n) if n == "faxc_rt_throw"));
    }

    #[test]
    fn add_reg_reg_uses_rex_w_and_opcode_01() {
        let table = StringTable::new();
        let enc = encode_instruction(
            &Instruction::Add { dest: Operand::PhysReg(PhysicalRegister::R10), src: Operand::PhysReg(PhysicalRegister::R11) },
            0,
            &table,
        )
        .unwrap();
        // REX.W + REX.R (R11 is the reg field via reg_reg's src/dest swap) + REX.B
        assert_eq!(enc.bytes[0] & 0x48, 0x48);
        assert_eq!(enc.bytes[1], 0x01);
    }
}
