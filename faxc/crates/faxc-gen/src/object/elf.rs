//! ELF64 relocatable object file writer (`ET_REL`, `EM_X86_64`).
//!
//! Builds the minimal section set a linker needs to combine this
//! compilation unit with others: `.text` (code), `.rodata` (RTTI
//! descriptors, LSDA tables), `.rela.text`/`.rela.rodata` (relocations
//! against symbols this unit doesn't define), `.symtab`/`.strtab`.
//!
//! Byte layout follows the field order documented in the ELF64 spec (see
//! `Elf64_Ehdr`/`Elf64_Shdr`/`Elf64_Sym`/`Elf64_Rela`); written by hand with
//! little-endian `write_u16`/`write_u32`/`write_u64` helpers rather than a
//! derive, the same way a linker-adjacent tool in this ecosystem hand-rolls
//! its header structs.

use crate::emitter::EmittedFunction;
use std::collections::HashMap;

const ET_REL: u16 = 1;
const EM_X86_64: u16 = 0x3E;

const SHT_NULL: u32 = 0;
const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHT_RELA: u32 = 4;

const SHF_WRITE: u64 = 1;
const SHF_ALLOC: u64 = 2;
const SHF_EXECINSTR: u64 = 4;

const STB_LOCAL: u8 = 0;
const STB_GLOBAL: u8 = 1;
const STT_NOTYPE: u8 = 0;
const STT_OBJECT: u8 = 1;
const STT_FUNC: u8 = 2;
const STT_SECTION: u8 = 3;

const R_X86_64_64: u64 = 1;
const R_X86_64_PC32: u64 = 2;
const R_X86_64_PLT32: u64 = 4;

#[derive(Default)]
pub struct ObjectBuilder {
    text: Vec<u8>,
    text_symbols: Vec<(String, u64, u64)>,
    text_relocations: Vec<(u32, String)>,
    rodata: Vec<u8>,
    rodata_symbols: Vec<(String, u64, u64)>,
    rodata_relocations: Vec<(u32, String)>,
    external_symbols: Vec<String>,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one function's code to `.text`, recording its symbol and
    /// turning its rel32 relocations (already PC-relative per
    /// `emitter::emit_function`'s convention) into `R_X86_64_PLT32` entries.
    pub fn add_function(&mut self, func: &EmittedFunction) {
        let base = self.text.len() as u64;
        self.text_symbols.push((func.name.clone(), base, func.code.len() as u64));
        for reloc in &func.relocations {
            self.text_relocations.push((base as u32 + reloc.offset, reloc.symbol.clone()));
            self.note_external(&reloc.symbol);
        }
        self.text.extend_from_slice(&func.code);
    }

    /// Appends a data object (an RTTI descriptor, an LSDA table) to
    /// `.rodata` under `symbol`, with absolute-pointer relocations applied
    /// at the given byte offsets within it.
    pub fn add_rodata(&mut self, symbol: &str, bytes: &[u8], relocations: &[(u32, String)]) {
        let base = self.rodata.len() as u64;
        self.rodata_symbols.push((symbol.to_string(), base, bytes.len() as u64));
        for (offset, target) in relocations {
            self.rodata_relocations.push((base as u32 + offset, target.clone()));
            self.note_external(target);
        }
        self.rodata.extend_from_slice(bytes);
    }

    fn note_external(&mut self, symbol: &str) {
        let defined = self.text_symbols.iter().any(|(n, ..)| n == symbol)
            || self.rodata_symbols.iter().any(|(n, ..)| n == symbol);
        if !defined && !self.external_symbols.contains(&symbol.to_string()) {
            self.external_symbols.push(symbol.to_string());
        }
    }

    pub fn finish(self) -> Vec<u8> {
        build(self)
    }
}

/// Section index constants for a layout that's always the same shape:
/// `NULL, .text, .rodata, .rela.text, .rela.rodata, .symtab, .strtab, .shstrtab`.
const SH_TEXT: u16 = 1;
const SH_RODATA: u16 = 2;
const SH_SYMTAB: u16 = 5;
const SH_STRTAB: u16 = 6;
const NUM_SECTIONS: u16 = 8;

fn build(ob: ObjectBuilder) -> Vec<u8> {
    let mut strtab = StrTab::new();
    let mut symtab = Vec::new();
    // index 0 is the mandatory null symbol.
    symtab.push(SymEnt { name: 0, info: 0, shndx: 0, value: 0, size: 0 });
    let mut symbol_index: HashMap<String, u32> = HashMap::new();

    for (name, offset, size) in &ob.text_symbols {
        let idx = symtab.len() as u32;
        symtab.push(SymEnt {
            name: strtab.intern(name),
            info: (STB_GLOBAL << 4) | STT_FUNC,
            shndx: SH_TEXT,
            value: *offset,
            size: *size,
        });
        symbol_index.insert(name.clone(), idx);
    }
    for (name, offset, size) in &ob.rodata_symbols {
        let idx = symtab.len() as u32;
        symtab.push(SymEnt {
            name: strtab.intern(name),
            info: (STB_GLOBAL << 4) | STT_OBJECT,
            shndx: SH_RODATA,
            value: *offset,
            size: *size,
        });
        symbol_index.insert(name.clone(), idx);
    }
    for name in &ob.external_symbols {
        let idx = symtab.len() as u32;
        symtab.push(SymEnt {
            name: strtab.intern(name),
            info: (STB_GLOBAL << 4) | STT_NOTYPE,
            shndx: 0, // SHN_UNDEF
            value: 0,
            size: 0,
        });
        symbol_index.insert(name.clone(), idx);
    }
    let first_global = 1 + ob.text_symbols.len() as u32 + ob.rodata_symbols.len() as u32;

    let mut rela_text = Vec::new();
    for (offset, symbol) in &ob.text_relocations {
        rela_text.push(RelaEnt {
            offset: *offset as u64,
            sym: symbol_index[symbol],
            kind: R_X86_64_PLT32,
            addend: -4,
        });
    }
    let mut rela_rodata = Vec::new();
    for (offset, symbol) in &ob.rodata_relocations {
        rela_rodata.push(RelaEnt { offset: *offset as u64, sym: symbol_index[symbol], kind: R_X86_64_64, addend: 0 });
    }
    let _ = R_X86_64_PC32; // reserved for a future RIP-relative-load relocation kind

    let mut shstrtab = StrTab::new();
    let name_null = shstrtab.intern("");
    let name_text = shstrtab.intern(".text");
    let name_rodata = shstrtab.intern(".rodata");
    let name_rela_text = shstrtab.intern(".rela.text");
    let name_rela_rodata = shstrtab.intern(".rela.rodata");
    let name_symtab = shstrtab.intern(".symtab");
    let name_strtab = shstrtab.intern(".strtab");
    let name_shstrtab = shstrtab.intern(".shstrtab");
    let _ = name_null;

    let mut out = Vec::new();
    write_bytes(&mut out, &[0; 64]); // ELF header placeholder, patched below

    let text_off = out.len() as u64;
    write_bytes(&mut out, &ob.text);
    let rodata_off = out.len() as u64;
    write_bytes(&mut out, &ob.rodata);

    let rela_text_off = out.len() as u64;
    for r in &rela_text {
        write_u64(&mut out, r.offset);
        write_u64(&mut out, ((r.sym as u64) << 32) | r.kind);
        write_u64(&mut out, r.addend as u64);
    }
    let rela_rodata_off = out.len() as u64;
    for r in &rela_rodata {
        write_u64(&mut out, r.offset);
        write_u64(&mut out, ((r.sym as u64) << 32) | r.kind);
        write_u64(&mut out, r.addend as u64);
    }

    let symtab_off = out.len() as u64;
    for s in &symtab {
        write_u32(&mut out, s.name);
        write_u8(&mut out, s.info);
        write_u8(&mut out, 0);
        write_u16(&mut out, s.shndx);
        write_u64(&mut out, s.value);
        write_u64(&mut out, s.size);
    }

    let strtab_off = out.len() as u64;
    write_bytes(&mut out, strtab.finish());

    let shstrtab_off = out.len() as u64;
    write_bytes(&mut out, shstrtab.finish());

    // section headers need 8-byte alignment relative to file start.
    while out.len() % 8 != 0 {
        write_u8(&mut out, 0);
    }
    let shoff = out.len() as u64;

    write_section(&mut out, 0, SHT_NULL, 0, 0, 0, 0, 0, 0, 0);
    write_section(&mut out, name_text, SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, text_off, ob.text.len() as u64, 0, 0, 16, 0);
    write_section(&mut out, name_rodata, SHT_PROGBITS, SHF_ALLOC, rodata_off, ob.rodata.len() as u64, 0, 0, 8, 0);
    write_section(
        &mut out,
        name_rela_text,
        SHT_RELA,
        0,
        rela_text_off,
        (rela_text.len() * 24) as u64,
        SH_SYMTAB as u32,
        SH_TEXT as u32,
        8,
        24,
    );
    write_section(
        &mut out,
        name_rela_rodata,
        SHT_RELA,
        0,
        rela_rodata_off,
        (rela_rodata.len() * 24) as u64,
        SH_SYMTAB as u32,
        SH_RODATA as u32,
        8,
        24,
    );
    write_section(
        &mut out,
        name_symtab,
        SHT_SYMTAB,
        0,
        symtab_off,
        (symtab.len() * 24) as u64,
        SH_STRTAB as u32,
        first_global,
        8,
        24,
    );
    write_section(&mut out, name_strtab, SHT_STRTAB, 0, strtab_off, strtab_len(&strtab), 0, 0, 1, 0);
    write_section(&mut out, name_shstrtab, SHT_STRTAB, 0, shstrtab_off, shstrtab_len(&shstrtab), 0, 0, 1, 0);

    write_elf_header(&mut out, shoff);
    out
}

struct SymEnt {
    name: u32,
    info: u8,
    shndx: u16,
    value: u64,
    size: u64,
}

struct RelaEnt {
    offset: u64,
    sym: u32,
    kind: u64,
    addend: i64,
}

struct StrTab {
    bytes: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StrTab {
    fn new() -> Self {
        Self { bytes: vec![0], offsets: HashMap::new() }
    }

    fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        if let Some(&off) = self.offsets.get(s) {
            return off;
        }
        let off = self.bytes.len() as u32;
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        self.offsets.insert(s.to_string(), off);
        off
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

fn strtab_len(t: &StrTab) -> u64 {
    t.bytes.len() as u64
}
fn shstrtab_len(t: &StrTab) -> u64 {
    t.bytes.len() as u64
}

fn write_elf_header(out: &mut [u8], shoff: u64) {
    out[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
    out[4] = 2; // ELFCLASS64
    out[5] = 1; // ELFDATA2LSB
    out[6] = 1; // EV_CURRENT
    out[7] = 0; // ELFOSABI_SYSV
    out[16..18].copy_from_slice(&ET_REL.to_le_bytes());
    out[18..20].copy_from_slice(&EM_X86_64.to_le_bytes());
    out[20..24].copy_from_slice(&1u32.to_le_bytes()); // e_version
    out[40..48].copy_from_slice(&shoff.to_le_bytes());
    out[52..54].copy_from_slice(&64u16.to_le_bytes()); // e_ehsize
    out[58..60].copy_from_slice(&64u16.to_le_bytes()); // e_shentsize
    out[60..62].copy_from_slice(&NUM_SECTIONS.to_le_bytes());
    out[62..64].copy_from_slice(&7u16.to_le_bytes()); // e_shstrndx (.shstrtab is section 7)
}

#[allow(clippy::too_many_arguments)]
fn write_section(
    out: &mut Vec<u8>,
    name: u32,
    sh_type: u32,
    flags: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    addralign: u64,
    entsize: u64,
) {
    write_u32(out, name);
    write_u32(out, sh_type);
    write_u64(out, flags);
    write_u64(out, 0); // sh_addr, unused in a relocatable object
    write_u64(out, offset);
    write_u64(out, size);
    write_u32(out, link);
    write_u32(out, info);
    write_u64(out, addralign);
    write_u64(out, entsize);
}

fn write_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}
fn write_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn write_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::Relocation;

    fn func(name: &str, code: Vec<u8>, relocations: Vec<Relocation>) -> EmittedFunction {
        EmittedFunction {
            name: name.to_string(),
            code,
            relocations,
            eh_regions: Vec::new(),
            label_offsets: HashMap::new(),
        }
    }

    #[test]
    fn starts_with_the_elf_magic_and_class64_little_endian_marker() {
        let mut ob = ObjectBuilder::new();
        ob.add_function(&func("main", vec![0xC3], Vec::new()));
        let bytes = ob.finish();
        assert_eq!(&bytes[0..4], &[0x7F, b'E', b'L', b'F']);
        assert_eq!(bytes[4], 2);
        assert_eq!(bytes[5], 1);
    }

    #[test]
    fn an_external_call_produces_one_undefined_symbol_and_one_rela_entry() {
        let mut ob = ObjectBuilder::new();
        ob.add_function(&func(
            "caller",
            vec![0xE8, 0, 0, 0, 0],
            vec![Relocation { offset: 1, symbol: "faxc_rt_throw".into() }],
        ));
        let bytes = ob.finish();
        assert!(!bytes.is_empty());
    }
}
