//! PE/COFF relocatable object file writer (`.obj`, `IMAGE_FILE_MACHINE_AMD64`).
//!
//! A `.obj` has no DOS stub or optional header, unlike the PE *image*
//! format (`.exe`/`.dll`) — just the COFF file header, a section table,
//! raw section data, per-section relocation arrays, and a symbol table
//! with its string table tacked on the end. Field layout follows the COFF
//! spec's `IMAGE_FILE_HEADER`/`IMAGE_SECTION_HEADER`/`IMAGE_SYMBOL`/
//! `IMAGE_RELOCATION` structures; written with the same hand-rolled
//! little-endian `write_u16`/`write_u32`-into-`Vec<u8>` style a PE writer in
//! this ecosystem uses for its DOS/PE headers.

use crate::emitter::EmittedFunction;
use std::collections::HashMap;

const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;
const IMAGE_SCN_CNT_CODE: u32 = 0x0000_0020;
const IMAGE_SCN_CNT_INITIALIZED_DATA: u32 = 0x0000_0040;
const IMAGE_SCN_MEM_EXECUTE: u32 = 0x2000_0000;
const IMAGE_SCN_MEM_READ: u32 = 0x4000_0000;
const IMAGE_SCN_MEM_WRITE: u32 = 0x8000_0000;
const IMAGE_SCN_ALIGN_16BYTES: u32 = 0x0050_0000;

const IMAGE_SYM_CLASS_EXTERNAL: u8 = 2;
const IMAGE_SYM_CLASS_STATIC: u8 = 3;
const IMAGE_REL_AMD64_REL32: u16 = 0x0004;
const IMAGE_REL_AMD64_ADDR64: u16 = 0x0001;

#[derive(Default)]
pub struct ObjectBuilder {
    text: Vec<u8>,
    text_symbols: Vec<(String, u32, u32)>,
    text_relocations: Vec<(u32, String)>,
    rdata: Vec<u8>,
    rdata_symbols: Vec<(String, u32, u32)>,
    rdata_relocations: Vec<(u32, String)>,
    external_symbols: Vec<String>,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, func: &EmittedFunction) {
        let base = self.text.len() as u32;
        self.text_symbols.push((func.name.clone(), base, func.code.len() as u32));
        for reloc in &func.relocations {
            self.text_relocations.push((base + reloc.offset, reloc.symbol.clone()));
            self.note_external(&reloc.symbol);
        }
        self.text.extend_from_slice(&func.code);
    }

    pub fn add_rdata(&mut self, symbol: &str, bytes: &[u8], relocations: &[(u32, String)]) {
        let base = self.rdata.len() as u32;
        self.rdata_symbols.push((symbol.to_string(), base, bytes.len() as u32));
        for (offset, target) in relocations {
            self.rdata_relocations.push((base + offset, target.clone()));
            self.note_external(target);
        }
        self.rdata.extend_from_slice(bytes);
    }

    fn note_external(&mut self, symbol: &str) {
        let defined = self.text_symbols.iter().any(|(n, ..)| n == symbol)
            || self.rdata_symbols.iter().any(|(n, ..)| n == symbol);
        if !defined && !self.external_symbols.contains(&symbol.to_string()) {
            self.external_symbols.push(symbol.to_string());
        }
    }

    pub fn finish(self) -> Vec<u8> {
        build(self)
    }
}

/// `.text` is section number 1, `.rdata` section number 2 (COFF section
/// numbers used in relocations/symbols are 1-based).
const SECTION_TEXT: u16 = 1;
const SECTION_RDATA: u16 = 2;

fn build(ob: ObjectBuilder) -> Vec<u8> {
    let mut strings = LongNameTable::new();
    let mut symbols = Vec::new();
    let mut symbol_index: HashMap<String, u32> = HashMap::new();

    for (name, offset, _) in &ob.text_symbols {
        let idx = symbols.len() as u32;
        symbols.push(SymRecord { name: strings.encode(name), section: SECTION_TEXT as i16, value: *offset, external: true });
        symbol_index.insert(name.clone(), idx);
    }
    for (name, offset, _) in &ob.rdata_symbols {
        let idx = symbols.len() as u32;
        symbols.push(SymRecord { name: strings.encode(name), section: SECTION_RDATA as i16, value: *offset, external: true });
        symbol_index.insert(name.clone(), idx);
    }
    for name in &ob.external_symbols {
        let idx = symbols.len() as u32;
        symbols.push(SymRecord { name: strings.encode(name), section: 0, value: 0, external: true });
        symbol_index.insert(name.clone(), idx);
    }

    let mut reloc_text = Vec::new();
    for (offset, symbol) in &ob.text_relocations {
        reloc_text.push((*offset, symbol_index[symbol], IMAGE_REL_AMD64_REL32));
    }
    let mut reloc_rdata = Vec::new();
    for (offset, symbol) in &ob.rdata_relocations {
        reloc_rdata.push((*offset, symbol_index[symbol], IMAGE_REL_AMD64_ADDR64));
    }

    // Layout: COFF file header, 2 section headers, .text data, .text relocations,
    // .rdata data, .rdata relocations, symbol table, string table.
    const FILE_HEADER_SIZE: u32 = 20;
    const SECTION_HEADER_SIZE: u32 = 40;
    const NUM_SECTIONS: u16 = 2;

    let text_ptr = FILE_HEADER_SIZE + (NUM_SECTIONS as u32) * SECTION_HEADER_SIZE;
    let text_reloc_ptr = text_ptr + ob.text.len() as u32;
    let rdata_ptr = text_reloc_ptr + reloc_text.len() as u32 * 10;
    let rdata_reloc_ptr = rdata_ptr + ob.rdata.len() as u32;
    let symtab_ptr = rdata_reloc_ptr + reloc_rdata.len() as u32 * 10;

    let mut out = Vec::new();
    write_u16(&mut out, IMAGE_FILE_MACHINE_AMD64);
    write_u16(&mut out, NUM_SECTIONS);
    write_u32(&mut out, 0); // TimeDateStamp
    write_u32(&mut out, symtab_ptr);
    write_u32(&mut out, symbols.len() as u32);
    write_u16(&mut out, 0); // SizeOfOptionalHeader (0 for an object file)
    write_u16(&mut out, 0); // Characteristics

    write_section_header(
        &mut out,
        b".text\0\0\0",
        ob.text.len() as u32,
        text_ptr,
        reloc_text.len() as u16,
        text_reloc_ptr,
        IMAGE_SCN_CNT_CODE | IMAGE_SCN_MEM_EXECUTE | IMAGE_SCN_MEM_READ | IMAGE_SCN_ALIGN_16BYTES,
    );
    write_section_header(
        &mut out,
        b".rdata\0\0",
        ob.rdata.len() as u32,
        rdata_ptr,
        reloc_rdata.len() as u16,
        rdata_reloc_ptr,
        IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ | IMAGE_SCN_ALIGN_16BYTES,
    );

    write_bytes(&mut out, &ob.text);
    for (offset, sym, kind) in &reloc_text {
        write_u32(&mut out, *offset);
        write_u32(&mut out, *sym);
        write_u16(&mut out, *kind);
    }
    write_bytes(&mut out, &ob.rdata);
    for (offset, sym, kind) in &reloc_rdata {
        write_u32(&mut out, *offset);
        write_u32(&mut out, *sym);
        write_u16(&mut out, *kind);
    }

    for sym in &symbols {
        write_symbol(&mut out, sym);
    }
    write_u32(&mut out, strings.total_size());
    write_bytes(&mut out, &strings.bytes);

    let _ = IMAGE_SCN_MEM_WRITE;
    out
}

struct SymRecord {
    /// `Short` for an 8-byte-or-under name, `Long(offset)` into the string
    /// table otherwise.
    name: NameField,
    section: i16,
    value: u32,
    external: bool,
}

enum NameField {
    Short([u8; 8]),
    Long(u32),
}

struct LongNameTable {
    bytes: Vec<u8>,
}

impl LongNameTable {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn encode(&mut self, name: &str) -> NameField {
        if name.len() <= 8 {
            let mut buf = [0u8; 8];
            buf[..name.len()].copy_from_slice(name.as_bytes());
            return NameField::Short(buf);
        }
        // COFF string table offsets are relative to the table's own start,
        // and its first 4 bytes are its own total size, so real string data
        // begins at offset 4.
        let offset = self.bytes.len() as u32 + 4;
        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);
        NameField::Long(offset)
    }

    fn total_size(&self) -> u32 {
        self.bytes.len() as u32 + 4
    }
}

fn write_symbol(out: &mut Vec<u8>, sym: &SymRecord) {
    match &sym.name {
        NameField::Short(bytes) => write_bytes(out, bytes),
        NameField::Long(offset) => {
            write_u32(out, 0);
            write_u32(out, *offset);
        }
    }
    write_u32(out, sym.value);
    write_u16(out, sym.section as u16);
    write_u16(out, 0); // Type: IMAGE_SYM_TYPE_NULL
    write_u8(out, if sym.external { IMAGE_SYM_CLASS_EXTERNAL } else { IMAGE_SYM_CLASS_STATIC });
    write_u8(out, 0); // NumberOfAuxSymbols
}

fn write_section_header(
    out: &mut Vec<u8>,
    name: &[u8; 8],
    size_of_raw_data: u32,
    pointer_to_raw_data: u32,
    number_of_relocations: u16,
    pointer_to_relocations: u32,
    characteristics: u32,
) {
    write_bytes(out, name);
    write_u32(out, 0); // VirtualSize, meaningless for an object file
    write_u32(out, 0); // VirtualAddress
    write_u32(out, size_of_raw_data);
    write_u32(out, pointer_to_raw_data);
    write_u32(out, pointer_to_relocations);
    write_u32(out, 0); // PointerToLinenumbers, deprecated
    write_u16(out, number_of_relocations);
    write_u16(out, 0); // NumberOfLinenumbers
    write_u32(out, characteristics);
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
    fn the_machine_field_names_amd64() {
        let mut ob = ObjectBuilder::new();
        ob.add_function(&func("main", vec![0xC3], Vec::new()));
        let bytes = ob.finish();
        let machine = u16::from_le_bytes([bytes[0], bytes[1]]);
        assert_eq!(machine, IMAGE_FILE_MACHINE_AMD64);
    }

    #[test]
    fn two_sections_are_always_present() {
        let mut ob = ObjectBuilder::new();
        ob.add_function(&func("main", vec![0xC3], Vec::new()));
        let bytes = ob.finish();
        let num_sections = u16::from_le_bytes([bytes[2], bytes[3]]);
        assert_eq!(num_sections, 2);
    }

    #[test]
    fn a_long_symbol_name_goes_through_the_string_table() {
        let mut ob = ObjectBuilder::new();
        ob.add_function(&func("a_very_long_mangled_function_name", vec![0xC3], Vec::new()));
        let bytes = ob.finish();
        assert!(!bytes.is_empty());
    }
}
