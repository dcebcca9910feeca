//! Object file emission: turns a translation unit's compiled functions and
//! data records into bytes a linker understands.
//!
//! `elf` targets System V (`ET_REL`/`EM_X86_64`); `coff` targets Windows
//! (`.obj`/`IMAGE_FILE_MACHINE_AMD64`). [`ObjectFormat`] picks between them;
//! both builders are driven the same way (`add_function`, then one
//! `add_rodata`/`add_rdata` call per RTTI or exception-table record).

pub mod coff;
pub mod elf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFormat {
    Elf,
    Coff,
}

pub enum ObjectBuilder {
    Elf(elf::ObjectBuilder),
    Coff(coff::ObjectBuilder),
}

impl ObjectBuilder {
    pub fn new(format: ObjectFormat) -> Self {
        match format {
            ObjectFormat::Elf => ObjectBuilder::Elf(elf::ObjectBuilder::new()),
            ObjectFormat::Coff => ObjectBuilder::Coff(coff::ObjectBuilder::new()),
        }
    }

    pub fn add_function(&mut self, func: &crate::emitter::EmittedFunction) {
        match self {
            ObjectBuilder::Elf(b) => b.add_function(func),
            ObjectBuilder::Coff(b) => b.add_function(func),
        }
    }

    pub fn add_data(&mut self, symbol: &str, bytes: &[u8], relocations: &[(u32, String)]) {
        match self {
            ObjectBuilder::Elf(b) => b.add_rodata(symbol, bytes, relocations),
            ObjectBuilder::Coff(b) => b.add_rdata(symbol, bytes, relocations),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        match self {
            ObjectBuilder::Elf(b) => b.finish(),
            ObjectBuilder::Coff(b) => b.finish(),
        }
    }
}
