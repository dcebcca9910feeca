//! Reconstructs include chains from the line-mapping table supplied
//! alongside already-preprocessed source text.
//!
//! Preprocessing (`#include` expansion, macro substitution) happens
//! upstream of this crate; what we receive is flattened source plus, for
//! every physical line in it, a record of which original file/line it came
//! from and which line included that file. Diagnostics walk `parent_line`
//! back to the top to print `in file included from a.cpp:3:` chains.

use faxc_util::FxHashMap;

/// One entry of the line-mapping table: the physical line (1-based, into
/// the flattened source the lexer actually sees) maps to this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineMapping {
    pub source_file_index: u32,
    pub source_line: u32,
    /// The physical line of the *including* file this mapping nested under,
    /// or `None` for lines belonging to the root translation unit.
    pub parent_line: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct LineMappingTable {
    entries: FxHashMap<u32, LineMapping>,
}

impl LineMappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, physical_line: u32, mapping: LineMapping) {
        self.entries.insert(physical_line, mapping);
    }

    pub fn lookup(&self, physical_line: u32) -> Option<LineMapping> {
        self.entries.get(&physical_line).copied()
    }

    /// Walk `parent_line` links from `physical_line` up to the root,
    /// returning the chain root-first (outermost include first).
    pub fn include_chain(&self, physical_line: u32) -> Vec<LineMapping> {
        let mut chain = Vec::new();
        let mut current = self.lookup(physical_line);
        while let Some(mapping) = current {
            chain.push(mapping);
            current = mapping.parent_line.and_then(|p| self.lookup(p));
        }
        chain.reverse();
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_nested_include_chain() {
        let mut table = LineMappingTable::new();
        table.insert(1, LineMapping { source_file_index: 0, source_line: 1, parent_line: None });
        table.insert(2, LineMapping { source_file_index: 1, source_line: 1, parent_line: Some(1) });
        table.insert(3, LineMapping { source_file_index: 2, source_line: 1, parent_line: Some(2) });

        let chain = table.include_chain(3);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].source_file_index, 0);
        assert_eq!(chain[1].source_file_index, 1);
        assert_eq!(chain[2].source_file_index, 2);
    }

    #[test]
    fn root_line_has_single_entry_chain() {
        let mut table = LineMappingTable::new();
        table.insert(1, LineMapping { source_file_index: 0, source_line: 1, parent_line: None });
        assert_eq!(table.include_chain(1).len(), 1);
    }
}
