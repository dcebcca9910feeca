//! Lexical analysis: turns already-preprocessed UTF-8 source text into a
//! token stream plus an include-chain line-mapping table.
//!
//! This crate has no notion of `#include`/`#define` — that happens in a
//! collaborator upstream of `compile()` (spec §6). What it receives is flat
//! source text and, optionally, a [`line_map::LineMappingTable`] recording
//! where each physical line originally came from.

pub mod cursor;
pub mod lex;
pub mod line_map;
pub mod token;
pub mod unicode;

pub use lex::{Lexer, LexerCheckpoint};
pub use line_map::{LineMapping, LineMappingTable};
pub use token::{FloatSuffix, IntSuffix, Keyword, Punct, Token, TokenKind};
