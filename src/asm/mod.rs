//! Assembler front end and disassembler for Toy programs.
//!
//! This module provides:
//! - A two-pass parser (text → memory image)
//! - A disassembler and machine-code listing (memory → readable text)

pub mod parser;
pub mod disasm;

pub use parser::{parse, parse_into, ParseError, Program};
pub use disasm::{disassemble, disassemble_word, machine_code_listing, MachineCodeFormat};
