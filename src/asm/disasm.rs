//! Disassembler for Toy programs.
//!
//! Converts memory contents back to readable assembly and exports machine
//! code in binary or hex.

use crate::cpu::instruction::Instruction;
use crate::cpu::memory::{Memory, MemoryError};
use std::ops::Range;

/// Number format for machine-code export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineCodeFormat {
    /// 16 binary digits per word.
    Binary,
    /// 4 uppercase hex digits per word.
    #[default]
    Hex,
}

impl MachineCodeFormat {
    pub fn format(self, instr: &Instruction) -> String {
        match self {
            MachineCodeFormat::Binary => instr.to_binary(),
            MachineCodeFormat::Hex => instr.to_hex(),
        }
    }
}

/// Disassemble a single halfword to text.
pub fn disassemble_word(word: u16) -> String {
    Instruction::decode(word).to_string()
}

/// Disassemble a range of memory.
pub fn disassemble(mem: &Memory, range: Range<usize>) -> Result<String, MemoryError> {
    let mut output = String::new();
    output.push_str("# Toy Disassembly\n");
    output.push_str("# ---------------\n\n");

    for addr in range {
        let word = mem.read_halfword(addr)?;
        output.push_str(&format!("{:04}: {:<10} # {:04X}\n", addr, disassemble_word(word), word));
    }

    Ok(output)
}

/// One line per instruction: address, machine code, assembly text.
pub fn machine_code_listing(instructions: &[Instruction], format: MachineCodeFormat) -> String {
    instructions
        .iter()
        .enumerate()
        .map(|(addr, instr)| format!("{:04}: {}  {}\n", addr, format.format(instr), instr))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_word() {
        assert_eq!(disassemble_word(0x3005), "ADD 5");
        assert_eq!(disassemble_word(0x8000), "NOT");
        assert_eq!(disassemble_word(0xF123), "NOP");
    }

    #[test]
    fn test_disassemble_memory() {
        let mut mem = Memory::with_size(4);
        mem.write_halfword(0, Instruction::Lda(3).encode()).unwrap();
        mem.write_halfword(1, Instruction::Inc.encode()).unwrap();

        let text = disassemble(&mem, 0..2).unwrap();
        assert!(text.contains("0000: LDA 3"));
        assert!(text.contains("# 1003"));
        assert!(text.contains("0001: INC"));

        assert!(disassemble(&mem, 2..5).is_err());
    }

    #[test]
    fn test_machine_code_listing() {
        let program = [Instruction::Sto(125), Instruction::Inc];
        assert_eq!(
            machine_code_listing(&program, MachineCodeFormat::Hex),
            "0000: 007D  STO 125\n0001: 9000  INC\n"
        );
        assert_eq!(
            machine_code_listing(&program[..1], MachineCodeFormat::Binary),
            "0000: 0000000001111101  STO 125\n"
        );
    }
}
