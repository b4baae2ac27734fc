//! Instruction encoding and decoding for the Toy computer.
//!
//! Every instruction is one 16-bit halfword:
//!
//! ```text
//!  15    12 11                     0
//! +--------+------------------------+
//! | opcode |        address         |
//! +--------+------------------------+
//! ```
//!
//! Opcodes 0-7 carry a memory address, 8-11 ignore the address field, and
//! 12-15 are unused and all execute as `NOP`.

use serde::{Serialize, Deserialize};
use std::fmt;

/// Mask for the 12-bit address field.
pub const ADDRESS_MASK: u16 = 0x0FFF;

/// The opcode `NOP` encodes to. Opcodes above it also decode to `NOP`.
pub const NOP_OPCODE: u8 = 12;

/// The kind of an instruction, without its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstructionKind {
    Sto,
    Lda,
    Brz,
    Add,
    Sub,
    Or,
    And,
    Xor,
    Not,
    Inc,
    Dec,
    Zro,
    Nop,
}

impl InstructionKind {
    /// All kinds, in opcode order.
    pub const ALL: [InstructionKind; 13] = [
        InstructionKind::Sto,
        InstructionKind::Lda,
        InstructionKind::Brz,
        InstructionKind::Add,
        InstructionKind::Sub,
        InstructionKind::Or,
        InstructionKind::And,
        InstructionKind::Xor,
        InstructionKind::Not,
        InstructionKind::Inc,
        InstructionKind::Dec,
        InstructionKind::Zro,
        InstructionKind::Nop,
    ];

    /// The 4-bit opcode for this kind.
    pub const fn opcode(self) -> u8 {
        match self {
            InstructionKind::Sto => 0,
            InstructionKind::Lda => 1,
            InstructionKind::Brz => 2,
            InstructionKind::Add => 3,
            InstructionKind::Sub => 4,
            InstructionKind::Or => 5,
            InstructionKind::And => 6,
            InstructionKind::Xor => 7,
            InstructionKind::Not => 8,
            InstructionKind::Inc => 9,
            InstructionKind::Dec => 10,
            InstructionKind::Zro => 11,
            InstructionKind::Nop => NOP_OPCODE,
        }
    }

    /// Look up the kind for a 4-bit opcode.
    pub const fn from_opcode(opcode: u8) -> Self {
        match opcode & 0xF {
            0 => InstructionKind::Sto,
            1 => InstructionKind::Lda,
            2 => InstructionKind::Brz,
            3 => InstructionKind::Add,
            4 => InstructionKind::Sub,
            5 => InstructionKind::Or,
            6 => InstructionKind::And,
            7 => InstructionKind::Xor,
            8 => InstructionKind::Not,
            9 => InstructionKind::Inc,
            10 => InstructionKind::Dec,
            11 => InstructionKind::Zro,
            // 12-15 are unused opcode space.
            _ => InstructionKind::Nop,
        }
    }

    /// Upper-case assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            InstructionKind::Sto => "STO",
            InstructionKind::Lda => "LDA",
            InstructionKind::Brz => "BRZ",
            InstructionKind::Add => "ADD",
            InstructionKind::Sub => "SUB",
            InstructionKind::Or => "OR",
            InstructionKind::And => "AND",
            InstructionKind::Xor => "XOR",
            InstructionKind::Not => "NOT",
            InstructionKind::Inc => "INC",
            InstructionKind::Dec => "DEC",
            InstructionKind::Zro => "ZRO",
            InstructionKind::Nop => "NOP",
        }
    }

    /// Case-insensitive mnemonic lookup.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.mnemonic().eq_ignore_ascii_case(name))
    }

    /// Whether instructions of this kind carry a memory address.
    pub const fn has_address(self) -> bool {
        self.opcode() < 8
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Decoded Toy instruction.
///
/// Only the low 12 bits of an address operand are significant: two
/// instructions compare equal exactly when they encode to the same halfword.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Memory ====================

    /// Store accumulator: [addr] := ACCU
    Sto(u16),

    /// Load accumulator: ACCU := [addr]
    Lda(u16),

    /// Branch if zero: if ACCU = 0 then PC := addr
    Brz(u16),

    // ==================== ALU with memory operand ====================

    /// ACCU := ACCU + [addr]
    Add(u16),

    /// ACCU := ACCU - [addr]
    Sub(u16),

    /// ACCU := ACCU | [addr]
    Or(u16),

    /// ACCU := ACCU & [addr]
    And(u16),

    /// ACCU := ACCU ^ [addr]
    Xor(u16),

    // ==================== Accumulator only ====================

    /// ACCU := !ACCU
    Not,

    /// ACCU := ACCU + 1
    Inc,

    /// ACCU := ACCU - 1
    Dec,

    /// ACCU := 0
    Zro,

    /// No operation
    Nop,
}

impl Instruction {
    /// Build an instruction from its kind. The address is reduced to 12 bits
    /// and ignored for kinds without an operand.
    pub fn new(kind: InstructionKind, address: u16) -> Self {
        let addr = address & ADDRESS_MASK;
        match kind {
            InstructionKind::Sto => Instruction::Sto(addr),
            InstructionKind::Lda => Instruction::Lda(addr),
            InstructionKind::Brz => Instruction::Brz(addr),
            InstructionKind::Add => Instruction::Add(addr),
            InstructionKind::Sub => Instruction::Sub(addr),
            InstructionKind::Or => Instruction::Or(addr),
            InstructionKind::And => Instruction::And(addr),
            InstructionKind::Xor => Instruction::Xor(addr),
            InstructionKind::Not => Instruction::Not,
            InstructionKind::Inc => Instruction::Inc,
            InstructionKind::Dec => Instruction::Dec,
            InstructionKind::Zro => Instruction::Zro,
            InstructionKind::Nop => Instruction::Nop,
        }
    }

    /// Build an instruction from a case-insensitive mnemonic.
    pub fn from_mnemonic(name: &str, address: u16) -> Option<Self> {
        InstructionKind::from_mnemonic(name).map(|kind| Self::new(kind, address))
    }

    /// Decode a halfword. Opcodes 12-15 all decode to `NOP`.
    pub fn decode(word: u16) -> Self {
        let opcode = (word >> 12) as u8;
        Self::new(InstructionKind::from_opcode(opcode), word)
    }

    /// Encode to a halfword: `(opcode << 12) | address`.
    pub fn encode(&self) -> u16 {
        ((self.opcode() as u16) << 12) | self.address().unwrap_or(0)
    }

    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Sto(_) => InstructionKind::Sto,
            Instruction::Lda(_) => InstructionKind::Lda,
            Instruction::Brz(_) => InstructionKind::Brz,
            Instruction::Add(_) => InstructionKind::Add,
            Instruction::Sub(_) => InstructionKind::Sub,
            Instruction::Or(_) => InstructionKind::Or,
            Instruction::And(_) => InstructionKind::And,
            Instruction::Xor(_) => InstructionKind::Xor,
            Instruction::Not => InstructionKind::Not,
            Instruction::Inc => InstructionKind::Inc,
            Instruction::Dec => InstructionKind::Dec,
            Instruction::Zro => InstructionKind::Zro,
            Instruction::Nop => InstructionKind::Nop,
        }
    }

    pub fn opcode(&self) -> u8 {
        self.kind().opcode()
    }

    pub fn mnemonic(&self) -> &'static str {
        self.kind().mnemonic()
    }

    /// The memory operand, for kinds that carry one.
    pub fn address(&self) -> Option<u16> {
        match *self {
            Instruction::Sto(addr)
            | Instruction::Lda(addr)
            | Instruction::Brz(addr)
            | Instruction::Add(addr)
            | Instruction::Sub(addr)
            | Instruction::Or(addr)
            | Instruction::And(addr)
            | Instruction::Xor(addr) => Some(addr & ADDRESS_MASK),
            Instruction::Not
            | Instruction::Inc
            | Instruction::Dec
            | Instruction::Zro
            | Instruction::Nop => None,
        }
    }

    /// Machine code as 16 binary digits.
    pub fn to_binary(&self) -> String {
        format!("{:016b}", self.encode())
    }

    /// Machine code as 4 uppercase hex digits.
    pub fn to_hex(&self) -> String {
        format!("{:04X}", self.encode())
    }
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        self.encode() == other.encode()
    }
}

impl Eq for Instruction {}

impl std::hash::Hash for Instruction {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.encode().hash(state);
    }
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Self {
        Instruction::decode(word)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address() {
            Some(addr) => write!(f, "{} {}", self.mnemonic(), addr),
            None => f.write_str(self.mnemonic()),
        }
    }
}
