//! Toy CPU registers.
//!
//! The Toy has only two programmer-visible registers:
//! - ACCU: 16-bit accumulator, all arithmetic wraps modulo 2^16
//! - PC: 12-bit program counter, wraps modulo 2^12

use crate::cpu::instruction::ADDRESS_MASK;
use serde::{Serialize, Deserialize};

/// The Toy register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// ACCU: the single general-purpose register.
    pub accumulator: u16,

    /// PC: address of the next instruction. Always below 4096.
    program_counter: u16,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            accumulator: 0,
            program_counter: 0,
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.accumulator = 0;
        self.program_counter = 0;
    }

    #[inline]
    pub fn pc(&self) -> u16 {
        self.program_counter
    }

    /// Increment the program counter by 1, wrapping at 4096.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.program_counter;
        self.program_counter = old.wrapping_add(1) & ADDRESS_MASK;
        old
    }

    /// Set the program counter to an absolute address (reduced to 12 bits).
    pub fn jump(&mut self, addr: u16) {
        self.program_counter = addr & ADDRESS_MASK;
    }
}
