//! Micro-program control table.
//!
//! For each instruction kind the Toy control unit asserts a fixed set of
//! twelve control lines. The table is only used to visualize what the
//! hardware does; instruction execution never consults it.
//!
//! The ALU lines follow the 74181 convention: `alumode` selects logic (1) or
//! arithmetic (0), `alu3..alu0` select the function and `aluinc` is the
//! carry input.

use crate::cpu::instruction::InstructionKind;
use thiserror::Error;

/// Number of control lines.
pub const SIGNAL_COUNT: usize = 12;

/// Control line names, most significant first.
pub const SIGNAL_NAMES: [&str; SIGNAL_COUNT] = [
    "write[ram]",
    "inc[pc]",
    "set[pc]",
    "addr=ir",
    "set[ir]",
    "set[accu]",
    "aluinc",
    "alumode",
    "alu3",
    "alu2",
    "alu1",
    "alu0",
];

/// The control word for `kind`, `write[ram]` in bit 11 down to `alu0` in bit 0.
const fn control_word(kind: InstructionKind) -> u16 {
    //                                 w i s a i a   c m 3210
    match kind {
        InstructionKind::Sto => 0b1_1_0_1_1_0_0_0_0000,
        InstructionKind::Lda => 0b0_1_0_1_1_1_0_1_1010,
        InstructionKind::Brz => 0b0_1_1_1_1_0_0_0_0000,
        InstructionKind::Add => 0b0_1_0_1_1_1_0_0_1001,
        InstructionKind::Sub => 0b0_1_0_1_1_1_1_0_0110,
        InstructionKind::Or => 0b0_1_0_1_1_1_0_1_1110,
        InstructionKind::And => 0b0_1_0_1_1_1_0_1_1011,
        InstructionKind::Xor => 0b0_1_0_1_1_1_0_1_0110,
        InstructionKind::Not => 0b0_1_0_0_1_1_0_1_0000,
        InstructionKind::Inc => 0b0_1_0_0_1_1_1_0_0000,
        InstructionKind::Dec => 0b0_1_0_0_1_1_0_0_1111,
        InstructionKind::Zro => 0b0_1_0_0_1_1_0_1_0011,
        InstructionKind::Nop => 0b0_1_0_0_1_0_0_0_0000,
    }
}

/// Read-only lookup of control signals per instruction kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroProgramTable;

impl MicroProgramTable {
    /// All twelve control lines for `kind`, in [`SIGNAL_NAMES`] order.
    pub fn get_values(kind: InstructionKind) -> [bool; SIGNAL_COUNT] {
        let word = control_word(kind);
        let mut values = [false; SIGNAL_COUNT];
        for (i, value) in values.iter_mut().enumerate() {
            *value = word & (1 << (SIGNAL_COUNT - 1 - i)) != 0;
        }
        values
    }

    /// A single control line by name.
    pub fn get_signal(kind: InstructionKind, name: &str) -> Result<bool, UnknownSignalError> {
        let index = SIGNAL_NAMES
            .iter()
            .position(|&signal| signal == name)
            .ok_or_else(|| UnknownSignalError(name.to_string()))?;
        Ok(Self::get_values(kind)[index])
    }

    /// Names of the lines asserted for `kind`.
    pub fn active_signals(kind: InstructionKind) -> Vec<&'static str> {
        SIGNAL_NAMES
            .iter()
            .zip(Self::get_values(kind))
            .filter_map(|(&name, on)| on.then_some(name))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown control signal: {0}")]
pub struct UnknownSignalError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_writes_ram() {
        assert_eq!(MicroProgramTable::get_signal(InstructionKind::Sto, "write[ram]"), Ok(true));
        assert_eq!(MicroProgramTable::get_signal(InstructionKind::Sto, "set[accu]"), Ok(false));
        for kind in InstructionKind::ALL {
            if kind != InstructionKind::Sto {
                assert_eq!(MicroProgramTable::get_signal(kind, "write[ram]"), Ok(false));
            }
        }
    }

    #[test]
    fn test_values_order() {
        let values = MicroProgramTable::get_values(InstructionKind::Add);
        assert_eq!(
            values,
            [false, true, false, true, true, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn test_only_branch_sets_pc() {
        for kind in InstructionKind::ALL {
            let set_pc = MicroProgramTable::get_signal(kind, "set[pc]").unwrap();
            assert_eq!(set_pc, kind == InstructionKind::Brz, "{kind}");
        }
    }

    #[test]
    fn test_addr_ir_matches_operand_kinds() {
        for kind in InstructionKind::ALL {
            assert_eq!(MicroProgramTable::get_signal(kind, "addr=ir"), Ok(kind.has_address()));
        }
    }

    #[test]
    fn test_unknown_signal() {
        let err = MicroProgramTable::get_signal(InstructionKind::Nop, "halt").unwrap_err();
        assert_eq!(err, UnknownSignalError("halt".into()));
        assert_eq!(err.to_string(), "unknown control signal: halt");
    }

    #[test]
    fn test_active_signals() {
        assert_eq!(MicroProgramTable::active_signals(InstructionKind::Nop), vec!["inc[pc]", "set[ir]"]);
    }
}
