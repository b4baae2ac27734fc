//! Instruction behaviors for the Toy.
//!
//! Each behavior is applied atomically: all operands are read before the
//! first write, so a failing memory access leaves the state untouched.

use crate::cpu::instruction::Instruction;
use crate::cpu::state::{ArchitecturalState, StepError};
use serde::{Serialize, Deserialize};

/// What the last executed instruction did, for visualization.
///
/// Rebuilt from scratch on every behavior call; fields the instruction does
/// not touch are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationSnapshot {
    pub instruction: Option<Instruction>,
    /// Accumulator before execution, for instructions that feed it to the ALU.
    pub old_accumulator: Option<u16>,
    /// Value the ALU drove onto the accumulator.
    pub alu_result: Option<u16>,
    /// Value read from (or written to) memory.
    pub memory_value: Option<u16>,
    /// Set only for BRZ.
    pub branch_taken: Option<bool>,
}

impl VisualizationSnapshot {
    fn alu(instr: Instruction, old: u16, operand: Option<u16>, result: u16) -> Self {
        Self {
            instruction: Some(instr),
            old_accumulator: Some(old),
            alu_result: Some(result),
            memory_value: operand,
            branch_taken: None,
        }
    }
}

impl Instruction {
    /// Apply this instruction to `state`.
    ///
    /// Only BRZ touches the program counter; advancing past other
    /// instructions is the cycle's second phase.
    pub fn behavior(&self, state: &mut ArchitecturalState) -> Result<(), StepError> {
        // Normalize so the operand used matches the encoded word.
        let instr = Instruction::new(self.kind(), self.address().unwrap_or(0));
        let accu = state.regs.accumulator;

        let snapshot = match instr {
            // ==================== Memory ====================

            Instruction::Sto(addr) => {
                state.mem.write_halfword(addr as usize, accu)?;
                VisualizationSnapshot {
                    instruction: Some(instr),
                    memory_value: Some(accu),
                    ..Default::default()
                }
            }

            Instruction::Lda(addr) => {
                let value = state.mem.read_halfword(addr as usize)?;
                state.regs.accumulator = value;
                VisualizationSnapshot {
                    instruction: Some(instr),
                    old_accumulator: Some(accu),
                    memory_value: Some(value),
                    ..Default::default()
                }
            }

            Instruction::Brz(addr) => {
                let taken = accu == 0;
                if taken {
                    state.take_branch(addr);
                }
                VisualizationSnapshot {
                    instruction: Some(instr),
                    branch_taken: Some(taken),
                    ..Default::default()
                }
            }

            // ==================== ALU with memory operand ====================

            Instruction::Add(addr)
            | Instruction::Sub(addr)
            | Instruction::Or(addr)
            | Instruction::And(addr)
            | Instruction::Xor(addr) => {
                let operand = state.mem.read_halfword(addr as usize)?;
                let result = match instr {
                    Instruction::Add(_) => accu.wrapping_add(operand),
                    Instruction::Sub(_) => accu.wrapping_sub(operand),
                    Instruction::Or(_) => accu | operand,
                    Instruction::And(_) => accu & operand,
                    _ => accu ^ operand,
                };
                state.regs.accumulator = result;
                VisualizationSnapshot::alu(instr, accu, Some(operand), result)
            }

            // ==================== Accumulator only ====================

            Instruction::Not | Instruction::Inc | Instruction::Dec | Instruction::Zro => {
                let result = match instr {
                    Instruction::Not => !accu,
                    Instruction::Inc => accu.wrapping_add(1),
                    Instruction::Dec => accu.wrapping_sub(1),
                    _ => 0,
                };
                state.regs.accumulator = result;
                VisualizationSnapshot::alu(instr, accu, None, result)
            }

            // Opcodes 12-15 land here as well.
            Instruction::Nop => VisualizationSnapshot {
                instruction: Some(instr),
                ..Default::default()
            },
        };

        log::trace!("{:>4}: {:<8} accu {:#06x} -> {:#06x}", state.regs.pc(), instr.to_string(), accu, state.regs.accumulator);
        state.set_snapshot(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::memory::MemoryError;

    fn exec(state: &mut ArchitecturalState, instr: Instruction) {
        instr.behavior(state).unwrap();
    }

    #[test]
    fn test_store_and_load() {
        let mut state = ArchitecturalState::new();
        state.regs.accumulator = 1234;
        exec(&mut state, Instruction::Sto(100));
        assert_eq!(state.mem.read_halfword(100).unwrap(), 1234);

        state.regs.accumulator = 0;
        exec(&mut state, Instruction::Lda(100));
        assert_eq!(state.regs.accumulator, 1234);
        assert_eq!(state.snapshot().memory_value, Some(1234));
        assert_eq!(state.snapshot().old_accumulator, Some(0));
    }

    #[test]
    fn test_alu_ops() {
        let mut state = ArchitecturalState::new();
        state.mem.write_halfword(1, 0b1100).unwrap();

        state.regs.accumulator = 0b1010;
        exec(&mut state, Instruction::Or(1));
        assert_eq!(state.regs.accumulator, 0b1110);

        state.regs.accumulator = 0b1010;
        exec(&mut state, Instruction::And(1));
        assert_eq!(state.regs.accumulator, 0b1000);

        state.regs.accumulator = 0b1010;
        exec(&mut state, Instruction::Xor(1));
        assert_eq!(state.regs.accumulator, 0b0110);

        state.regs.accumulator = 0;
        exec(&mut state, Instruction::Not);
        assert_eq!(state.regs.accumulator, 0xFFFF);

        exec(&mut state, Instruction::Zro);
        assert_eq!(state.regs.accumulator, 0);
    }

    #[test]
    fn test_wraparound() {
        let mut state = ArchitecturalState::new();
        state.regs.accumulator = 65535;
        exec(&mut state, Instruction::Inc);
        assert_eq!(state.regs.accumulator, 0);

        exec(&mut state, Instruction::Dec);
        assert_eq!(state.regs.accumulator, 65535);

        state.mem.write_halfword(7, 2).unwrap();
        exec(&mut state, Instruction::Add(7));
        assert_eq!(state.regs.accumulator, 1);

        exec(&mut state, Instruction::Sub(7));
        assert_eq!(state.regs.accumulator, 65535);
    }

    #[test]
    fn test_branch_taken_only_on_zero() {
        let mut state = ArchitecturalState::new();
        state.regs.accumulator = 1;
        exec(&mut state, Instruction::Brz(40));
        assert_eq!(state.regs.pc(), 0);
        assert_eq!(state.metrics.branch_count, 0);
        assert_eq!(state.snapshot().branch_taken, Some(false));

        state.regs.accumulator = 0;
        exec(&mut state, Instruction::Brz(40));
        assert_eq!(state.regs.pc(), 40);
        assert_eq!(state.metrics.branch_count, 1);
        assert_eq!(state.snapshot().branch_taken, Some(true));
    }

    #[test]
    fn test_snapshot_is_replaced() {
        let mut state = ArchitecturalState::new();
        exec(&mut state, Instruction::Inc);
        assert_eq!(state.snapshot().alu_result, Some(1));

        exec(&mut state, Instruction::Nop);
        assert_eq!(
            *state.snapshot(),
            VisualizationSnapshot { instruction: Some(Instruction::Nop), ..Default::default() }
        );
    }

    #[test]
    fn test_out_of_range_leaves_state() {
        let mut state = ArchitecturalState::with_memory_size(16);
        state.regs.accumulator = 5;
        let err = Instruction::Add(100).behavior(&mut state).unwrap_err();
        assert_eq!(
            err,
            StepError::Memory(MemoryError::AddressOutOfRange { address: 100, size: 16 })
        );
        assert_eq!(state.regs.accumulator, 5);
        assert!(Instruction::Sto(16).behavior(&mut state).is_err());
    }

    #[test]
    fn test_wide_operand_executes_as_encoded() {
        let mut state = ArchitecturalState::new();
        state.regs.accumulator = 77;
        exec(&mut state, Instruction::Sto(4096 + 125));
        assert_eq!(state.mem.read_halfword(125).unwrap(), 77);
        assert_eq!(state.snapshot().instruction, Some(Instruction::Sto(125)));

        state.regs.accumulator = 0;
        exec(&mut state, Instruction::Brz(4096 + 9));
        assert_eq!(state.regs.pc(), 9);
    }
}
