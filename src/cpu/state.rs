//! Architectural state and the two-phase instruction cycle.
//!
//! An instruction can be executed in one go with [`ArchitecturalState::step`],
//! or split into two observable halves:
//!
//! 1. [`first_cycle_step`](ArchitecturalState::first_cycle_step) fetches,
//!    decodes and executes the instruction at PC.
//! 2. [`second_cycle_step`](ArchitecturalState::second_cycle_step) advances
//!    PC (unless a branch was taken) and retires the instruction.
//!
//! Calling the halves out of order is an error.

use crate::cpu::execute::VisualizationSnapshot;
use crate::cpu::instruction::Instruction;
use crate::cpu::memory::{Memory, MemoryError, MEMORY_SIZE};
use crate::cpu::metrics::PerformanceMetrics;
use crate::cpu::registers::Registers;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Where the cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CyclePhase {
    /// Ready to fetch the next instruction.
    #[default]
    Idle,
    /// The loaded instruction has executed but not yet retired.
    FirstPhaseDone,
}

/// Everything the Toy CPU can observe or change.
#[derive(Clone)]
pub struct ArchitecturalState {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Highest instruction address of the loaded program, `None` if empty.
    pub max_pc: Option<u16>,
    pub metrics: PerformanceMetrics,
    loaded_instruction: Option<Instruction>,
    snapshot: VisualizationSnapshot,
    phase: CyclePhase,
    /// A branch already wrote PC during the current cycle.
    pc_written: bool,
}

impl ArchitecturalState {
    /// Create a zeroed state with full-size memory.
    pub fn new() -> Self {
        Self::with_memory_size(MEMORY_SIZE)
    }

    pub fn with_memory_size(size: usize) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::with_size(size),
            max_pc: None,
            metrics: PerformanceMetrics::new(),
            loaded_instruction: None,
            snapshot: VisualizationSnapshot::default(),
            phase: CyclePhase::Idle,
            pc_written: false,
        }
    }

    /// Fetch, decode and execute the instruction at PC.
    pub fn first_cycle_step(&mut self) -> Result<Instruction, StepError> {
        self.expect_phase(CyclePhase::Idle)?;

        let word = self.mem.read_halfword(self.regs.pc() as usize)?;
        let instr = Instruction::decode(word);
        instr.behavior(self)?;

        self.loaded_instruction = Some(instr);
        self.phase = CyclePhase::FirstPhaseDone;
        Ok(instr)
    }

    /// Advance PC and retire the loaded instruction.
    pub fn second_cycle_step(&mut self) -> Result<(), StepError> {
        self.expect_phase(CyclePhase::FirstPhaseDone)?;

        if !self.pc_written {
            self.regs.advance_pc();
        }
        log::trace!("retired {:?}, pc {}", self.loaded_instruction, self.regs.pc());
        self.pc_written = false;
        self.loaded_instruction = None;
        self.metrics.instruction_count += 1;
        self.metrics.cycles += 1;
        self.phase = CyclePhase::Idle;
        Ok(())
    }

    /// Execute one full instruction.
    pub fn step(&mut self) -> Result<Instruction, StepError> {
        let instr = self.first_cycle_step()?;
        self.second_cycle_step()?;
        Ok(instr)
    }

    /// Whether PC has run past the last instruction of the program.
    pub fn is_done(&self) -> bool {
        match self.max_pc {
            Some(max_pc) => self.regs.pc() > max_pc,
            None => true,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// The instruction between the two cycle halves, if any.
    pub fn loaded_instruction(&self) -> Option<Instruction> {
        self.loaded_instruction
    }

    pub fn snapshot(&self) -> &VisualizationSnapshot {
        &self.snapshot
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: VisualizationSnapshot) {
        self.snapshot = snapshot;
    }

    /// Jump to `addr` as the result of a taken branch.
    pub(crate) fn take_branch(&mut self, addr: u16) {
        self.regs.jump(addr);
        self.pc_written = true;
        self.metrics.branch_count += 1;
    }

    fn expect_phase(&self, expected: CyclePhase) -> Result<(), StepError> {
        if self.phase != expected {
            return Err(StepError::Sequence { expected, actual: self.phase });
        }
        Ok(())
    }
}

impl Default for ArchitecturalState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArchitecturalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchitecturalState")
            .field("phase", &self.phase)
            .field("regs", &self.regs)
            .field("max_pc", &self.max_pc)
            .field("loaded_instruction", &self.loaded_instruction)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur while stepping the CPU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("cycle step called out of order: expected {expected:?} phase, was {actual:?}")]
    Sequence { expected: CyclePhase, actual: CyclePhase },

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(state: &mut ArchitecturalState, program: &[Instruction]) {
        for (addr, instr) in program.iter().enumerate() {
            state.mem.write_halfword(addr, instr.encode()).unwrap();
        }
        state.max_pc = program.len().checked_sub(1).map(|pc| pc as u16);
    }

    #[test]
    fn test_two_phase_cycle() {
        let mut state = ArchitecturalState::new();
        load(&mut state, &[Instruction::Inc, Instruction::Inc]);

        let instr = state.first_cycle_step().unwrap();
        assert_eq!(instr, Instruction::Inc);
        assert_eq!(state.phase(), CyclePhase::FirstPhaseDone);
        assert_eq!(state.loaded_instruction(), Some(Instruction::Inc));
        assert_eq!(state.regs.accumulator, 1);
        assert_eq!(state.regs.pc(), 0);
        assert_eq!(state.metrics.instruction_count, 0);

        state.second_cycle_step().unwrap();
        assert_eq!(state.phase(), CyclePhase::Idle);
        assert_eq!(state.loaded_instruction(), None);
        assert_eq!(state.regs.pc(), 1);
        assert_eq!(state.metrics.instruction_count, 1);
        assert_eq!(state.metrics.cycles, 1);
    }

    #[test]
    fn test_first_phase_twice_fails() {
        let mut state = ArchitecturalState::new();
        load(&mut state, &[Instruction::Inc, Instruction::Inc]);
        state.first_cycle_step().unwrap();
        assert_eq!(
            state.first_cycle_step(),
            Err(StepError::Sequence {
                expected: CyclePhase::Idle,
                actual: CyclePhase::FirstPhaseDone,
            })
        );
        assert!(matches!(state.step(), Err(StepError::Sequence { .. })));
        // Nothing executed twice.
        assert_eq!(state.regs.accumulator, 1);
    }

    #[test]
    fn test_second_phase_from_idle_fails() {
        let mut state = ArchitecturalState::new();
        assert!(matches!(
            state.second_cycle_step(),
            Err(StepError::Sequence { expected: CyclePhase::FirstPhaseDone, .. })
        ));
    }

    #[test]
    fn test_taken_branch_keeps_target() {
        let mut state = ArchitecturalState::new();
        load(&mut state, &[Instruction::Brz(5)]);
        state.step().unwrap();
        assert_eq!(state.regs.pc(), 5);
        assert_eq!(state.metrics.branch_count, 1);
        assert!(state.is_done());
    }

    #[test]
    fn test_untaken_branch_advances() {
        let mut state = ArchitecturalState::new();
        load(&mut state, &[Instruction::Inc, Instruction::Brz(0)]);
        state.step().unwrap();
        state.step().unwrap();
        assert_eq!(state.regs.pc(), 2);
        assert_eq!(state.metrics.branch_count, 0);
    }

    #[test]
    fn test_branch_to_self_then_advance() {
        // A branch back to its own address must not be mistaken for no branch.
        let mut state = ArchitecturalState::new();
        load(&mut state, &[Instruction::Brz(0)]);
        state.step().unwrap();
        assert_eq!(state.regs.pc(), 0);
        assert!(!state.is_done());
    }

    #[test]
    fn test_pc_wraps_after_last_address() {
        let mut state = ArchitecturalState::new();
        state.regs.jump(4095);
        state.step().unwrap();
        assert_eq!(state.regs.pc(), 0);
    }

    #[test]
    fn test_is_done() {
        let mut state = ArchitecturalState::new();
        assert!(state.is_done());

        load(&mut state, &[Instruction::Nop]);
        assert!(!state.is_done());
        state.step().unwrap();
        assert!(state.is_done());
    }

    #[test]
    fn test_fetch_out_of_range() {
        let mut state = ArchitecturalState::with_memory_size(4);
        state.regs.jump(4);
        assert!(matches!(state.step(), Err(StepError::Memory(_))));
        assert_eq!(state.phase(), CyclePhase::Idle);
    }

    #[test]
    fn test_failed_behavior_keeps_phase() {
        let mut state = ArchitecturalState::with_memory_size(8);
        load(&mut state, &[Instruction::Lda(100)]);
        state.regs.accumulator = 3;

        assert!(matches!(state.first_cycle_step(), Err(StepError::Memory(_))));
        assert_eq!(state.phase(), CyclePhase::Idle);
        assert_eq!(state.loaded_instruction(), None);
        assert_eq!(state.regs.pc(), 0);
        assert_eq!(state.regs.accumulator, 3);
        assert_eq!(state.metrics.instruction_count, 0);
        assert_eq!(state.metrics.cycles, 0);
        assert!(matches!(state.second_cycle_step(), Err(StepError::Sequence { .. })));
    }
}
