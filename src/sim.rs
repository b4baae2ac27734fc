//! Simulation lifecycle: load a program, then step or run it.

use crate::asm::parser::{parse_into, ParseError, Program};
use crate::config::SimConfig;
use crate::cpu::{ArchitecturalState, Instruction, StepError};

/// Owns one [`ArchitecturalState`] and drives it.
#[derive(Debug, Clone)]
pub struct Simulation {
    state: ArchitecturalState,
    config: SimConfig,
    /// Text of the last loaded program, for [`reset`](Self::reset).
    source: Option<String>,
}

impl Simulation {
    /// Create a simulation with default settings and an empty program.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            state: ArchitecturalState::with_memory_size(config.memory_size),
            config,
            source: None,
        }
    }

    /// Discard the current state and load `text` into a fresh one.
    ///
    /// On a parse error the simulation is left with an empty program.
    pub fn load_program(&mut self, text: &str) -> Result<Program, ParseError> {
        self.state = ArchitecturalState::with_memory_size(self.config.memory_size);
        self.source = None;

        let program = parse_into(text, &mut self.state)?;
        self.source = Some(text.to_string());
        log::debug!("loaded program, max_pc {:?}", self.state.max_pc);
        Ok(program)
    }

    /// Reload the last successfully loaded program.
    pub fn reset(&mut self) -> Result<(), ParseError> {
        match self.source.take() {
            Some(source) => self.load_program(&source).map(|_| ()),
            None => {
                self.state = ArchitecturalState::with_memory_size(self.config.memory_size);
                Ok(())
            }
        }
    }

    /// Execute one full instruction.
    pub fn step(&mut self) -> Result<Instruction, StepError> {
        self.state.step()
    }

    pub fn first_cycle_step(&mut self) -> Result<Instruction, StepError> {
        self.state.first_cycle_step()
    }

    pub fn second_cycle_step(&mut self) -> Result<(), StepError> {
        self.state.second_cycle_step()
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Run until PC passes the last instruction.
    ///
    /// There is no cycle limit: a program that loops forever never returns.
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, StepError> {
        self.run_while(|_| true)
    }

    /// Run until done or until `max_cycles` instructions have executed.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, StepError> {
        self.run_while(|executed| executed < max_cycles)
    }

    fn run_while<F>(&mut self, mut keep_going: F) -> Result<u64, StepError>
    where
        F: FnMut(u64) -> bool,
    {
        self.state.metrics.resume_timer();

        let mut executed = 0;
        let result = loop {
            if self.state.is_done() || !keep_going(executed) {
                break Ok(executed);
            }
            if let Err(e) = self.state.step() {
                break Err(e);
            }
            executed += 1;
        };

        self.state.metrics.stop_timer();
        log::debug!(
            "ran {} instructions ({:.0} instr/s), pc {}",
            executed,
            self.state.metrics.instructions_per_second,
            self.state.regs.pc()
        );
        result
    }

    pub fn state(&self) -> &ArchitecturalState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ArchitecturalState {
        &mut self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CyclePhase;

    #[test]
    fn test_end_to_end() {
        let mut sim = Simulation::new();
        sim.load_program("INC\nINC\nSTO 1024\nADD 1024\nSTO 1025\nINC\nLDA 4095").unwrap();

        let executed = sim.run().unwrap();
        assert_eq!(executed, 7);
        assert!(sim.is_done());

        let state = sim.state();
        assert_eq!(state.mem.read_halfword(1024).unwrap(), 2);
        assert_eq!(state.mem.read_halfword(1025).unwrap(), 4);
        assert_eq!(state.regs.accumulator, 0);
        assert_eq!(state.metrics.instruction_count, 7);
        assert_eq!(state.metrics.cycles, 7);
        assert!(!state.metrics.is_running());
    }

    #[test]
    fn test_countdown_loop() {
        let source = r#"
            :100:3          # counter
            :101:1          # constant one
        LOOP:
            LDA 100
            BRZ END
            SUB 101
            STO 100
            ZRO
            BRZ LOOP
        END:
            NOP
        "#;

        let mut sim = Simulation::new();
        sim.load_program(source).unwrap();
        sim.run().unwrap();

        let state = sim.state();
        assert_eq!(state.mem.read_halfword(100).unwrap(), 0);
        // Three trips back to LOOP plus the final exit.
        assert_eq!(state.metrics.branch_count, 4);
    }

    #[test]
    fn test_run_when_done_is_noop() {
        let mut sim = Simulation::new();
        sim.load_program("# nothing here").unwrap();
        assert!(sim.is_done());
        assert_eq!(sim.run().unwrap(), 0);
        assert_eq!(sim.state().metrics.instruction_count, 0);
    }

    #[test]
    fn test_run_limited() {
        let mut sim = Simulation::new();
        sim.load_program("LOOP: BRZ LOOP").unwrap();
        assert_eq!(sim.run_limited(50).unwrap(), 50);
        assert!(!sim.is_done());
        assert_eq!(sim.state().metrics.branch_count, 50);
    }

    #[test]
    fn test_half_steps_through_simulation() {
        let mut sim = Simulation::new();
        sim.load_program("INC").unwrap();
        sim.first_cycle_step().unwrap();
        assert_eq!(sim.state().phase(), CyclePhase::FirstPhaseDone);
        assert!(matches!(sim.first_cycle_step(), Err(StepError::Sequence { .. })));
        assert!(matches!(sim.run(), Err(StepError::Sequence { .. })));
        sim.second_cycle_step().unwrap();
        assert!(sim.is_done());
    }

    #[test]
    fn test_load_discards_state() {
        let mut sim = Simulation::new();
        sim.load_program(":9:5\nINC").unwrap();
        sim.run().unwrap();

        sim.load_program("DEC").unwrap();
        let state = sim.state();
        assert_eq!(state.regs.accumulator, 0);
        assert_eq!(state.regs.pc(), 0);
        assert_eq!(state.mem.read_halfword(9).unwrap(), 0);
        assert_eq!(state.metrics.instruction_count, 0);
    }

    #[test]
    fn test_load_error_leaves_empty_program() {
        let mut sim = Simulation::new();
        sim.load_program("INC").unwrap();
        let err = sim.load_program("INC\nJMP 4").unwrap_err();
        assert_eq!(err.line_number(), Some(2));
        assert!(sim.is_done());
        assert_eq!(sim.state().max_pc, None);
    }

    #[test]
    fn test_memory_size_preserved() {
        let config = SimConfig { memory_size: 64, ..SimConfig::default() };
        let mut sim = Simulation::with_config(config);
        sim.load_program("LDA 63").unwrap();
        assert_eq!(sim.state().mem.size(), 64);
        sim.run().unwrap();

        sim.load_program("LDA 64").unwrap();
        assert_eq!(sim.state().mem.size(), 64);
        assert!(matches!(sim.run(), Err(StepError::Memory(_))));
    }

    #[test]
    fn test_reset_reloads_program() {
        let mut sim = Simulation::new();
        sim.load_program("INC\nSTO 20").unwrap();
        sim.run().unwrap();
        assert_eq!(sim.state().mem.read_halfword(20).unwrap(), 1);

        sim.reset().unwrap();
        assert_eq!(sim.state().regs.pc(), 0);
        assert_eq!(sim.state().mem.read_halfword(20).unwrap(), 0);
        sim.run().unwrap();
        assert_eq!(sim.state().mem.read_halfword(20).unwrap(), 1);
    }

    #[test]
    fn test_oversized_memory_rejects_unreachable_program() {
        let config = SimConfig { memory_size: 4200, ..SimConfig::default() };
        let mut sim = Simulation::with_config(config);
        let source = "NOP\n".repeat(4100);
        assert!(matches!(
            sim.load_program(&source),
            Err(ParseError::ProgramTooLarge { size: 4100, available: 4096 })
        ));
        assert!(sim.is_done());
        assert_eq!(sim.run_limited(20_000).unwrap(), 0);
    }
}
