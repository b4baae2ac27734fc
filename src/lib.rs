//! # Toy Simulator
//!
//! A cycle-level simulator for the Toy computer, a 16-bit accumulator
//! machine used for teaching.
//!
//! The Toy has one accumulator, a 12-bit program counter, 4096 halfwords of
//! memory and thirteen instructions. Each instruction can be run as a single
//! step or as two observable half-steps, and a micro-program table describes
//! the control lines the hardware would assert for it.

pub mod cpu;
pub mod asm;
pub mod config;
pub mod sim;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{
    ArchitecturalState, CyclePhase, Instruction, InstructionKind, Memory, MemoryError,
    MicroProgramTable, PerformanceMetrics, StepError, UnknownSignalError, VisualizationSnapshot,
};
pub use asm::{parse, parse_into, disassemble, ParseError, Program};
pub use config::{SimConfig, ConfigError};
pub use sim::Simulation;

#[cfg(feature = "tui")]
pub use tui::run_debugger;
