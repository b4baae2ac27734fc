//! CPU emulation for the Toy computer.
//!
//! This module implements the complete Toy architecture:
//! - 4096 sixteen-bit memory cells (configurable down to fewer)
//! - 2 registers: ACCU (accumulator) and PC (12-bit program counter)
//! - 13-instruction set with single-address format
//! - a two-phase instruction cycle and its micro-program table

pub mod memory;
pub mod registers;
pub mod instruction;
pub mod execute;
pub mod microprogram;
pub mod metrics;
pub mod state;

pub use memory::{Memory, MemoryError, MemoryRow, MEMORY_SIZE};
pub use registers::Registers;
pub use instruction::{Instruction, InstructionKind};
pub use execute::VisualizationSnapshot;
pub use microprogram::{MicroProgramTable, UnknownSignalError, SIGNAL_NAMES};
pub use metrics::PerformanceMetrics;
pub use state::{ArchitecturalState, CyclePhase, StepError};
