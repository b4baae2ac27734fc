//! TUI debugger for the Toy simulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register, cycle phase and counter display
//! - Memory view in binary, decimal, hex and signed form
//! - Control lines of the current instruction
//! - Step/half-step/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
