//! WebAssembly bindings for the Toy simulator.
//!
//! This module provides JavaScript-friendly wrappers around the core simulator.

use wasm_bindgen::prelude::*;
use crate::asm::disasm::disassemble_word;
use crate::cpu::{CyclePhase, InstructionKind, MicroProgramTable};
use crate::Simulation;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly simulation wrapper.
#[wasm_bindgen]
pub struct WasmSim {
    sim: Simulation,
}

#[wasm_bindgen]
impl WasmSim {
    /// Create a new simulation with an empty program.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            sim: Simulation::new(),
        }
    }

    /// Load a program from assembly source. Returns the instruction count.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let program = self.sim.load_program(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(program.instructions.len())
    }

    /// Step one instruction. Returns the executed instruction as text.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let instr = self.sim.step()
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(instr.to_string())
    }

    /// Run the next half of the instruction cycle.
    #[wasm_bindgen]
    pub fn half_step(&mut self) -> Result<(), JsError> {
        let result = match self.sim.state().phase() {
            CyclePhase::Idle => self.sim.first_cycle_step().map(|_| ()),
            CyclePhase::FirstPhaseDone => self.sim.second_cycle_step(),
        };
        result.map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Run until done or `max_cycles` instructions have executed.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.sim.run_limited(max_cycles as u64)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Reload the last program.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.sim.reset()
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    #[wasm_bindgen]
    pub fn is_done(&self) -> bool {
        self.sim.is_done()
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.sim.state().regs.pc()
    }

    #[wasm_bindgen]
    pub fn accumulator(&self) -> u16 {
        self.sim.state().regs.accumulator
    }

    #[wasm_bindgen]
    pub fn instruction_count(&self) -> u64 {
        self.sim.state().metrics.instruction_count
    }

    /// Get a memory cell value. Fails outside the configured memory.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: usize) -> Result<u16, JsError> {
        self.sim.state().mem.read_halfword(addr)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Get all memory as an array of values.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u16> {
        let mem = &self.sim.state().mem;
        mem.dump(0, mem.size()).into_iter().map(|(_, word)| word).collect()
    }

    /// Last instruction's visualization snapshot as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.sim.state().snapshot())
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Performance counters as JSON.
    #[wasm_bindgen]
    pub fn metrics_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.sim.state().metrics)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmSim {
    fn default() -> Self {
        Self::new()
    }
}

/// Disassemble a single halfword.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u16) -> String {
    disassemble_word(word)
}

/// Names of the control lines asserted for a mnemonic.
#[wasm_bindgen]
pub fn wasm_active_signals(mnemonic: &str) -> Result<Vec<String>, JsError> {
    let kind = InstructionKind::from_mnemonic(mnemonic)
        .ok_or_else(|| JsError::new(&format!("unknown mnemonic: {}", mnemonic)))?;
    Ok(MicroProgramTable::active_signals(kind)
        .into_iter()
        .map(String::from)
        .collect())
}
