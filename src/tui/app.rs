//! Debugger application state and logic.

use crate::asm::disasm::disassemble_word;
use crate::cpu::{CyclePhase, Instruction, MicroProgramTable, SIGNAL_NAMES};
use crate::Simulation;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The simulation being debugged.
    pub sim: Simulation,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u16>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger around a simulation with a loaded program.
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'h' to half-step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        }
    }

    /// Step one instruction, or finish the current one after a half-step.
    pub fn step(&mut self) {
        if self.sim.state().phase() == CyclePhase::FirstPhaseDone {
            self.half_step();
            return;
        }
        if self.sim.is_done() {
            self.status = format!(
                "Program finished after {} instructions",
                self.sim.state().metrics.instruction_count
            );
            self.running = false;
            return;
        }

        let pc = self.sim.state().regs.pc();
        match self.sim.step() {
            Ok(instr) => {
                self.status = format!("PC={:04}: {}", pc, instr);
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run whichever half of the cycle comes next.
    pub fn half_step(&mut self) {
        let result = match self.sim.state().phase() {
            CyclePhase::Idle if self.sim.is_done() => {
                self.status = "Program finished".into();
                return;
            }
            CyclePhase::Idle => self
                .sim
                .first_cycle_step()
                .map(|instr| format!("Executed {}, PC not yet advanced", instr)),
            CyclePhase::FirstPhaseDone => self
                .sim
                .second_cycle_step()
                .map(|()| format!("Retired, PC={:04}", self.sim.state().regs.pc())),
        };

        self.status = match result {
            Ok(message) => message,
            Err(e) => format!("Error: {}", e),
        };
    }

    /// Run until done, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if self.sim.is_done() {
            self.running = false;
            self.status = format!(
                "Finished after {} instructions",
                self.sim.state().metrics.instruction_count
            );
            return;
        }

        // Check for breakpoint
        let pc = self.sim.state().regs.pc();
        if self.breakpoints.contains(&pc) && self.sim.state().phase() == CyclePhase::Idle {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.sim.state().regs.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reload the program.
    pub fn reset(&mut self) {
        self.running = false;
        self.status = match self.sim.reset() {
            Ok(()) => "Reset. Ready.".into(),
            Err(e) => format!("Reset failed: {}", e),
        };
    }

    /// The instruction whose control lines are shown: the loaded one
    /// between half-steps, otherwise the one at PC.
    pub fn current_instruction(&self) -> Option<Instruction> {
        let state = self.sim.state();
        state.loaded_instruction().or_else(|| {
            state
                .mem
                .read_halfword(state.regs.pc() as usize)
                .ok()
                .map(Instruction::decode)
        })
    }

    /// Control lines for [`current_instruction`](Self::current_instruction).
    pub fn control_signals(&self) -> Vec<(&'static str, bool)> {
        match self.current_instruction() {
            Some(instr) => SIGNAL_NAMES
                .iter()
                .copied()
                .zip(MicroProgramTable::get_values(instr.kind()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Get disassembly around current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let state = self.sim.state();
        let pc = state.regs.pc() as usize;
        let start = pc.saturating_sub(lines / 2);

        state
            .mem
            .dump(start, lines)
            .into_iter()
            .map(|(addr, word)| (addr as u16, disassemble_word(word), addr == pc))
            .collect()
    }
}

/// Run the debugger on a simulation.
pub fn run_debugger(sim: Simulation) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(sim);

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('h') => {
                            app.running = false;
                            app.half_step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll + 1 < app.sim.state().mem.size() {
                                app.mem_scroll += 1;
                            }
                        }
                        KeyCode::PageDown => {
                            let last = app.sim.state().mem.size().saturating_sub(1);
                            app.mem_scroll = (app.mem_scroll + 256).min(last);
                        }
                        KeyCode::PageUp => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(256);
                        }
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
