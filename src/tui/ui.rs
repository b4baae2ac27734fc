//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::CyclePhase;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, control lines and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_signals(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly view around PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:04}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw registers, cycle phase and counters.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let state = app.sim.state();
    let accu = state.regs.accumulator;
    let snapshot = state.snapshot();

    let phase_style = match state.phase() {
        CyclePhase::Idle => Style::default().fg(Color::Green),
        CyclePhase::FirstPhaseDone => Style::default().fg(Color::Yellow),
    };

    let content = vec![
        Line::from(vec![
            Span::raw("ACCU: "),
            Span::styled(format!("{:016b}", accu), Style::default().fg(Color::White)),
            Span::raw(format!(" = {} ({:#06X})", accu, accu)),
        ]),
        Line::from(vec![
            Span::raw("PC:   "),
            Span::styled(format!("{:04}", state.regs.pc()), Style::default().fg(Color::Yellow)),
            Span::raw("   Phase: "),
            Span::styled(format!("{:?}", state.phase()), phase_style),
        ]),
        Line::from(vec![
            Span::raw("Instructions: "),
            Span::styled(format!("{}", state.metrics.instruction_count), Style::default().fg(Color::Cyan)),
            Span::raw("   Branches: "),
            Span::styled(format!("{}", state.metrics.branch_count), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("Last: "),
            Span::raw(match snapshot.instruction {
                Some(instr) => instr.to_string(),
                None => "-".into(),
            }),
            Span::raw(match snapshot.branch_taken {
                Some(true) => "  (branch taken)",
                Some(false) => "  (branch not taken)",
                None => "",
            }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let state = app.sim.state();
    let visible_rows = (area.height as usize).saturating_sub(2);
    let start = app.mem_scroll;
    let end = (start + visible_rows).min(state.mem.size());
    let pc = state.regs.pc() as usize;

    let items: Vec<ListItem> = state
        .mem
        .debug_rows(start..end)
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            let text = format!(
                "{:04}: {}  {:>5}  {}  {:>6}",
                row.address, row.binary, row.unsigned, row.hex, row.signed
            );

            let style = if row.address == pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if row.unsigned != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw the control lines of the current instruction, six per row.
fn draw_signals(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let signals = app.control_signals();
    let lines: Vec<Line> = signals
        .chunks(6)
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&(name, on)| {
                        let style = if on {
                            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(Color::DarkGray)
                        };
                        Span::styled(format!("{:<11}", name), style)
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let title = match app.current_instruction() {
        Some(instr) => format!(" Control: {} ", instr.mnemonic()),
        None => " Control ".into(),
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  h: Half-step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓/PgUp/PgDn: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
