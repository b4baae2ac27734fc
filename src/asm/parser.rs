//! Assembly parser for Toy programs.
//!
//! Syntax:
//! ```text
//! # Comment
//! COUNT = 10          # Named constant
//! :$400:20            # Data: memory[0x400] := 20
//! LOOP:               # Label for the next instruction
//!     LDA $400        # Load from address 0x400
//!     SUB ONE         # Names may be used before they are defined
//!     BRZ END
//!     INC
//! END: NOP
//! ONE = 1
//! ```
//!
//! Operands are decimal (`42`, `-1`), hex (`$2A`, `0x2A`), binary (`0b101`)
//! or the name of a label or constant. Mnemonics and names are
//! case-insensitive. Instructions are placed one per halfword starting at
//! address 0.

use crate::cpu::instruction::{Instruction, InstructionKind, ADDRESS_MASK};
use crate::cpu::memory::{MemoryError, MEMORY_SIZE};
use crate::cpu::state::ArchitecturalState;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// A successfully parsed program, not yet placed in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Instructions in address order, starting at 0.
    pub instructions: Vec<Instruction>,
    /// Data directives as `(address, value)`, in source order.
    pub data: Vec<(usize, u16)>,
    /// Resolved labels and constants, keyed by upper-case name.
    pub symbols: BTreeMap<String, i64>,
}

impl Program {
    /// Address of the last instruction, `None` for an empty program.
    pub fn max_pc(&self) -> Option<u16> {
        self.instructions.len().checked_sub(1).map(|pc| pc as u16)
    }

    /// Write the program into `state` and set its `max_pc`.
    ///
    /// Instructions are written first, then data directives in source order,
    /// so data may overwrite an instruction.
    fn commit(&self, state: &mut ArchitecturalState) -> Result<(), MemoryError> {
        for (addr, instr) in self.instructions.iter().enumerate() {
            state.mem.write_halfword(addr, instr.encode())?;
        }
        for &(addr, value) in &self.data {
            state.mem.write_halfword(addr, value)?;
        }
        state.max_pc = self.max_pc();
        Ok(())
    }
}

/// Parse `source` for a full-size memory without touching any state.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new().parse(source, MEMORY_SIZE)
}

/// Parse `source` and place it in `state`'s memory.
///
/// Memory is only modified if the whole program parses and fits.
pub fn parse_into(source: &str, state: &mut ArchitecturalState) -> Result<Program, ParseError> {
    let program = Parser::new().parse(source, state.mem.size())?;
    program.commit(state)?;
    log::debug!(
        "parsed {} instructions, {} data words, max_pc {:?}",
        program.instructions.len(),
        program.data.len(),
        program.max_pc()
    );
    Ok(program)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Number(i64),
    Name(String),
}

#[derive(Debug, Clone)]
enum Statement {
    Instruction { kind: InstructionKind, operand: Option<Operand> },
    Data { address: Operand, value: Operand },
}

#[derive(Debug, Clone)]
enum Symbol {
    Label(usize),
    Constant(Operand),
}

/// A statement together with where it came from.
struct SourceStatement<'a> {
    line_number: usize,
    line: &'a str,
    statement: Statement,
}

/// The parser state.
struct Parser<'a> {
    /// Symbol table (upper-case name -> definition).
    symbols: HashMap<String, Symbol>,
    /// Statements collected in pass 1.
    statements: Vec<SourceStatement<'a>>,
    /// Address of the next instruction.
    next_address: usize,
}

impl<'a> Parser<'a> {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            statements: Vec::new(),
            next_address: 0,
        }
    }

    fn parse(mut self, source: &'a str, memory_size: usize) -> Result<Program, ParseError> {
        // Pass 1: classify every line and collect symbols.
        for (index, line) in source.lines().enumerate() {
            self.process_line(line, index + 1)
                .ok_or_else(|| syntax_error(index + 1, line))?;
        }

        // PC is 12 bits, so instructions past 4096 could never be reached.
        let available = memory_size.min(MEMORY_SIZE);
        if self.next_address > available {
            return Err(ParseError::ProgramTooLarge { size: self.next_address, available });
        }

        // Pass 2: resolve operands.
        let mut program = Program::default();
        for stmt in &self.statements {
            let error = || syntax_error(stmt.line_number, stmt.line);
            match &stmt.statement {
                Statement::Instruction { kind, operand } => {
                    let address = match operand {
                        Some(op) => {
                            let value = self.resolve(op).ok_or_else(error)?;
                            if value < 0 {
                                return Err(error());
                            }
                            (value as u64 & ADDRESS_MASK as u64) as u16
                        }
                        None => 0,
                    };
                    program.instructions.push(Instruction::new(*kind, address));
                }
                Statement::Data { address, value } => {
                    let address = self.resolve(address).ok_or_else(error)?;
                    let value = self.resolve(value).ok_or_else(error)?;
                    if address < 0 || address as u64 >= memory_size as u64 {
                        return Err(ParseError::DataOutOfRange {
                            line_number: stmt.line_number,
                            line: stmt.line.to_string(),
                            address,
                        });
                    }
                    program.data.push((address as usize, value.rem_euclid(1 << 16) as u16));
                }
            }
        }

        for name in self.symbols.keys() {
            if let Some(value) = self.resolve(&Operand::Name(name.clone())) {
                program.symbols.insert(name.clone(), value);
            }
        }

        Ok(program)
    }

    /// Classify one line. `None` means the line does not match the grammar.
    fn process_line(&mut self, line: &'a str, line_number: usize) -> Option<()> {
        let code = strip_comment(line).trim();
        if code.is_empty() {
            return Some(());
        }

        let statement = if let Some(rest) = code.strip_prefix(':') {
            // :ADDRESS:VALUE
            let (address, value) = rest.split_once(':')?;
            Statement::Data {
                address: parse_operand(address.trim())?,
                value: parse_operand(value.trim())?,
            }
        } else if let Some((name, value)) = code.split_once('=') {
            // NAME = VALUE
            let name = parse_name(name.trim())?;
            let value = parse_operand(value.trim())?;
            self.define(name, Symbol::Constant(value))?;
            return Some(());
        } else if let Some((label, rest)) = code.split_once(':') {
            // LABEL: [instruction]
            let label = parse_name(label.trim())?;
            self.define(label, Symbol::Label(self.next_address))?;
            let rest = rest.trim();
            if rest.is_empty() {
                return Some(());
            }
            parse_instruction(rest)?
        } else {
            parse_instruction(code)?
        };

        if matches!(statement, Statement::Instruction { .. }) {
            self.next_address += 1;
        }
        self.statements.push(SourceStatement { line_number, line, statement });
        Some(())
    }

    /// Add a symbol. Redefinitions are rejected.
    fn define(&mut self, name: String, symbol: Symbol) -> Option<()> {
        if self.symbols.contains_key(&name) {
            return None;
        }
        self.symbols.insert(name, symbol);
        Some(())
    }

    /// Resolve an operand to a number, following constant chains.
    fn resolve(&self, operand: &Operand) -> Option<i64> {
        let mut current = operand;
        // A chain longer than the symbol table must contain a cycle.
        for _ in 0..=self.symbols.len() {
            match current {
                Operand::Number(value) => return Some(*value),
                Operand::Name(name) => match self.symbols.get(name)? {
                    Symbol::Label(addr) => return Some(*addr as i64),
                    Symbol::Constant(next) => current = next,
                },
            }
        }
        None
    }
}

fn syntax_error(line_number: usize, line: &str) -> ParseError {
    ParseError::Syntax { line_number, line: line.to_string() }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_instruction(text: &str) -> Option<Statement> {
    let mut parts = text.split_whitespace();
    let kind = InstructionKind::from_mnemonic(parts.next()?)?;
    let operand = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let operand = match (kind.has_address(), operand) {
        (true, Some(op)) => Some(parse_operand(op)?),
        (false, None) => None,
        _ => return None,
    };
    Some(Statement::Instruction { kind, operand })
}

fn parse_operand(token: &str) -> Option<Operand> {
    if let Some(value) = parse_number(token) {
        return Some(Operand::Number(value));
    }
    parse_name(token).map(Operand::Name)
}

/// Parse a decimal, `$hex`, `0x` hex or `0b` binary literal.
fn parse_number(token: &str) -> Option<i64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let (radix, digits) = if let Some(hex) = digits.strip_prefix('$') {
        (16, hex)
    } else if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        (2, bin)
    } else {
        (10, digits)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

/// Names start with a letter or `_` and continue with letters, digits or `_`.
fn parse_name(token: &str) -> Option<String> {
    let mut chars = token.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(token.to_ascii_uppercase())
}

/// Errors that can occur during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error on line {line_number}: {line}")]
    Syntax { line_number: usize, line: String },

    #[error("data address {address} on line {line_number} is outside memory: {line}")]
    DataOutOfRange { line_number: usize, line: String, address: i64 },

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

impl ParseError {
    /// The 1-based line the error refers to, if any.
    pub fn line_number(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line_number, .. }
            | ParseError::DataOutOfRange { line_number, .. } => Some(*line_number),
            ParseError::ProgramTooLarge { .. } | ParseError::Memory(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let source = r#"
            # Simple test program
            LDA 10
            ADD 11
            STO 12
            NOT
        "#;

        let program = parse(source).unwrap();
        assert_eq!(
            program.instructions,
            vec![
                Instruction::Lda(10),
                Instruction::Add(11),
                Instruction::Sto(12),
                Instruction::Not,
            ]
        );
        assert_eq!(program.max_pc(), Some(3));
    }

    #[test]
    fn test_case_insensitive_mnemonics() {
        let program = parse("lda 1\nInc\nxOr 2").unwrap();
        assert_eq!(
            program.instructions,
            vec![Instruction::Lda(1), Instruction::Inc, Instruction::Xor(2)]
        );
    }

    #[test]
    fn test_literals() {
        let program = parse("LDA $7D\nLDA 0x400\nLDA 0b101\nLDA 4097").unwrap();
        assert_eq!(
            program.instructions,
            vec![
                Instruction::Lda(0x7D),
                Instruction::Lda(0x400),
                Instruction::Lda(5),
                Instruction::Lda(1),
            ]
        );
    }

    #[test]
    fn test_labels_and_forward_references() {
        let source = r#"
        START:
            BRZ END
            NOP
        END: INC
            BRZ START
        "#;

        let program = parse(source).unwrap();
        assert_eq!(
            program.instructions,
            vec![Instruction::Brz(2), Instruction::Nop, Instruction::Inc, Instruction::Brz(0)]
        );
        assert_eq!(program.symbols["START"], 0);
        assert_eq!(program.symbols["END"], 2);
    }

    #[test]
    fn test_constants() {
        let source = "LDA counter\nCOUNTER = LIMIT\nlimit = $10";
        let program = parse(source).unwrap();
        assert_eq!(program.instructions, vec![Instruction::Lda(16)]);
        assert_eq!(program.symbols["COUNTER"], 16);
    }

    #[test]
    fn test_data_directive() {
        let mut state = ArchitecturalState::new();
        let program = parse_into(":0x400:20\nLDA 0x400", &mut state).unwrap();
        assert_eq!(state.mem.read_halfword(0x400).unwrap(), 20);
        assert_eq!(program.instructions[0].address(), Some(0x400));
        assert_eq!(state.mem.read_halfword(0).unwrap(), Instruction::Lda(0x400).encode());
        assert_eq!(state.max_pc, Some(0));
    }

    #[test]
    fn test_data_values_wrap() {
        let program = parse("X = 7\n:X:-1\n:$10:65537").unwrap();
        assert_eq!(program.data, vec![(7, 0xFFFF), (0x10, 1)]);
        assert!(program.instructions.is_empty());
        assert_eq!(program.max_pc(), None);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let program = parse("\n# only a comment\n   \nINC # trailing\n").unwrap();
        assert_eq!(program.instructions, vec![Instruction::Inc]);
    }

    #[test]
    fn test_syntax_error_line_number() {
        let err = parse("INC\n\nLDA\nINC").unwrap_err();
        assert_eq!(err, ParseError::Syntax { line_number: 3, line: "LDA".into() });
        assert_eq!(err.line_number(), Some(3));
    }

    #[test]
    fn test_rejected_lines() {
        for bad in ["HLT", "INC 5", "ADD 1 2", "1ABC:", "LDA foo bar", ":5", "X = ", "LDA -1"] {
            assert!(
                matches!(parse(bad), Err(ParseError::Syntax { line_number: 1, .. })),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_undefined_and_duplicate_names() {
        assert!(matches!(
            parse("INC\nLDA missing"),
            Err(ParseError::Syntax { line_number: 2, .. })
        ));
        assert!(matches!(
            parse("A:\nINC\nA:\nINC"),
            Err(ParseError::Syntax { line_number: 3, .. })
        ));
        assert!(matches!(
            parse("A = B\nB = A\nLDA A"),
            Err(ParseError::Syntax { line_number: 3, .. })
        ));
    }

    #[test]
    fn test_failed_parse_leaves_memory() {
        let mut state = ArchitecturalState::new();
        let err = parse_into(":5:9\nINC\nBOGUS", &mut state).unwrap_err();
        assert_eq!(err.line_number(), Some(3));
        assert_eq!(state.mem.read_halfword(5).unwrap(), 0);
        assert_eq!(state.mem.read_halfword(0).unwrap(), 0);
        assert_eq!(state.max_pc, None);
    }

    #[test]
    fn test_data_out_of_range() {
        let mut state = ArchitecturalState::with_memory_size(16);
        assert_eq!(
            parse_into("INC\n:16:1", &mut state),
            Err(ParseError::DataOutOfRange { line_number: 2, line: ":16:1".into(), address: 16 })
        );
    }

    #[test]
    fn test_program_too_large() {
        let mut state = ArchitecturalState::with_memory_size(2);
        assert_eq!(
            parse_into("INC\nINC\nINC", &mut state),
            Err(ParseError::ProgramTooLarge { size: 3, available: 2 })
        );
    }

    #[test]
    fn test_program_limited_by_address_space() {
        let mut state = ArchitecturalState::with_memory_size(4200);
        let source = "NOP\n".repeat(4097);
        assert_eq!(
            parse_into(&source, &mut state),
            Err(ParseError::ProgramTooLarge { size: 4097, available: 4096 })
        );
        assert_eq!(state.max_pc, None);
    }
}
