//! Toy Simulator - CLI Entry Point
//!
//! Commands:
//! - `toy-sim run <program>` - Run an assembly file
//! - `toy-sim debug <program>` - Interactive debugger
//! - `toy-sim asm <source>` - Print the machine-code listing
//! - `toy-sim signals [MNEMONIC]` - Show the micro-program table
//! - `toy-sim test` - Built-in self-test

use clap::{Parser, Subcommand, ValueEnum};
use toysim::asm::MachineCodeFormat;
use toysim::{SimConfig, Simulation};

#[derive(Parser)]
#[command(name = "toy-sim")]
#[command(version = "0.1.0")]
#[command(about = "A cycle-level simulator for the 16-bit Toy accumulator computer")]
struct Cli {
    /// JSON settings file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Number of addressable halfwords (overrides the settings file)
    #[arg(long, global = true)]
    memory_size: Option<usize>,

    /// Log every executed instruction
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until PC passes its last instruction
    Run {
        /// Path to the assembly file to execute
        program: String,
        /// Maximum number of instructions to run
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Print the final visualization snapshot and metrics as JSON
        #[arg(long)]
        json: bool,
        /// Memory rows to print afterwards, as START:COUNT
        #[arg(short, long)]
        dump: Option<String>,
    },
    /// Interactive debugger
    Debug {
        /// Path to the assembly file to debug
        program: String,
    },
    /// Assemble and print the machine code
    Asm {
        /// Path to the source file
        source: String,
        /// Output number format
        #[arg(short, long, value_enum, default_value_t = Format::Hex)]
        format: Format,
    },
    /// Show the control lines for one or all instructions
    Signals {
        /// Instruction mnemonic, e.g. ADD
        mnemonic: Option<String>,
    },
    /// Run the built-in self-test
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Hex,
    Binary,
}

impl From<Format> for MachineCodeFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Hex => MachineCodeFormat::Hex,
            Format::Binary => MachineCodeFormat::Binary,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.trace {
        logger.filter_level(log::LevelFilter::Trace);
    }
    logger.init();

    let config = load_config(&cli);

    match cli.command {
        Some(Commands::Run { program, max_cycles, json, dump }) => {
            run_program(&program, config, max_cycles, json, dump.as_deref());
        }
        Some(Commands::Debug { program }) => {
            debug_program(&program, config);
        }
        Some(Commands::Asm { source, format }) => {
            assemble_file(&source, format.into());
        }
        Some(Commands::Signals { mnemonic }) => {
            print_signals(mnemonic.as_deref());
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Toy Simulator v0.1.0");
            println!("A 16-bit accumulator computer simulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn load_config(cli: &Cli) -> SimConfig {
    let mut config = match &cli.config {
        Some(path) => match SimConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load settings: {}", e);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    if let Some(size) = cli.memory_size {
        config.memory_size = size;
    }
    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    config
}

fn read_source(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_simulation(path: &str, config: SimConfig) -> Simulation {
    let source = read_source(path);
    let mut sim = Simulation::with_config(config);
    match sim.load_program(&source) {
        Ok(program) => {
            println!("📝 Parsed {} instructions, {} data words", program.instructions.len(), program.data.len());
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
    sim
}

/// Parse `START:COUNT`.
fn parse_dump_range(spec: &str) -> Option<(i64, usize)> {
    let (start, count) = spec.split_once(':')?;
    Some((start.trim().parse().ok()?, count.trim().parse().ok()?))
}

fn run_program(path: &str, config: SimConfig, max_cycles: Option<u64>, json: bool, dump: Option<&str>) {
    println!("🔧 Running: {}", path);

    let max_cycles = max_cycles.unwrap_or(config.max_cycles);
    let mut sim = load_simulation(path, config);

    let executed = match sim.run_limited(max_cycles) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("❌ CPU error at PC={}: {}", sim.state().regs.pc(), e);
            std::process::exit(1);
        }
    };

    let state = sim.state();

    if json {
        let report = serde_json::json!({
            "accumulator": state.regs.accumulator,
            "program_counter": state.regs.pc(),
            "snapshot": state.snapshot(),
            "metrics": state.metrics,
        });
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let accu = state.regs.accumulator;
        println!();
        println!("━━━ Result ━━━");
        println!("Instructions:     {}", executed);
        println!("Branches taken:   {}", state.metrics.branch_count);
        println!("Instr/second:     {:.0}", state.metrics.instructions_per_second);
        println!("PC:               {}", state.regs.pc());
        println!("ACCU:             {:016b} = {} ({})", accu, accu, accu as i16);
    }

    if let Some(spec) = dump {
        let Some((start, count)) = parse_dump_range(spec) else {
            eprintln!("❌ Invalid dump range '{}', expected START:COUNT", spec);
            std::process::exit(1);
        };
        let rows = state
            .mem
            .check_address(start)
            .and_then(|start| state.mem.debug_rows(start..start.saturating_add(count)));
        match rows {
            Ok(rows) => {
                println!();
                println!("━━━ Memory ━━━");
                for row in rows {
                    println!("{:04}: {}  {:>5}  {}  {:>6}", row.address, row.binary, row.unsigned, row.hex, row.signed);
                }
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }
        }
    }

    if !sim.is_done() {
        eprintln!();
        eprintln!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, config: SimConfig) {
    use toysim::tui::run_debugger;

    println!("🔍 Loading: {}", path);
    let sim = load_simulation(path, config);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(sim) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _config: SimConfig) {
    eprintln!("❌ The debugger requires the 'tui' feature");
    std::process::exit(1);
}

fn assemble_file(source_path: &str, format: MachineCodeFormat) {
    use toysim::asm::machine_code_listing;

    let source = read_source(source_path);
    let program = match toysim::parse(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", machine_code_listing(&program.instructions, format));
    for (addr, value) in &program.data {
        println!(":{:04}:{}", addr, value);
    }
}

fn print_signals(mnemonic: Option<&str>) {
    use toysim::cpu::SIGNAL_NAMES;
    use toysim::{InstructionKind, MicroProgramTable};

    let kinds: Vec<InstructionKind> = match mnemonic {
        Some(name) => match InstructionKind::from_mnemonic(name) {
            Some(kind) => vec![kind],
            None => {
                eprintln!("❌ Unknown mnemonic: {}", name);
                std::process::exit(1);
            }
        },
        None => InstructionKind::ALL.to_vec(),
    };

    println!("{:<5}{}", "", SIGNAL_NAMES.join(" "));
    for kind in kinds {
        let row: Vec<String> = SIGNAL_NAMES
            .iter()
            .zip(MicroProgramTable::get_values(kind))
            .map(|(name, on)| format!("{:^width$}", u8::from(on), width = name.len()))
            .collect();
        println!("{:<5}{}", kind.mnemonic(), row.join(" "));
    }
}

fn run_self_test() {
    use toysim::Instruction;

    println!("━━━ Toy Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut check = |name: &str, ok: bool| {
        print!("{} ... ", name);
        if ok {
            println!("✓");
            passed += 1;
        } else {
            println!("✗");
            failed += 1;
        }
    };

    check("STO 125 encodes to 007D", Instruction::Sto(125).to_hex() == "007D");
    check("ADD 5 encodes to 12293", Instruction::Add(5).encode() == 12293);
    check("opcode 15 decodes to NOP", Instruction::decode(0xF000) == Instruction::Nop);

    let mut sim = Simulation::new();
    let program_ok = sim
        .load_program("INC\nINC\nSTO 1024\nADD 1024\nSTO 1025\nINC\nLDA 4095")
        .is_ok()
        && sim.run().is_ok();
    let state = sim.state();
    check(
        "sample program",
        program_ok
            && state.mem.read_halfword(1024) == Ok(2)
            && state.mem.read_halfword(1025) == Ok(4)
            && state.regs.accumulator == 0,
    );

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
