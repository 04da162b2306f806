//! fent - the fen language CLI: file execution and an interactive REPL.

mod config;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use fenc_util::Result;
use fenc_vm::Vm;

/// fen - a small dynamically typed, class-based scripting language.
#[derive(Parser, Debug)]
#[command(name = "fent")]
#[command(author = "Fen Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run fen scripts, or start an interactive REPL with no arguments", long_about = None)]
pub(crate) struct Cli {
    /// Script to execute. Omit to start the REPL.
    script: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(short, long, global = true, env = "FENT_VERBOSE")]
    verbose: bool,

    /// Print every function's disassembled bytecode before running it.
    #[arg(long)]
    dump_bytecode: bool,

    /// Trace every instruction and the value stack as it executes.
    #[arg(long)]
    trace_exec: bool,

    /// Collect garbage before every single allocation, to shake out
    /// missing roots.
    #[arg(long)]
    pub(crate) stress_gc: bool,

    /// Heap size, in bytes allocated, that triggers the first collection.
    #[arg(long)]
    pub(crate) gc_threshold: Option<usize>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // `--help`/`--version` exit 0 through clap's own code; a
            // genuine usage error gets the engine's documented code
            // instead of clap's default.
            let code: u8 = if err.exit_code() == 0 { 0 } else { 64 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };
    init_logging(cli.verbose);
    let config = Config::from_cli(&cli);
    let mut vm = Vm::new(config.gc, cli.trace_exec);

    let result = match &cli.script {
        Some(path) => run_file(&mut vm, path, cli.dump_bytecode),
        None => run_repl(&mut vm, cli.dump_bytecode),
    };

    match result {
        Ok(exit_code) => ExitCode::from(exit_code as u8),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(74)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };
    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);
    let _ = tracing_subscriber::registry().with(filter).with(subscriber).try_init();
}

/// Run one script to completion, returning the process exit code the
/// engine assigns to its outcome (0 ok, 65 compile error, 70 runtime error).
fn run_file(vm: &mut Vm, path: &PathBuf, dump_bytecode: bool) -> Result<i32> {
    let source = fs::read_to_string(path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let (outcome, diagnostics) = vm.interpret(&source, &mut out, dump_bytecode);
    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
    }
    Ok(outcome.exit_code())
}

/// Line-by-line REPL. Each line is
/// compiled and run independently — there is no persistent `fun`/`class`
/// state carried between lines beyond what lives in `vm`'s globals and
/// heap.
fn run_repl(vm: &mut Vm, dump_bytecode: bool) -> Result<i32> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            println!();
            return Ok(0);
        }
        let (_, diagnostics) = vm.interpret(&line, &mut out, dump_bytecode);
        for diagnostic in &diagnostics {
            eprintln!("{diagnostic}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_script() {
        let cli = Cli::parse_from(["fent", "hello.fen"]);
        assert_eq!(cli.script, Some(PathBuf::from("hello.fen")));
    }

    #[test]
    fn test_cli_parse_no_script_is_repl() {
        let cli = Cli::parse_from(["fent"]);
        assert_eq!(cli.script, None);
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["fent", "--verbose", "hello.fen"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_dump_bytecode() {
        let cli = Cli::parse_from(["fent", "--dump-bytecode", "hello.fen"]);
        assert!(cli.dump_bytecode);
    }

    #[test]
    fn test_cli_parse_trace_exec() {
        let cli = Cli::parse_from(["fent", "--trace-exec", "hello.fen"]);
        assert!(cli.trace_exec);
    }

    #[test]
    fn test_cli_parse_stress_gc() {
        let cli = Cli::parse_from(["fent", "--stress-gc", "hello.fen"]);
        assert!(cli.stress_gc);
    }

    #[test]
    fn test_cli_parse_gc_threshold() {
        let cli = Cli::parse_from(["fent", "--gc-threshold", "4096", "hello.fen"]);
        assert_eq!(cli.gc_threshold, Some(4096));
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["fent", "hello.fen"]);
        assert!(!cli.verbose);
        assert!(!cli.dump_bytecode);
        assert!(!cli.trace_exec);
        assert!(!cli.stress_gc);
        assert_eq!(cli.gc_threshold, None);
    }
}
