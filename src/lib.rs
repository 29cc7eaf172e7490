pub mod util;
pub mod lox;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;
use clap::Parser as ClapParser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use crate::lox::ast::Stmt;
use crate::lox::error::LoxError;
use crate::lox::interpreter::Interpreter;
use crate::lox::lexer::scan;
use crate::lox::parser::parse;
use crate::lox::printer::AstPrinter;
use crate::lox::sink::{ConsoleReporter, Output, Reporter, Stdout};

/// Exit code for lexical and parse errors.
pub const EXIT_DATA_ERROR: u8 = 65;
/// Exit code for runtime errors.
pub const EXIT_SOFTWARE_ERROR: u8 = 70;
/// Exit code when the input file can't be read.
pub const EXIT_IO_ERROR: u8 = 74;

static TRACING_INIT: Once = Once::new();

#[derive(ClapParser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    #[clap(help = "Script to run; starts an interactive prompt when omitted")]
    pub input: Option<PathBuf>,

    #[clap(long, help = "Print the syntax tree of each expression instead of running the script")]
    pub print_ast: bool,

    #[clap(short, long, help = "Print verbose log output")]
    pub verbose: bool,
}

/// Installs the log subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        let default_level = if verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
            .with(filter)
            .init();
    });
}

/// Scans, parses and runs one source text against `interpreter`.
/// Nothing is executed unless the whole text scanned and parsed cleanly.
pub fn run_source<O: Output>(source: &str, interpreter: &mut Interpreter<O>) -> Result<(), LoxError> {
    let tokens = scan(source)?;
    let statements = parse(tokens)?;

    interpreter.interpret(&statements)?;
    Ok(())
}

/// Writes the syntax tree of every top-level expression and print statement to `output`.
pub fn print_ast(source: &str, output: &mut impl Output) -> Result<(), LoxError> {
    let tokens = scan(source)?;
    let statements = parse(tokens)?;

    for stmt in &statements {
        if let Stmt::Expression(expr) | Stmt::Print(expr) = stmt {
            output.write_line(&AstPrinter::new().print(expr));
        }
    }

    Ok(())
}

pub fn run() -> ExitCode {
    let config: Config = Config::parse();
    init_tracing(config.verbose);

    match &config.input {
        Some(path) => run_file(path, &config),
        None => run_prompt(),
    }
}

pub fn run_file(path: &Path, config: &Config) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read {}: {}", path.to_string_lossy(), err);
            return ExitCode::from(EXIT_IO_ERROR);
        },
    };

    let result = if config.print_ast {
        print_ast(&source, &mut Stdout)
    } else {
        run_source(&source, &mut Interpreter::new())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            ConsoleReporter.report_error(&error);

            if error.is_static() {
                ExitCode::from(EXIT_DATA_ERROR)
            } else {
                ExitCode::from(EXIT_SOFTWARE_ERROR)
            }
        },
    }
}

/// Reads and runs one line at a time. Definitions persist between lines.
pub fn run_prompt() -> ExitCode {
    let mut interpreter = Interpreter::new();
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");

        if std::io::stdout().flush().is_err() {
            return ExitCode::from(EXIT_IO_ERROR);
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                eprintln!("Could not read input: {}", err);
                return ExitCode::from(EXIT_IO_ERROR);
            },
            None => return ExitCode::SUCCESS,
        };

        if let Err(error) = run_source(&line, &mut interpreter) {
            ConsoleReporter.report_error(&error);
        }
    }
}
