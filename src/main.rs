use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use lox_interpreter as lox;

use lox::ast::Stmt;
use lox::ast_printer::{AstPrinter, RpnPrinter};
use lox::error::ErrorReporter;
use lox::parser::Parser;
use lox::runner::{Lox, EXIT_COMPILE_ERROR};
use lox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Script to run; starts an interactive prompt when omitted
    script: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON instead of `TYPE lexeme literal`
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints each statement's syntax tree
    Parse {
        filename: PathBuf,

        /// Print expression statements in reverse-Polish notation
        #[arg(long)]
        rpn: bool,
    },
}

/// Reads the contents of a file into a String
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // [module:line] - message, module path without the crate prefix
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("lox_interpreter::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let mut tokenized = true;

    for result in Scanner::new(&source) {
        match result {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if json {
                    println!("{}", serde_json::to_string(&token)?);
                } else {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");

        std::process::exit(EXIT_COMPILE_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &PathBuf, rpn: bool) -> Result<()> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;

    let mut reporter = ErrorReporter::stderr();
    let tokens = Scanner::new(&source).scan_tokens(&mut reporter);
    let statements = Parser::new(tokens, &mut reporter).parse();

    if reporter.had_error() {
        debug!("Parse failed, exiting with code 65");

        std::process::exit(EXIT_COMPILE_ERROR);
    }

    for stmt in &statements {
        let printed = match stmt {
            Stmt::Expression(expr) if rpn => RpnPrinter::print(expr),
            _ => AstPrinter::print_stmt(stmt),
        };

        debug!("AST: {}", printed);
        println!("{}", printed);
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run_file(script: &PathBuf) -> Result<()> {
    info!("Running script {:?}", script);
    let source = read_file(script)?;

    let mut lox = Lox::new();
    lox.run(&source);

    let code = lox.exit_code();
    if code != 0 {
        debug!("Script failed, exiting with code {}", code);

        std::process::exit(code);
    }

    Ok(())
}

fn run_prompt() -> Result<()> {
    info!("Starting REPL");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut lox = Lox::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        lox.run(&line);
        lox.reset_error();
    }

    println!();
    info!("REPL session ended");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        // RUST_LOG still applies; silent otherwise
        Builder::new()
            .filter_level(log::LevelFilter::Off)
            .parse_env("RUST_LOG")
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match (&args.command, &args.script) {
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(filename, *json),
        (Some(Commands::Parse { filename, rpn }), _) => parse(filename, *rpn),
        (None, Some(script)) => run_file(script),
        (None, None) => run_prompt(),
    }
}
