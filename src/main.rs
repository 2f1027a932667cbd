use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use walkjs as js;

use js::ast_printer::AstPrinter;
use js::interpreter::Interpreter;
use js::parser::Parser;
use js::resolver::Resolver;
use js::scanner::Scanner;
use js::session::STACK_SIZE;
use js::{ScriptError, Session};

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a small JavaScript-like language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit the token stream as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parses a program from a file and prints its AST
    Parse { filename: PathBuf },

    /// Runs a program from a file, or starts an interactive prompt
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source = String::from_utf8(buf).map_err(ScriptError::from)?;
    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'walkjs::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("walkjs::")
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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let mut tokens = Vec::new();
    let mut tokenized = true;

    for item in Scanner::new(&source) {
        match item {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: PathBuf) -> Result<()> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;
    let (tokens, lex_errors) = js::scanner::scan_all(&source);

    for e in &lex_errors {
        eprintln!("{}", e);
    }

    let mut parser = Parser::new(&tokens);
    match parser.parse() {
        Ok(statements) if lex_errors.is_empty() => {
            info!("Parsed {} statement(s)", statements.len());

            let mut interpreter = Interpreter::new();
            if let Err(errors) = Resolver::new(&mut interpreter).resolve(&statements) {
                for e in &errors {
                    eprintln!("{}", e);
                }
                std::process::exit(65);
            }

            let ast_str = AstPrinter::print_program(&statements);
            debug!("AST: {}", ast_str);
            println!("{}", ast_str);
        }

        Ok(_) => std::process::exit(65),

        Err(errors) => {
            for e in &errors {
                debug!("Parse debug: {}", e);
                eprintln!("{}", e);
            }
            std::process::exit(65);
        }
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run_file(filename: PathBuf) -> Result<()> {
    info!("Running Run subcommand");
    let source = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let mut session = Session::new();
    let status = session.run(&source);

    let code = status.exit_code();
    if code != 0 {
        debug!("Run failed with {:?}, exiting with code {}", status, code);
        std::process::exit(code);
    }

    info!("Program executed successfully");
    Ok(())
}

/// Line-by-line prompt. Globals persist between lines; errors on one line
/// never end the prompt.
fn run_prompt() -> Result<()> {
    info!("Starting interactive prompt");
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read = input
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            println!();
            break;
        }

        let status = session.run(&line);
        debug!("Prompt line finished: {:?}", status);
    }

    info!("Prompt closed");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    // Scripts recurse on the native stack; give them a big one.
    let worker = thread::Builder::new()
        .name("walkjs".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || dispatch(args.commands))
        .context("Failed to spawn interpreter thread")?;

    worker
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))?
}

fn dispatch(commands: Commands) -> Result<()> {
    match commands {
        Commands::Tokenize { filename, json } => tokenize(filename, json),

        Commands::Parse { filename } => parse(filename),

        Commands::Run { filename } => match filename {
            Some(filename) => run_file(filename),
            None => run_prompt(),
        },
    }
}
