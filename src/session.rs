//! The run context tying the four stages together.
//!
//! A [`Session`] is created once per file run or once per interactive prompt.
//! It owns the interpreter (and with it the global scope, which persists
//! between prompt lines) and the counter that keeps AST node ids unique
//! across every program it runs. Error flags are per‑[`run`](Session::run):
//! each call returns a fresh [`RunStatus`].

use std::io::Write;

use log::info;

use crate::error::ScriptError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_all;

/// Stack size for a thread that drives a session. Evaluation recurses on
/// the native stack once per nested expression and call.
pub const STACK_SIZE: usize = 256 * 1024 * 1024;

/// Receives diagnostics from a [`Session`].
pub trait Reporter {
    /// A scan, parse or resolve error. `context` is empty, ` at end`, or
    /// ` at 'lexeme'`.
    fn error(&mut self, line: usize, context: &str, message: &str);

    /// The single runtime error that stopped a run.
    fn runtime_error(&mut self, line: usize, message: &str);
}

/// Writes diagnostics to stderr in the conventional formats.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn error(&mut self, line: usize, context: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, context, message);
    }

    fn runtime_error(&mut self, line: usize, message: &str) {
        eprintln!("{}\n[line {}]", message, line);
    }
}

/// Result flags of one [`Session::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// A lex, parse or resolve error was reported; nothing was executed.
    pub had_static_error: bool,

    /// Execution started and stopped at a runtime error.
    pub had_runtime_error: bool,
}

impl RunStatus {
    /// Conventional process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.had_static_error {
            65
        } else if self.had_runtime_error {
            70
        } else {
            0
        }
    }
}

pub struct Session<R: Reporter> {
    interpreter: Interpreter,
    reporter: R,
    next_id: usize,
}

impl Session<StderrReporter> {
    /// Session printing to stdout and reporting to stderr.
    pub fn new() -> Self {
        Session::with_parts(Interpreter::new(), StderrReporter)
    }
}

impl Default for Session<StderrReporter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Reporter> Session<R> {
    /// Session with a custom print sink and reporter.
    pub fn with_output(out: Box<dyn Write>, reporter: R) -> Self {
        Session::with_parts(Interpreter::with_output(out), reporter)
    }

    fn with_parts(interpreter: Interpreter, reporter: R) -> Self {
        info!("Session created");

        Session {
            interpreter,
            reporter,
            next_id: 0,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Scan, parse, resolve and (if all three were clean) evaluate `source`.
    pub fn run(&mut self, source: &str) -> RunStatus {
        let mut status = RunStatus::default();

        let (tokens, lex_errors) = scan_all(source);
        for e in &lex_errors {
            self.report(e);
        }
        status.had_static_error = !lex_errors.is_empty();

        let mut parser = Parser::with_first_id(&tokens, self.next_id);
        let parsed = parser.parse();
        self.next_id = parser.next_id();

        let statements = match parsed {
            Ok(statements) => statements,
            Err(errors) => {
                for e in &errors {
                    self.report(e);
                }
                status.had_static_error = true;
                return status;
            }
        };

        if status.had_static_error {
            return status;
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            for e in &errors {
                self.report(e);
            }
            status.had_static_error = true;
            return status;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.report(&e);
            status.had_runtime_error = true;
        }

        info!("Run finished: {:?}", status);

        status
    }

    fn report(&mut self, error: &ScriptError) {
        match error {
            ScriptError::Lex { message, line } => self.reporter.error(*line, "", message),

            ScriptError::Parse {
                message,
                location,
                line,
            }
            | ScriptError::Resolve {
                message,
                location,
                line,
            } => self.reporter.error(*line, location, message),

            ScriptError::Runtime { message, line } => self.reporter.runtime_error(*line, message),

            // I/O on the print sink has no source line.
            other => self
                .reporter
                .runtime_error(other.line().unwrap_or(0), &other.to_string()),
        }
    }
}
