#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use walkjs::{Reporter, RunStatus, Session};

/// A print sink the test keeps a handle to after handing a clone to the
/// interpreter.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps every diagnostic in the exact text the stderr reporter would print.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub errors: Vec<String>,
    pub runtime_errors: Vec<String>,
}

impl Reporter for CollectingReporter {
    fn error(&mut self, line: usize, context: &str, message: &str) {
        self.errors
            .push(format!("[line {}] Error{}: {}", line, context, message));
    }

    fn runtime_error(&mut self, line: usize, message: &str) {
        self.runtime_errors
            .push(format!("{}\n[line {}]", message, line));
    }
}

pub fn session() -> (Session<CollectingReporter>, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let session = Session::with_output(Box::new(buffer.clone()), CollectingReporter::default());
    (session, buffer)
}

pub struct Outcome {
    pub status: RunStatus,
    pub output: Vec<String>,
    pub errors: Vec<String>,
    pub runtime_errors: Vec<String>,
}

/// Run `source` in a fresh session and capture everything it produced.
pub fn run(source: &str) -> Outcome {
    let (mut session, buffer) = session();
    let status = session.run(source);
    let reporter = session.reporter();

    Outcome {
        status,
        output: buffer.lines(),
        errors: reporter.errors.clone(),
        runtime_errors: reporter.runtime_errors.clone(),
    }
}

/// Run `source` and return its printed lines, failing on any diagnostic.
pub fn output_of(source: &str) -> Vec<String> {
    let outcome = run(source);

    assert!(
        outcome.errors.is_empty() && outcome.runtime_errors.is_empty(),
        "unexpected diagnostics: {:?} {:?}",
        outcome.errors,
        outcome.runtime_errors
    );

    outcome.output
}
