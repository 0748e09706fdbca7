//! Run-and-capture.
//!
//! A backend redirects the interpreter's standard streams into fresh sinks,
//! executes the source as one opaque call, restores the streams and reports
//! what happened as a [`Capture`]. [`execute`] then picks the single string
//! shown to the user.

use async_trait::async_trait;
use log::debug;

use crate::error::RuntimeError;

/// The embedded interpreter.
#[async_trait(?Send)]
pub trait Runtime {
    /// Execute `source` with stdout and stderr captured.
    ///
    /// Faults raised by the source end up in [`Outcome`]; `Err` is reserved
    /// for the invocation itself failing.
    async fn run_captured(&self, source: &str) -> Result<Capture, RuntimeError>;

    /// Read `path` as UTF-8 from the runtime's own filesystem.
    /// `Ok(None)` when the path does not exist.
    fn read_file(&self, path: &str) -> Result<Option<String>, RuntimeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ran to the end. `value` is the stringified last expression, if any.
    Completed { value: Option<String> },
    /// The source asked the interpreter to stop early (`sys.exit`).
    Exited { description: String },
    /// Uncaught fault, with its full formatted traceback.
    Raised { traceback: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub stdout: String,
    pub stderr: String,
    pub outcome: Outcome,
}

impl Capture {
    /// Error sink, then output sink, then result, then nothing.
    ///
    /// A traceback is written to the error sink, so it wins over anything
    /// the program printed before failing.
    pub fn into_output(self) -> String {
        let Capture {
            stdout,
            mut stderr,
            outcome,
        } = self;
        let result = match outcome {
            Outcome::Completed { value } => value,
            Outcome::Exited { description } => Some(description),
            Outcome::Raised { traceback } => {
                stderr.push_str(&traceback);
                None
            }
        };
        if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            result.unwrap_or_default()
        }
    }
}

pub async fn execute(source: &str, runtime: &dyn Runtime) -> Result<String, RuntimeError> {
    debug!("Executing {} bytes of source", source.len());
    let capture = runtime.run_captured(source).await?;
    Ok(capture.into_output())
}
