//! Error taxonomy for the scanning front-end.
//!
//! Three classes matter to callers:
//! - resource errors (`NotFound`, `Io`) — normal, reportable, and
//!   suppressed entirely when the reference carries the `?` marker;
//! - macro errors — produced by the evaluator and passed through unchanged;
//! - defect-class errors (`BadPattern`, `Desync`) — no user input can cause
//!   these, so the top-level caller should abort rather than recover.

use crate::expand::MacroError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// A referenced resource does not exist and the reference was not
    /// marked "ok if missing". `state` carries the full include chain of
    /// the line that asked for it.
    #[error("{resource} not found\n  at {state}")]
    NotFound { resource: String, state: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A fallible `next` was called with no line remaining.
    #[error("no more lines at {0}")]
    PastEnd(String),

    /// Reference text that does not match `[?][@!]name`.
    #[error("bad reference `{text}`: {reason}")]
    BadReference { text: String, reason: String },

    /// An object (`!`) reference reached the core resolver, which only
    /// knows how to open files.
    #[error("cannot resolve object reference `{0}` here")]
    Unresolvable(String),

    /// A grammar pattern failed to compile. This is a defect in the
    /// scanner itself, never in user input.
    #[error("grammar pattern failed to compile: {0}")]
    BadPattern(#[from] regex::Error),

    /// A line classified as a built-in during lookahead but failed to
    /// re-match during execution.
    #[error("built-in desync at {state}")]
    Desync { state: String },

    #[error(transparent)]
    Macro(#[from] MacroError),
}

impl ScanError {
    /// True for defect-class errors that indicate a bug in the scanner.
    /// Callers are expected to turn these into a process exit instead of
    /// catching them.
    pub fn is_defect(&self) -> bool {
        matches!(self, ScanError::BadPattern(_) | ScanError::Desync { .. })
    }
}
