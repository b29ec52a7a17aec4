//! bscript - scripting front-end for batch transformation runs
//!
//! # Overview
//!
//! bscript reads human-authored script/config files (or inline text) and
//! turns them into a clean stream of logical command lines. Comments,
//! quoting, macro substitution, file inclusion and the built-in commands
//! (`echo`, `print`, `include`, `setProperty`, `properties`, `sleep`) are
//! handled transparently; the batch executor that consumes the stream
//! only ever sees ordinary lines, already expanded, in file order across
//! arbitrarily nested includes.
//!
//! # Core concepts
//!
//! ## Executing scanner
//!
//! [`Scanner`] hides built-ins: `print` writes to the output sink,
//! `include` splices another file in place, `setProperty`/`properties`
//! feed the shared [`PropertyRegistry`], and none of those lines reach
//! the caller.
//!
//! ## Classifying scanner
//!
//! [`CommandScanner`] is the sibling that executes nothing: each advance
//! labels the line with one [`Command`] variant (`makeNewRoot`, `batch`,
//! `foreach`/`end`, `saveTo`, `useAsInput`, ...) and leaves the decision
//! to the caller. Loop constructs re-run a body by calling
//! [`CommandScanner::duplicate`] and advancing the copy.
//!
//! # Example
//!
//! ```rust
//! use bscript::{BasicEvaluator, PropertyRegistry, Scanner};
//! use std::rc::Rc;
//!
//! let mut scanner = Scanner::script(PropertyRegistry::shared(), Rc::new(BasicEvaluator)).unwrap();
//! scanner.open_literal("inline", "setProperty who=world\nhello ${who}\n", true, false);
//! assert_eq!(scanner.next_line().unwrap(), "hello world");
//! ```

pub mod cursor;
pub mod error;
pub mod expand;
pub mod grammar;
pub mod patterns;
pub mod registry;
pub mod scanner;
pub mod source;
pub mod store;

// Re-export commonly used items
pub use cursor::LineCursor;
pub use error::ScanError;
pub use expand::{BasicEvaluator, MacroError, MacroEvaluator, Verbatim};
pub use grammar::CommandScanner;
pub use patterns::{Command, Grammar, PrintArg};
pub use registry::{PropertyRegistry, SharedRegistry, ENVIRONMENT_LABEL, GLOBALS_LABEL};
pub use scanner::{BuiltinSet, Scanner};
pub use source::{RefKind, SourceRef};
pub use store::{Line, LineStore};

use std::rc::Rc;

/// Convenience function: run inline script text through a full script
/// scanner and collect the surfaced lines. `print` output goes to stdout.
pub fn run(script: &str) -> Result<Vec<String>, ScanError> {
    let mut scanner = Scanner::script(PropertyRegistry::shared(), Rc::new(BasicEvaluator))?;
    scanner.open_literal("(inline)", script, true, false);
    let mut lines = Vec::new();
    while let Some(line) = scanner.try_next_line()? {
        lines.push(line);
    }
    Ok(lines)
}
