//! Macro evaluator boundary.
//!
//! The substitution algorithm proper belongs to the batch executor; the
//! scanner only needs a pure function from `(text, registry)` to text.
//! [`MacroEvaluator`] is that seam. [`BasicEvaluator`] is a small working
//! resolver so the crate's own binary and tests run stand-alone, and
//! [`Verbatim`] is for callers that expand elsewhere.

use crate::registry::{PropertyRegistry, ENVIRONMENT_LABEL};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    #[error("undefined reference ${{{0}}}")]
    Undefined(String),
    #[error("unterminated macro reference in `{0}`")]
    Unterminated(String),
}

/// Pure expansion of `${...}` references against the registry.
/// Implementations must never mutate the registry.
pub trait MacroEvaluator {
    fn evaluate(
        &self,
        verbose: bool,
        text: &str,
        registry: &PropertyRegistry,
    ) -> Result<String, MacroError>;
}

/// No-op evaluator: returns the text unchanged.
pub struct Verbatim;

impl MacroEvaluator for Verbatim {
    fn evaluate(
        &self,
        _verbose: bool,
        text: &str,
        _registry: &PropertyRegistry,
    ) -> Result<String, MacroError> {
        Ok(text.to_string())
    }
}

/// Reference resolver for `${key}` and `${label:key}`.
///
/// `${key}` is looked up in the globals table, then in the environment
/// table. `${label:key}` is looked up in the named table only. Undefined
/// references are errors; resolved values are spliced in verbatim and not
/// re-scanned.
pub struct BasicEvaluator;

impl BasicEvaluator {
    fn resolve(reference: &str, registry: &PropertyRegistry) -> Option<String> {
        if let Some((label, key)) = reference.split_once(':') {
            return registry.get(label, key).map(String::from);
        }
        registry
            .global(reference)
            .or_else(|| registry.get(ENVIRONMENT_LABEL, reference))
            .map(String::from)
    }
}

impl MacroEvaluator for BasicEvaluator {
    fn evaluate(
        &self,
        verbose: bool,
        text: &str,
        registry: &PropertyRegistry,
    ) -> Result<String, MacroError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(at) = rest.find("${") {
            out.push_str(&rest[..at]);
            let tail = &rest[at + 2..];
            let Some(close) = tail.find('}') else {
                return Err(MacroError::Unterminated(text.to_string()));
            };
            let reference = &tail[..close];
            match Self::resolve(reference, registry) {
                Some(value) => {
                    if verbose {
                        eprintln!("macro: ${{{}}} -> {}", reference, value);
                    }
                    out.push_str(&value);
                }
                None => return Err(MacroError::Undefined(reference.to_string())),
            }
            rest = &tail[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
