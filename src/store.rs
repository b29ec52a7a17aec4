//! Line Store: ingestion of raw script text into cleaned lines.
//!
//! Ingestion runs once per open. Each raw line is optionally
//! whitespace-compressed, checked against the comment rules, optionally
//! trimmed, and kept together with its original 1-based line number.
//! Blank lines, comment-only lines, and lines that become blank after a
//! trailing comment is stripped never reach the store.
//!
//! Comment markers are `#`, `//` and `--`. A marker only counts outside
//! single/double quotes and when it sits at the start of the line or right
//! after whitespace, so `http://host` and `"a # b"` survive intact.

use crate::error::ScanError;
use crate::source::{RefKind, SourceRef};
use std::io::Read;
use std::path::Path;

/// One cleaned line, tagged with the raw line number it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

/// Immutable ordered sequence of cleaned lines.
#[derive(Debug, Clone)]
pub struct LineStore {
    source: String,
    lines: Vec<Line>,
}

/// Collapse every run of whitespace to a single space.
fn compress_whitespace(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_run = false;
    for ch in line.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// Find the byte offset where a comment starts, if any.
///
/// Quote state is tracked so markers inside `'...'` or `"..."` are ignored.
fn comment_start(line: &str) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    let mut after_ws = true;
    let mut iter = line.char_indices().peekable();

    while let Some((i, ch)) = iter.next() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double && after_ws => return Some(i),
            '/' | '-' if !in_single && !in_double && after_ws => {
                if iter.peek().map(|&(_, c)| c) == Some(ch) {
                    return Some(i);
                }
            }
            _ => {}
        }
        after_ws = ch.is_whitespace();
    }
    None
}

/// Clean one raw line; `None` means the line is dropped.
fn clean_line(raw: &str, trim: bool, compress: bool) -> Option<String> {
    let line = if compress {
        compress_whitespace(raw)
    } else {
        raw.to_string()
    };

    let line = match comment_start(&line) {
        Some(0) => return None,
        Some(at) => line[..at].to_string(),
        None => line,
    };
    if line.trim().is_empty() {
        return None;
    }

    if trim {
        Some(line.trim().to_string())
    } else {
        Some(line)
    }
}

impl LineStore {
    /// Build a store from already-loaded text.
    pub fn from_text(source: &str, text: &str, trim: bool, compress: bool) -> Self {
        let mut lines = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            if let Some(cleaned) = clean_line(raw, trim, compress) {
                lines.push(Line {
                    number: idx + 1,
                    text: cleaned,
                });
            }
        }
        LineStore {
            source: source.to_string(),
            lines,
        }
    }

    pub fn from_path(path: &Path, trim: bool, compress: bool) -> Result<Self, ScanError> {
        let name = path.display().to_string();
        if !path.exists() {
            return Err(ScanError::NotFound {
                resource: name,
                state: "(open)".to_string(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&name, &text, trim, compress))
    }

    pub fn from_reader<R: Read>(
        source: &str,
        mut reader: R,
        trim: bool,
        compress: bool,
    ) -> Result<Self, ScanError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::from_text(source, &text, trim, compress))
    }

    /// Resolve a parsed `[?][@!]name` reference.
    ///
    /// A missing optional resource yields an empty store; a missing
    /// required one is a `NotFound` error. Object references cannot be
    /// opened here at all.
    pub fn from_ref(sref: &SourceRef, trim: bool, compress: bool) -> Result<Self, ScanError> {
        if sref.kind == RefKind::Object {
            return Err(ScanError::Unresolvable(sref.name.clone()));
        }
        if !sref.exists() {
            if sref.optional {
                return Ok(Self::empty(&sref.name));
            }
            return Err(ScanError::NotFound {
                resource: sref.name.clone(),
                state: "(open)".to_string(),
            });
        }
        Self::from_path(Path::new(&sref.name), trim, compress)
    }

    pub fn empty(source: &str) -> Self {
        LineStore {
            source: source.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }
}
