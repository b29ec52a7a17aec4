//! Object/file references.
//!
//! Script lines name external resources with the shape `[?][@!]name`:
//! a leading `?` means "ok if missing", `@` marks a file reference, `!`
//! an object reference whose meaning belongs to the batch executor, and a
//! bare name is treated as a file path. The core resolves file-kind and
//! bare references against the filesystem; object references surface as
//! typed errors so the caller can handle them.

use crate::error::ScanError;
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{opt, value},
    IResult,
};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `@name`
    File,
    /// `!name`
    Object,
    /// plain `name`, resolved as a file path
    Bare,
}

/// A parsed `[?][@!]name` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub optional: bool,
    pub kind: RefKind,
    pub name: String,
}

/// Parse the optional `?` marker.
fn optional_marker(input: &str) -> IResult<&str, bool> {
    let (input, q) = opt(char('?'))(input)?;
    Ok((input, q.is_some()))
}

/// Parse the `@` / `!` kind marker.
fn kind_marker(input: &str) -> IResult<&str, RefKind> {
    let (input, kind) = opt(alt((
        value(RefKind::File, char('@')),
        value(RefKind::Object, char('!')),
    )))(input)?;
    Ok((input, kind.unwrap_or(RefKind::Bare)))
}

fn reference(input: &str) -> IResult<&str, (bool, RefKind)> {
    let (input, optional) = optional_marker(input)?;
    let (input, kind) = kind_marker(input)?;
    Ok((input, (optional, kind)))
}

impl SourceRef {
    pub fn parse(text: &str) -> Result<Self, ScanError> {
        let text = text.trim();
        let (name, (optional, kind)) =
            reference(text).map_err(|e| ScanError::BadReference {
                text: text.to_string(),
                reason: e.to_string(),
            })?;
        if name.is_empty() {
            return Err(ScanError::BadReference {
                text: text.to_string(),
                reason: "empty name".to_string(),
            });
        }
        Ok(SourceRef {
            optional,
            kind,
            name: name.to_string(),
        })
    }

    /// A non-optional reference to a plain file path.
    pub fn path(name: &str) -> Self {
        SourceRef {
            optional: false,
            kind: RefKind::Bare,
            name: name.to_string(),
        }
    }

    /// Whether the named resource exists on the filesystem.
    pub fn exists(&self) -> bool {
        Path::new(&self.name).exists()
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "?")?;
        }
        match self.kind {
            RefKind::File => write!(f, "@")?,
            RefKind::Object => write!(f, "!")?,
            RefKind::Bare => {}
        }
        write!(f, "{}", self.name)
    }
}
