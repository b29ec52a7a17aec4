//! The line grammar: one pattern table, two consumers.
//!
//! Both the executing scanner (which hides built-ins) and the classifying
//! scanner (which reports every line) match against this table, so the
//! grammar cannot drift between them. Precedence is fixed: patterns are
//! tried top to bottom and the first match wins; a line that matches
//! nothing is ordinary.
//!
//! The patterns are literals compiled once per scanner family. A pattern
//! that fails to compile is a defect in this file, surfaced as
//! [`ScanError::BadPattern`] so the top-level caller can abort.

use crate::error::ScanError;
use regex::Regex;
use std::rc::Rc;

/// One classified line. Exactly one variant per line, recomputed on every
/// advance, never persisted across lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MakeNewRoot(String),
    Batch(String),
    Foreach,
    End,
    Properties { label: String, file: String },
    SetProperty { key: String, value: String },
    Print(PrintArg),
    SaveTo(String),
    UseAsInput(String),
    Sleep(u64),
    Include(String),
    Ordinary(String),
}

/// Argument of a `print` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintArg {
    /// `print -`: replay the previous output (resolved by the caller).
    Previous,
    Text(String),
}

pub struct Grammar {
    echo: Regex,
    make_new_root: Regex,
    batch: Regex,
    foreach_kw: Regex,
    end_kw: Regex,
    properties: Regex,
    set_property: Regex,
    print: Regex,
    save_to: Regex,
    use_as_input: Regex,
    sleep: Regex,
    include: Regex,
}

impl Grammar {
    pub fn compile() -> Result<Rc<Self>, ScanError> {
        Ok(Rc::new(Grammar {
            echo: Regex::new(r"^\s*echo\s+(\S.*\S)\s*$")?,
            make_new_root: Regex::new(r"^\s*makeNewRoot\s+(\S+)\s*$")?,
            batch: Regex::new(r"^\s*batch\s+(\S+)\s*$")?,
            foreach_kw: Regex::new(r"^\s*foreach\s*$")?,
            end_kw: Regex::new(r"^\s*end\s*$")?,
            properties: Regex::new(r"^\s*properties\s+([^=\s]+)=(\S+)\s*$")?,
            set_property: Regex::new(r"^\s*setProperty\s+([^=\s]+)=(.*)$")?,
            print: Regex::new(r"^\s*print\s+(.+?)\s*$")?,
            save_to: Regex::new(r"^\s*saveTo\s+(\S+)\s*$")?,
            use_as_input: Regex::new(r"^\s*useAsInput\s+(.+?)\s*$")?,
            sleep: Regex::new(r"^\s*sleep\s+(\d+)\s*$")?,
            include: Regex::new(r"^\s*include\s+(\S+)\s*$")?,
        }))
    }

    /// Detect and strip an `echo ` prefix. The remainder is processed as
    /// if it had been authored bare, so echoing composes with every other
    /// command form.
    pub fn strip_echo<'a>(&self, line: &'a str) -> (bool, &'a str) {
        match self.echo.captures(line) {
            Some(caps) => (true, caps.get(1).unwrap().as_str()),
            None => (false, line),
        }
    }

    fn one_arg(re: &Regex, line: &str) -> Option<String> {
        re.captures(line)
            .map(|caps| caps.get(1).unwrap().as_str().to_string())
    }

    fn two_args(re: &Regex, line: &str) -> Option<(String, String)> {
        re.captures(line).map(|caps| {
            (
                caps.get(1).unwrap().as_str().to_string(),
                caps.get(2).unwrap().as_str().to_string(),
            )
        })
    }

    /// Classify one line (echo prefix already removed). First match wins.
    pub fn classify(&self, line: &str) -> Command {
        if let Some(name) = Self::one_arg(&self.make_new_root, line) {
            return Command::MakeNewRoot(name);
        }
        if let Some(file) = Self::one_arg(&self.batch, line) {
            return Command::Batch(file);
        }
        if self.foreach_kw.is_match(line) {
            return Command::Foreach;
        }
        if self.end_kw.is_match(line) {
            return Command::End;
        }
        if let Some((label, file)) = Self::two_args(&self.properties, line) {
            return Command::Properties { label, file };
        }
        if let Some((key, value)) = Self::two_args(&self.set_property, line) {
            return Command::SetProperty { key, value };
        }
        if let Some(arg) = Self::one_arg(&self.print, line) {
            return if arg == "-" {
                Command::Print(PrintArg::Previous)
            } else {
                Command::Print(PrintArg::Text(arg))
            };
        }
        if let Some(target) = Self::one_arg(&self.save_to, line) {
            return Command::SaveTo(target);
        }
        if let Some(input) = Self::one_arg(&self.use_as_input, line) {
            return Command::UseAsInput(input);
        }
        if let Some(secs) = Self::one_arg(&self.sleep, line) {
            let millis = secs.parse::<u64>().unwrap_or(0).saturating_mul(1000);
            return Command::Sleep(millis);
        }
        if let Some(target) = Self::one_arg(&self.include, line) {
            return Command::Include(target);
        }
        Command::Ordinary(line.to_string())
    }
}
