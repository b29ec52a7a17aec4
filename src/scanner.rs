//! The built-in command processor.
//!
//! A [`Scanner`] sits on a cursor and changes what `next` returns: lines
//! recognized as built-ins are executed and hidden, so the caller only
//! ever sees ordinary command lines, already macro-expanded. `include`
//! stacks a fresh scanner of the same family on top of the current one;
//! while that child has lines, every operation delegates to it, which
//! yields a depth-first traversal in file order across arbitrarily nested
//! includes.
//!
//! Two built-in sets exist. [`BuiltinSet::Core`] executes `print` and
//! `include`. [`BuiltinSet::Script`] additionally executes `sleep`,
//! `setProperty` and `properties`, tried only after the core set reports
//! "not mine". Includes spawn children of the same set, sharing the
//! property registry, the macro evaluator and the output sink by
//! reference.

use crate::cursor::LineCursor;
use crate::error::ScanError;
use crate::expand::MacroEvaluator;
use crate::patterns::{Command, Grammar, PrintArg};
use crate::registry::{SetOutcome, SharedRegistry};
use crate::source::SourceRef;
use crate::store::LineStore;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinSet {
    /// `print`, `include`
    Core,
    /// core plus `sleep`, `setProperty`, `properties`
    Script,
}

#[derive(Clone)]
pub struct Scanner {
    cursor: Option<LineCursor>,
    /// Active nested scanner opened by `include`. At most one direct
    /// child, but the child may have its own, giving an implicit stack.
    child: Option<Box<Scanner>>,
    registry: SharedRegistry,
    evaluator: Rc<dyn MacroEvaluator>,
    output: Rc<RefCell<Box<dyn Write>>>,
    grammar: Rc<Grammar>,
    builtins: BuiltinSet,
    trim: bool,
    compress: bool,
    verbose: bool,
    echoed: bool,
    print_previous: bool,
}

impl Scanner {
    /// Scanner executing only the core built-ins.
    pub fn core(
        registry: SharedRegistry,
        evaluator: Rc<dyn MacroEvaluator>,
    ) -> Result<Self, ScanError> {
        Self::with_set(BuiltinSet::Core, registry, evaluator)
    }

    /// Scanner executing the full script built-in set.
    pub fn script(
        registry: SharedRegistry,
        evaluator: Rc<dyn MacroEvaluator>,
    ) -> Result<Self, ScanError> {
        Self::with_set(BuiltinSet::Script, registry, evaluator)
    }

    fn with_set(
        builtins: BuiltinSet,
        registry: SharedRegistry,
        evaluator: Rc<dyn MacroEvaluator>,
    ) -> Result<Self, ScanError> {
        Ok(Scanner {
            cursor: None,
            child: None,
            registry,
            evaluator,
            output: Rc::new(RefCell::new(Box::new(io::stdout()))),
            grammar: Grammar::compile()?,
            builtins,
            trim: true,
            compress: false,
            verbose: false,
            echoed: false,
            print_previous: false,
        })
    }

    /// Redirect `print` output (stdout by default). Shared with includes
    /// and duplicates.
    pub fn with_output(mut self, sink: Box<dyn Write>) -> Self {
        self.output = Rc::new(RefCell::new(sink));
        self
    }

    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    /// Seed the reserved environment table from the OS environment.
    pub fn with_environment(self) -> Self {
        self.registry.borrow_mut().seed_environment();
        self
    }

    pub fn registry(&self) -> SharedRegistry {
        Rc::clone(&self.registry)
    }

    /// Open a `[?][@!]name` reference.
    pub fn open_source(
        &mut self,
        reference: &str,
        trim: bool,
        compress: bool,
    ) -> Result<(), ScanError> {
        let sref = SourceRef::parse(reference)?;
        let store = LineStore::from_ref(&sref, trim, compress)?;
        self.install(store, trim, compress);
        Ok(())
    }

    pub fn open_path(&mut self, path: &Path, trim: bool, compress: bool) -> Result<(), ScanError> {
        let store = LineStore::from_path(path, trim, compress)?;
        self.install(store, trim, compress);
        Ok(())
    }

    /// Scan literal inline text; `source` names it in diagnostics.
    pub fn open_literal(&mut self, source: &str, text: &str, trim: bool, compress: bool) {
        self.install(LineStore::from_text(source, text, trim, compress), trim, compress);
    }

    pub fn open_reader<R: Read>(
        &mut self,
        source: &str,
        reader: R,
        trim: bool,
        compress: bool,
    ) -> Result<(), ScanError> {
        let store = LineStore::from_reader(source, reader, trim, compress)?;
        self.install(store, trim, compress);
        Ok(())
    }

    fn install(&mut self, store: LineStore, trim: bool, compress: bool) {
        self.cursor = Some(LineCursor::new(Rc::new(store)));
        self.child = None;
        self.trim = trim;
        self.compress = compress;
        self.clear_flags();
    }

    /// Whether another ordinary line exists. Built-in lines encountered on
    /// the way are executed here and never surface.
    pub fn has_next_line(&mut self) -> Result<bool, ScanError> {
        loop {
            if let Some(child) = self.child.as_mut() {
                if child.has_next_line()? {
                    return Ok(true);
                }
                self.child = None;
            }
            let text = match self.cursor.as_mut() {
                Some(cursor) => match cursor.peek() {
                    Some(line) => line.text.clone(),
                    None => return Ok(false),
                },
                None => return Ok(false),
            };
            // pure classification first; no flags move until we commit
            let (echoed, rest) = self.grammar.strip_echo(&text);
            let rest = rest.to_string();
            let cmd = self.grammar.classify(&rest);
            if !self.executes(&cmd) {
                return Ok(true);
            }
            match self.cursor.as_mut() {
                Some(cursor) => {
                    cursor.next()?;
                }
                None => return Ok(false),
            }
            self.clear_flags();
            self.echoed = echoed;
            if echoed {
                self.write_echo_diagnostics(&rest)?;
            }
            self.execute(cmd)?;
        }
    }

    /// Advance to and return the next ordinary line, macro-expanded.
    pub fn next_line(&mut self) -> Result<String, ScanError> {
        if !self.has_next_line()? {
            return Err(ScanError::PastEnd(self.state()));
        }
        if let Some(child) = self.child.as_mut() {
            return child.next_line();
        }
        let text = match self.cursor.as_mut() {
            Some(cursor) => cursor.next()?.text.clone(),
            None => return Err(ScanError::PastEnd(self.state())),
        };
        self.clear_flags();
        let (echoed, rest) = self.grammar.strip_echo(&text);
        let rest = rest.to_string();
        self.echoed = echoed;
        if echoed {
            self.write_echo_diagnostics(&rest)?;
        }
        self.expand(&rest)
    }

    /// Non-throwing variant of [`next_line`](Self::next_line).
    pub fn try_next_line(&mut self) -> Result<Option<String>, ScanError> {
        if !self.has_next_line()? {
            return Ok(None);
        }
        self.next_line().map(Some)
    }

    /// Re-read the current line without advancing.
    pub fn current_line(&self) -> Result<Option<String>, ScanError> {
        if let Some(child) = &self.child {
            return child.current_line();
        }
        let Some(cursor) = &self.cursor else {
            return Ok(None);
        };
        match cursor.current() {
            Some(line) => {
                let (_, rest) = self.grammar.strip_echo(&line.text);
                self.expand(rest).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Preview the next raw position without mutating any state. The
    /// previewed line may still be a built-in.
    pub fn peek_next_line(&self) -> Result<Option<String>, ScanError> {
        if let Some(child) = &self.child {
            return child.peek_next_line();
        }
        let Some(cursor) = &self.cursor else {
            return Ok(None);
        };
        match cursor.peek() {
            Some(line) => {
                let (_, rest) = self.grammar.strip_echo(&line.text);
                self.expand(rest).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Diagnostic chain: innermost line first, then each enclosing
    /// include frame.
    pub fn state(&self) -> String {
        let own = match &self.cursor {
            Some(cursor) => cursor.state(),
            None => "(closed)".to_string(),
        };
        match &self.child {
            Some(child) => format!("{}\n  included from {}", child.state(), own),
            None => own,
        }
    }

    /// Original line number of the current line (innermost include).
    pub fn line_number(&self) -> usize {
        if let Some(child) = &self.child {
            return child.line_number();
        }
        self.cursor.as_ref().map(|c| c.line_number()).unwrap_or(0)
    }

    /// Number of cleaned lines in this scanner's own store.
    pub fn command_count(&self) -> usize {
        self.cursor.as_ref().map(|c| c.store().len()).unwrap_or(0)
    }

    /// Whether the current line carried an `echo ` prefix.
    pub fn echoed(&self) -> bool {
        self.echoed
    }

    /// Whether the last consumed `print` asked to replay the previous
    /// output (`print -`). Resolution belongs to the caller.
    pub fn print_previous(&self) -> bool {
        self.print_previous
    }

    /// Restart iteration from the top, dropping any active include.
    pub fn rewind(&mut self) {
        self.child = None;
        self.clear_flags();
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.rewind();
        }
    }

    /// Discard the line store entirely, as if nothing had been opened.
    pub fn reset(&mut self) {
        self.child = None;
        self.cursor = None;
        self.clear_flags();
    }

    /// Independent scanner at the same logical position. The line store
    /// and registry are shared; the cursor and include chain are copied,
    /// so advancing the duplicate never moves the original.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    fn clear_flags(&mut self) {
        self.echoed = false;
        self.print_previous = false;
    }

    fn expand(&self, text: &str) -> Result<String, ScanError> {
        let registry = self.registry.borrow();
        Ok(self.evaluator.evaluate(self.verbose, text, &registry)?)
    }

    /// Both the line as authored and after substitution go to the side
    /// channel; the surfaced value is unaffected.
    fn write_echo_diagnostics(&self, authored: &str) -> Result<(), ScanError> {
        let expanded = self.expand(authored)?;
        eprintln!("echo> {}", authored);
        eprintln!("echo> {}", expanded);
        Ok(())
    }

    fn executes(&self, cmd: &Command) -> bool {
        match cmd {
            Command::Print(_) | Command::Include(_) => true,
            Command::Sleep(_) | Command::SetProperty { .. } | Command::Properties { .. } => {
                self.builtins == BuiltinSet::Script
            }
            _ => false,
        }
    }

    fn execute(&mut self, cmd: Command) -> Result<(), ScanError> {
        match cmd {
            Command::Print(PrintArg::Previous) => {
                self.print_previous = true;
                Ok(())
            }
            Command::Print(PrintArg::Text(text)) => self.write_print(&text),
            Command::Include(target) => self.open_include(&target),
            Command::Sleep(millis) => {
                std::thread::sleep(Duration::from_millis(millis));
                Ok(())
            }
            Command::SetProperty { key, value } => self.set_property(&key, &value),
            Command::Properties { label, file } => self.load_properties(&label, &file),
            _ => Err(ScanError::Desync { state: self.state() }),
        }
    }

    fn write_print(&mut self, text: &str) -> Result<(), ScanError> {
        let expanded = self.expand(text)?;
        let mut out = self.output.borrow_mut();
        match expanded.strip_suffix("\\n") {
            Some(body) => writeln!(out, "{}", body)?,
            // no line break: a single trailing space keeps consecutive
            // prints visually separated
            None => write!(out, "{} ", expanded)?,
        }
        out.flush()?;
        Ok(())
    }

    fn open_include(&mut self, target: &str) -> Result<(), ScanError> {
        let expanded = self.expand(target)?;
        let sref = SourceRef::parse(&expanded)?;
        let store = match LineStore::from_ref(&sref, self.trim, self.compress) {
            Ok(store) => store,
            Err(ScanError::NotFound { resource, .. }) => {
                return Err(ScanError::NotFound {
                    resource,
                    state: self.state(),
                })
            }
            Err(e) => return Err(e),
        };
        let mut child = self.family_member();
        child.cursor = Some(LineCursor::new(Rc::new(store)));
        self.child = Some(Box::new(child));
        Ok(())
    }

    /// Fresh, unopened scanner of the same family: same built-in set and
    /// flags, shared registry, evaluator and output sink.
    fn family_member(&self) -> Scanner {
        Scanner {
            cursor: None,
            child: None,
            registry: Rc::clone(&self.registry),
            evaluator: Rc::clone(&self.evaluator),
            output: Rc::clone(&self.output),
            grammar: Rc::clone(&self.grammar),
            builtins: self.builtins,
            trim: self.trim,
            compress: self.compress,
            verbose: self.verbose,
            echoed: false,
            print_previous: false,
        }
    }

    fn set_property(&mut self, key: &str, value: &str) -> Result<(), ScanError> {
        let (guarded, raw_key) = match key.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, key),
        };
        let key = self.expand(raw_key)?;
        let value = self.expand(value)?;
        let outcome = self.registry.borrow_mut().set_global(&key, &value, guarded);
        if let SetOutcome::Overwrote(old) = outcome {
            eprintln!(
                "Warning: {}: overwriting {}={} (was {})",
                self.state(),
                key,
                value,
                old
            );
        }
        Ok(())
    }

    fn load_properties(&mut self, label: &str, file: &str) -> Result<(), ScanError> {
        let label = self.expand(label)?;
        let file = self.expand(file)?;
        let sref = SourceRef::parse(&file)?;
        let store = match LineStore::from_ref(&sref, true, false) {
            Ok(store) => store,
            Err(ScanError::NotFound { resource, .. }) => {
                return Err(ScanError::NotFound {
                    resource,
                    state: self.state(),
                })
            }
            Err(e) => return Err(e),
        };
        let mut entries = HashMap::new();
        for line in store.lines() {
            match line.text.split_once('=') {
                Some((key, value)) => {
                    entries.insert(key.trim().to_string(), value.trim().to_string());
                }
                None => eprintln!(
                    "Warning: {}: line {}: not a key=value entry: {}",
                    store.source(),
                    line.number,
                    line.text
                ),
            }
        }
        self.registry.borrow_mut().load_table(&label, entries);
        Ok(())
    }
}
