//! The grammar classifier: classify-and-return.
//!
//! [`CommandScanner`] is the non-recursive sibling of the built-in
//! processor. It ingests lines with the same comment and quote rules but
//! executes nothing: every advance recomputes exactly one [`Command`]
//! classification for the new current line and surfaces the line itself.
//! The batch executor decides what to do with it — including treating
//! `foreach`/`end` as loop boundaries and re-running a body by duplicating
//! the scanner.
//!
//! Typed accessors return a value only while the current line carries the
//! matching classification; all others answer `None`.

use crate::cursor::LineCursor;
use crate::error::ScanError;
use crate::expand::MacroEvaluator;
use crate::patterns::{Command, Grammar, PrintArg};
use crate::registry::SharedRegistry;
use crate::source::SourceRef;
use crate::store::LineStore;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

#[derive(Clone)]
pub struct CommandScanner {
    cursor: Option<LineCursor>,
    registry: SharedRegistry,
    evaluator: Rc<dyn MacroEvaluator>,
    grammar: Rc<Grammar>,
    verbose: bool,
    echoed: bool,
    current: Option<Command>,
}

impl CommandScanner {
    pub fn new(
        registry: SharedRegistry,
        evaluator: Rc<dyn MacroEvaluator>,
    ) -> Result<Self, ScanError> {
        Ok(CommandScanner {
            cursor: None,
            registry,
            evaluator,
            grammar: Grammar::compile()?,
            verbose: false,
            echoed: false,
            current: None,
        })
    }

    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    pub fn registry(&self) -> SharedRegistry {
        Rc::clone(&self.registry)
    }

    pub fn open_source(
        &mut self,
        reference: &str,
        trim: bool,
        compress: bool,
    ) -> Result<(), ScanError> {
        let sref = SourceRef::parse(reference)?;
        self.install(LineStore::from_ref(&sref, trim, compress)?);
        Ok(())
    }

    pub fn open_path(&mut self, path: &Path, trim: bool, compress: bool) -> Result<(), ScanError> {
        self.install(LineStore::from_path(path, trim, compress)?);
        Ok(())
    }

    pub fn open_literal(&mut self, source: &str, text: &str, trim: bool, compress: bool) {
        self.install(LineStore::from_text(source, text, trim, compress));
    }

    pub fn open_reader<R: Read>(
        &mut self,
        source: &str,
        reader: R,
        trim: bool,
        compress: bool,
    ) -> Result<(), ScanError> {
        self.install(LineStore::from_reader(source, reader, trim, compress)?);
        Ok(())
    }

    fn install(&mut self, store: LineStore) {
        self.cursor = Some(LineCursor::new(Rc::new(store)));
        self.echoed = false;
        self.current = None;
    }

    pub fn has_next_line(&mut self) -> Result<bool, ScanError> {
        match self.cursor.as_mut() {
            Some(cursor) => Ok(cursor.has_next()),
            None => Ok(false),
        }
    }

    /// Advance, reclassify, and return the expanded line.
    pub fn next_line(&mut self) -> Result<String, ScanError> {
        let text = match self.cursor.as_mut() {
            Some(cursor) => cursor.next()?.text.clone(),
            None => return Err(ScanError::PastEnd(self.state())),
        };
        self.classify_line(&text)
    }

    /// Non-throwing variant of [`next_line`](Self::next_line).
    pub fn try_next_line(&mut self) -> Result<Option<String>, ScanError> {
        if !self.has_next_line()? {
            return Ok(None);
        }
        self.next_line().map(Some)
    }

    fn classify_line(&mut self, raw: &str) -> Result<String, ScanError> {
        self.echoed = false;
        self.current = None;
        let (echoed, rest) = self.grammar.strip_echo(raw);
        let rest = rest.to_string();
        let expanded = self.expand(&rest)?;
        self.echoed = echoed;
        self.current = Some(self.grammar.classify(&expanded));
        Ok(expanded)
    }

    fn expand(&self, text: &str) -> Result<String, ScanError> {
        let registry = self.registry.borrow();
        Ok(self.evaluator.evaluate(self.verbose, text, &registry)?)
    }

    /// Classification of the current line, if any line is current.
    pub fn command(&self) -> Option<&Command> {
        self.current.as_ref()
    }

    pub fn echoed(&self) -> bool {
        self.echoed
    }

    pub fn make_new_root(&self) -> Option<&str> {
        match &self.current {
            Some(Command::MakeNewRoot(name)) => Some(name),
            _ => None,
        }
    }

    pub fn batch_file(&self) -> Option<&str> {
        match &self.current {
            Some(Command::Batch(file)) => Some(file),
            _ => None,
        }
    }

    pub fn is_foreach(&self) -> bool {
        matches!(self.current, Some(Command::Foreach))
    }

    pub fn is_end(&self) -> bool {
        matches!(self.current, Some(Command::End))
    }

    pub fn properties_args(&self) -> Option<(&str, &str)> {
        match &self.current {
            Some(Command::Properties { label, file }) => Some((label, file)),
            _ => None,
        }
    }

    pub fn set_property_args(&self) -> Option<(&str, &str)> {
        match &self.current {
            Some(Command::SetProperty { key, value }) => Some((key, value)),
            _ => None,
        }
    }

    pub fn print_arg(&self) -> Option<&PrintArg> {
        match &self.current {
            Some(Command::Print(arg)) => Some(arg),
            _ => None,
        }
    }

    pub fn save_to(&self) -> Option<&str> {
        match &self.current {
            Some(Command::SaveTo(target)) => Some(target),
            _ => None,
        }
    }

    pub fn use_as_input(&self) -> Option<&str> {
        match &self.current {
            Some(Command::UseAsInput(input)) => Some(input),
            _ => None,
        }
    }

    pub fn sleep_millis(&self) -> Option<u64> {
        match self.current {
            Some(Command::Sleep(millis)) => Some(millis),
            _ => None,
        }
    }

    pub fn include_ref(&self) -> Option<&str> {
        match &self.current {
            Some(Command::Include(target)) => Some(target),
            _ => None,
        }
    }

    pub fn is_ordinary(&self) -> bool {
        matches!(self.current, Some(Command::Ordinary(_)))
    }

    pub fn current_line(&self) -> Result<Option<String>, ScanError> {
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

    pub fn peek_next_line(&self) -> Result<Option<String>, ScanError> {
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

    pub fn state(&self) -> String {
        match &self.cursor {
            Some(cursor) => cursor.state(),
            None => "(closed)".to_string(),
        }
    }

    pub fn line_number(&self) -> usize {
        self.cursor.as_ref().map(|c| c.line_number()).unwrap_or(0)
    }

    pub fn command_count(&self) -> usize {
        self.cursor.as_ref().map(|c| c.store().len()).unwrap_or(0)
    }

    pub fn rewind(&mut self) {
        self.echoed = false;
        self.current = None;
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.rewind();
        }
    }

    pub fn reset(&mut self) {
        self.cursor = None;
        self.echoed = false;
        self.current = None;
    }

    /// Independent scanner at the same logical position, for loop
    /// re-execution. Shares the registry with its origin.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::BasicEvaluator;
    use crate::registry::PropertyRegistry;

    fn classifier(text: &str) -> CommandScanner {
        let mut scanner =
            CommandScanner::new(PropertyRegistry::shared(), Rc::new(BasicEvaluator)).unwrap();
        scanner.open_literal("inline", text, true, false);
        scanner
    }

    #[test]
    fn classifies_without_consuming() {
        let mut c = classifier("print hello\nordinary stuff\n");
        assert_eq!(c.next_line().unwrap(), "print hello");
        assert_eq!(
            c.print_arg(),
            Some(&PrintArg::Text("hello".to_string()))
        );
        assert_eq!(c.next_line().unwrap(), "ordinary stuff");
        assert!(c.is_ordinary());
        assert!(c.print_arg().is_none());
    }

    #[test]
    fn only_matching_accessor_answers() {
        let mut c = classifier("makeNewRoot base\n");
        c.next_line().unwrap();
        assert_eq!(c.make_new_root(), Some("base"));
        assert!(c.batch_file().is_none());
        assert!(!c.is_foreach());
        assert!(c.sleep_millis().is_none());
    }

    #[test]
    fn foreach_end_mark_loop_boundaries() {
        let mut c = classifier("foreach\nbody line\nend\n");
        c.next_line().unwrap();
        assert!(c.is_foreach());
        c.next_line().unwrap();
        assert!(c.is_ordinary());
        c.next_line().unwrap();
        assert!(c.is_end());
    }

    #[test]
    fn echoed_lines_surface_with_flag() {
        let mut c = classifier("echo print hi\n");
        assert_eq!(c.next_line().unwrap(), "print hi");
        assert!(c.echoed());
        assert_eq!(c.print_arg(), Some(&PrintArg::Text("hi".to_string())));
    }

    #[test]
    fn classification_never_persists() {
        let mut c = classifier("sleep 1\nplain\n");
        c.next_line().unwrap();
        assert_eq!(c.sleep_millis(), Some(1000));
        c.next_line().unwrap();
        assert!(c.sleep_millis().is_none());
        c.rewind();
        assert!(c.command().is_none());
    }

    #[test]
    fn duplicate_replays_a_loop_body() {
        let mut c = classifier("foreach\nwork item\nend\n");
        c.next_line().unwrap();
        assert!(c.is_foreach());
        let snapshot = c.duplicate();

        // first pass
        c.next_line().unwrap();
        c.next_line().unwrap();
        assert!(c.is_end());

        // second pass from the snapshot
        let mut again = snapshot.duplicate();
        assert_eq!(again.next_line().unwrap(), "work item");
        assert!(again.is_ordinary());
    }

    #[test]
    fn macro_expansion_applies_before_classification() {
        let registry = PropertyRegistry::shared();
        registry.borrow_mut().set_global("cmd", "sleep 3", false);
        let mut c = CommandScanner::new(registry, Rc::new(BasicEvaluator)).unwrap();
        c.open_literal("inline", "${cmd}\n", true, false);
        c.next_line().unwrap();
        assert_eq!(c.sleep_millis(), Some(3000));
    }

    #[test]
    fn command_count_reports_cleaned_lines() {
        let c = classifier("# comment\n\nreal\n");
        assert_eq!(c.command_count(), 1);
    }
}
