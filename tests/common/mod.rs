//! Common test utilities for bscript integration tests
#![allow(dead_code)]

pub use bscript::{
    BasicEvaluator, CommandScanner, PropertyRegistry, ScanError, Scanner, SharedRegistry,
};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Write sink whose contents stay readable through a shared handle, so
/// tests can inspect what `print` produced.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

/// Temporary directory of script files.
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub fn new() -> Self {
        ScriptDir {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Script scanner over inline text with a readable output sink.
pub fn scanner_for(text: &str) -> (Scanner, SharedBuf) {
    let buf = SharedBuf::default();
    let mut scanner = Scanner::script(PropertyRegistry::shared(), Rc::new(BasicEvaluator))
        .unwrap()
        .with_output(Box::new(buf.clone()));
    scanner.open_literal("inline", text, true, false);
    (scanner, buf)
}

/// Script scanner opened on a file, with a readable output sink.
pub fn scanner_for_file(path: &std::path::Path) -> (Scanner, SharedBuf) {
    let buf = SharedBuf::default();
    let mut scanner = Scanner::script(PropertyRegistry::shared(), Rc::new(BasicEvaluator))
        .unwrap()
        .with_output(Box::new(buf.clone()));
    scanner.open_path(path, true, false).unwrap();
    (scanner, buf)
}

/// Pull every surfaced line.
pub fn drain(scanner: &mut Scanner) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(line) = scanner.try_next_line().unwrap() {
        lines.push(line);
    }
    lines
}
