//! Property Registry: named key=value tables shared across scanners.
//!
//! The registry is an insertion-ordered mapping from label to table. It is
//! owned by whoever builds the outermost scanner and handed around by
//! reference (`Rc<RefCell<_>>`); includes and duplicates never copy it, so
//! a variable set in one loop iteration is visible to the next.
//!
//! Two labels are reserved: [`GLOBALS_LABEL`] holds script variables
//! written by `setProperty`, and [`ENVIRONMENT_LABEL`] can be seeded from
//! the OS environment. Labels are never removed, and merging a table never
//! deletes keys that were already there.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Label of the table holding global script variables.
pub const GLOBALS_LABEL: &str = "vars";

/// Label of the table optionally seeded from the OS environment.
pub const ENVIRONMENT_LABEL: &str = "env";

/// Shared handle to a registry.
pub type SharedRegistry = Rc<RefCell<PropertyRegistry>>;

/// Outcome of a `set_global` write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    Inserted,
    /// Guarded write against an existing key; first write wins.
    Kept,
    /// Unguarded write replaced this previous value.
    Overwrote(String),
}

#[derive(Debug, Clone)]
struct PropertyTable {
    label: String,
    entries: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    tables: Vec<PropertyTable>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    fn table(&self, label: &str) -> Option<&PropertyTable> {
        self.tables.iter().find(|t| t.label == label)
    }

    fn ensure_table(&mut self, label: &str) -> &mut PropertyTable {
        if let Some(at) = self.tables.iter().position(|t| t.label == label) {
            return &mut self.tables[at];
        }
        self.tables.push(PropertyTable {
            label: label.to_string(),
            entries: HashMap::new(),
        });
        self.tables.last_mut().unwrap()
    }

    pub fn has_table(&self, label: &str) -> bool {
        self.table(label).is_some()
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.label.as_str())
    }

    pub fn get(&self, label: &str, key: &str) -> Option<&str> {
        self.table(label)
            .and_then(|t| t.entries.get(key))
            .map(|v| v.as_str())
    }

    pub fn global(&self, key: &str) -> Option<&str> {
        self.get(GLOBALS_LABEL, key)
    }

    /// Write one global script variable. A guarded write against an
    /// existing key keeps the old value.
    pub fn set_global(&mut self, key: &str, value: &str, guarded: bool) -> SetOutcome {
        let table = self.ensure_table(GLOBALS_LABEL);
        match table.entries.get(key) {
            Some(_) if guarded => SetOutcome::Kept,
            Some(old) => {
                let old = old.clone();
                table.entries.insert(key.to_string(), value.to_string());
                SetOutcome::Overwrote(old)
            }
            None => {
                table.entries.insert(key.to_string(), value.to_string());
                SetOutcome::Inserted
            }
        }
    }

    /// Insert a table under `label`, or merge into the existing one.
    /// Merging overwrites individual keys but never deletes the rest.
    pub fn load_table(&mut self, label: &str, entries: HashMap<String, String>) {
        let table = self.ensure_table(label);
        table.entries.extend(entries);
    }

    /// Seed the reserved environment table from the OS environment.
    /// Keys already present are left alone.
    pub fn seed_environment(&mut self) {
        let table = self.ensure_table(ENVIRONMENT_LABEL);
        for (key, value) in std::env::vars() {
            table.entries.entry(key).or_insert(value);
        }
    }

    pub fn table_len(&self, label: &str) -> usize {
        self.table(label).map(|t| t.entries.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
