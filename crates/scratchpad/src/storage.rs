//! Persistence adapter over a string key-value store.
//!
//! Only two keys are ever written: the theme name and the editor text.
//! Values are stored raw, with no versioning.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::warn;

use crate::error::StorageError;
use crate::theme::Theme;

pub const THEME_KEY: &str = "theme";
pub const SOURCE_KEY: &str = "saved-source";

/// String key-value store, e.g. browser local storage or a directory of files.
///
/// Methods take `&self`; stores are shared between the app and its timers.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Clone)]
pub struct Persistence {
    store: Rc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// `None` when nothing (or an unknown name) was stored.
    pub fn load_theme(&self) -> Option<Theme> {
        let stored = match self.store.get(THEME_KEY) {
            Ok(stored) => stored?,
            Err(error) => {
                warn!("Failed to read theme preference: {error}");
                return None;
            }
        };
        match stored.parse() {
            Ok(theme) => Some(theme),
            Err(_) => {
                warn!("Ignoring unknown stored theme `{stored}`");
                None
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    pub fn load_source(&self) -> Result<Option<String>, StorageError> {
        self.store.get(SOURCE_KEY)
    }

    pub fn save_source(&self, source: &str) -> Result<(), StorageError> {
        self.store.set(SOURCE_KEY, source)
    }

    pub fn clear_source(&self) -> Result<(), StorageError> {
        self.store.remove(SOURCE_KEY)
    }
}
