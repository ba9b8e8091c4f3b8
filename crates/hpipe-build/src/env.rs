//! Cached toolchain environment
//!
//! Loaded once when a task starts, threaded explicitly through toolchain
//! resolution, and written back only when something changed.

use crate::error::BuildResult;
use hpipe_config::{EnvMap, EnvStore};

/// Key holding the discovered compiler program
pub const CC_KEY: &str = "CC";

/// In-memory view of the persisted environment
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Environment {
    values: EnvMap,
    dirty: bool,
}

impl Environment {
    /// Load every value from the store
    pub fn load(store: &dyn EnvStore) -> BuildResult<Self> {
        Ok(Self {
            values: store.load_env()?,
            dirty: false,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a value, marking the environment dirty only if it changed
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if self.values.get(&key) != Some(&value) {
            self.values.insert(key, value);
            self.dirty = true;
        }
    }

    /// Drop a value
    pub fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist to the store if anything changed since loading
    pub fn save(&mut self, store: &dyn EnvStore) -> BuildResult<()> {
        if self.dirty {
            store.save_env(&self.values)?;
            self.dirty = false;
        }
        Ok(())
    }
}
