//! Configuration store
//!
//! Exclusive owner of the current attribute values. Mutation happens only
//! through [`ConfigStore::set`] and [`ConfigStore::load`], both of which
//! validate through the schema, so a stored value is never out of domain.

use tracing::debug;

use crate::schema::{self, SchemaError};
use crate::types::Configuration;

#[derive(Debug)]
pub struct ConfigStore {
    values: Configuration,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// New store populated with schema defaults
    pub fn new() -> Self {
        Self {
            values: schema::defaults(),
        }
    }

    /// Read-only view of the current configuration
    pub fn snapshot(&self) -> &Configuration {
        &self.values
    }

    /// Validate and store one attribute value.
    ///
    /// Returns whether the stored value actually changed; callers skip
    /// downstream persistence on `false` so no-op edits never spawn
    /// redundant history entries.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<bool, SchemaError> {
        let spec = schema::get(key)?;
        let value = spec.coerce(raw);
        debug_assert!(spec.domain.contains(&value));
        let changed = self.values.get(spec.key) != Some(&value);
        if changed {
            debug!(attribute = spec.key, value = %value, "attribute updated");
            self.values.insert(spec.key, value);
        }
        Ok(changed)
    }

    /// Replace the whole store atomically.
    ///
    /// Each incoming value is independently re-validated and clamped, so a
    /// partially bogus configuration still loads rather than failing;
    /// attributes missing from the input land on their defaults.
    pub fn load(&mut self, incoming: Configuration) {
        let mut next = schema::defaults();
        for (key, value) in incoming {
            if let Ok(spec) = schema::get(key) {
                next.insert(spec.key, spec.coerce(&value.to_string()));
            }
        }
        self.values = next;
    }
}
