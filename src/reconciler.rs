//! Update reconciler
//!
//! Single entry point for every edit: validate through the store, re-derive
//! the seed, persist with the caller's write discipline, and report whether
//! the rendering boundary needs a refresh. Also owns the inbound paths that
//! rebuild the configuration from a persisted representation (startup and
//! external navigation), which never write back.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::constants;
use crate::persistence::{self, HistoryStore, Representation, WriteMode};
use crate::schema;
use crate::seed;
use crate::store::ConfigStore;
use crate::types::Configuration;

/// Nature of an edit, mapped to the persistence write discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Intentional, discrete change (released slider, combo selection);
    /// persisted as a new history entry
    Discrete,
    /// Mid-gesture change (slider still dragging); persisted by silently
    /// replacing the current entry
    Transient,
}

/// How the configuration appears in the persisted representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistPolicy {
    /// A single `seed` key carries the seed-bearing attributes
    #[default]
    Seed,
    /// Every seed-bearing attribute is persisted under its own key
    Attributes,
}

pub struct Reconciler {
    store: ConfigStore,
    history: HistoryStore,
    policy: PersistPolicy,
}

impl Reconciler {
    pub fn new(history: HistoryStore, policy: PersistPolicy) -> Self {
        Self {
            store: ConfigStore::new(),
            history,
            policy,
        }
    }

    /// Rebuild the configuration from the currently persisted representation.
    /// Called once at startup; never writes.
    pub fn initialize(&mut self) {
        let repr = self.history.read();
        let config = reconstruct(&repr);
        self.store.load(config);
        info!(seed = %self.seed(), layout = seed::LAYOUT_VERSION, "initialized from persisted state");
    }

    /// Apply one attribute edit.
    ///
    /// Returns whether anything changed; on `true` the new state has been
    /// persisted and the rendering boundary should refresh. A no-op edit
    /// performs no persistence write at all.
    pub fn apply_edit(&mut self, key: &str, raw: &str, kind: EditKind) -> Result<bool> {
        let changed = self.store.set(key, raw)?;
        if !changed {
            debug!(attribute = key, "edit is a no-op, skipping persistence");
            return Ok(false);
        }
        let mode = match kind {
            EditKind::Discrete => WriteMode::Navigate,
            EditKind::Transient => WriteMode::Replace,
        };
        let repr = self.current_representation();
        self.history.write(repr, mode);
        Ok(true)
    }

    /// Replace the whole character from a seed string (the editable seed
    /// surface). Follows the same reconciliation path as attribute edits.
    pub fn load_seed(&mut self, seed_text: &str) -> bool {
        let config = seed::decode(seed_text);
        let changed = config != *self.store.snapshot();
        if !changed {
            debug!("seed matches current state, skipping persistence");
            return false;
        }
        self.store.load(config);
        let repr = self.current_representation();
        self.history.write(repr, WriteMode::Navigate);
        info!(seed = %self.seed(), "loaded character from seed");
        true
    }

    /// Adopt a representation pasted in from elsewhere (a share link) as a
    /// new character state. Unlike [`Self::on_external_change`] this is an
    /// intentional edit, so it lands as a new history entry.
    pub fn load_representation(&mut self, repr: &Representation) -> bool {
        let config = reconstruct(repr);
        let changed = config != *self.store.snapshot();
        if !changed {
            debug!("representation matches current state, skipping persistence");
            return false;
        }
        self.store.load(config);
        let repr = self.current_representation();
        self.history.write(repr, WriteMode::Navigate);
        info!(seed = %self.seed(), "loaded character from share link");
        true
    }

    /// Reset every attribute to its schema default
    pub fn reset(&mut self) -> bool {
        let defaults = schema::defaults();
        if defaults == *self.store.snapshot() {
            return false;
        }
        self.store.load(defaults);
        let repr = self.current_representation();
        self.history.write(repr, WriteMode::Navigate);
        true
    }

    /// React to an externally triggered store change (back/forward
    /// navigation). Reloads the configuration and deliberately performs no
    /// persistence write, which would otherwise loop back as another change.
    pub fn on_external_change(&mut self, repr: &Representation) {
        let config = reconstruct(repr);
        self.store.load(config);
        info!(seed = %self.seed(), "reloaded from external change");
    }

    /// Read-only snapshot for the rendering boundary
    pub fn snapshot(&self) -> &Configuration {
        self.store.snapshot()
    }

    /// Seed string for the current configuration
    pub fn seed(&self) -> String {
        seed::encode(self.store.snapshot())
    }

    /// Shareable link for the current configuration
    pub fn share_link(&self, base: &str) -> String {
        let query = persistence::to_query(&self.current_representation());
        if query.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{query}")
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    /// Derive the persisted representation of the current configuration.
    ///
    /// Seed-bearing attributes travel as a single `seed` key or as
    /// individual keys per the policy; everything else travels as individual
    /// keys. Values equal to their defaults are omitted (absent keys imply
    /// defaults), except the seed itself which is always written.
    fn current_representation(&self) -> Representation {
        let config = self.store.snapshot();
        let mut repr = Representation::new();
        if self.policy == PersistPolicy::Seed {
            repr.insert(constants::keys::SEED.to_string(), seed::encode(config));
        }
        for spec in schema::attributes() {
            if self.policy == PersistPolicy::Seed && spec.seed_width.is_some() {
                continue;
            }
            let value = &config[spec.key];
            if *value != spec.default_value() {
                repr.insert(spec.key.to_string(), value.to_string());
            }
        }
        repr
    }
}

/// Rebuild a configuration from a persisted representation.
///
/// A `seed` key wins for the seed-bearing attributes; everything else is
/// reconstructed key by key, with schema defaults filling the gaps. Unknown
/// keys are ignored so a mangled shared link still loads.
fn reconstruct(repr: &Representation) -> Configuration {
    let seed_text = repr.get(constants::keys::SEED);
    let mut config = match seed_text {
        Some(text) => seed::decode(text),
        None => schema::defaults(),
    };
    for (key, raw) in repr {
        if key == constants::keys::SEED {
            continue;
        }
        let Ok(spec) = schema::get(key) else {
            warn!(key = %key, "ignoring unknown key in persisted state");
            continue;
        };
        if seed_text.is_some() && spec.seed_width.is_some() {
            // The seed is authoritative for the attributes it encodes
            continue;
        }
        config.insert(spec.key, spec.coerce(raw));
    }
    config
}
