//! External persistence adapter
//!
//! Stores the configuration as key-value query parameters and keeps a
//! navigable history of past representations, the native model of the
//! reference system's URL bar plus back/forward stack. Two write
//! disciplines: [`WriteMode::Navigate`] creates a new addressable entry,
//! [`WriteMode::Replace`] silently overwrites the current one. Externally
//! triggered changes (back/forward) are emitted over an mpsc channel; the
//! store's own writes never are, which is what keeps the reconciler's
//! write path and its external-change path from feeding each other.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::constants;

/// Flat key-to-string mapping persisted in the external store
pub type Representation = BTreeMap<String, String>;

/// Write discipline, chosen deliberately at each call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Push a new history entry (discrete, intentional edits); back/forward
    /// can step through prior character states
    Navigate,
    /// Overwrite the current entry (rapid/continuous edits such as slider
    /// drags) without flooding the navigation history
    Replace,
}

/// Serialize a representation as a URL query string
pub fn to_query(repr: &Representation) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in repr {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Parse a URL query string into a representation
pub fn from_query(query: &str) -> Representation {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Default session file location under the platform config dir
pub fn session_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(constants::config::APP_DIR);
    path.push(constants::config::SESSION_FILENAME);
    path
}

/// Navigable history of persisted representations
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryStore {
    entries: Vec<Representation>,
    cursor: usize,
    #[serde(skip)]
    notifier: Option<Sender<Representation>>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Fresh store with a single empty entry (the initial location)
    pub fn new() -> Self {
        Self {
            entries: vec![Representation::new()],
            cursor: 0,
            notifier: None,
        }
    }

    /// Subscribe to externally triggered changes (back/forward navigation).
    /// The store's own writes are never delivered here.
    pub fn subscribe(&mut self) -> Receiver<Representation> {
        let (tx, rx) = mpsc::channel();
        self.notifier = Some(tx);
        rx
    }

    /// Current representation
    pub fn read(&self) -> Representation {
        self.entries[self.cursor].clone()
    }

    /// Number of history entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Persist a representation with the given write discipline
    pub fn write(&mut self, repr: Representation, mode: WriteMode) {
        match mode {
            WriteMode::Navigate => {
                // A new entry drops any forward tail, like navigating after
                // going back in a browser
                self.entries.truncate(self.cursor + 1);
                self.entries.push(repr);
                self.cursor += 1;
                debug!(entries = self.entries.len(), cursor = self.cursor, "pushed history entry");
            }
            WriteMode::Replace => {
                self.entries[self.cursor] = repr;
                debug!(cursor = self.cursor, "replaced current history entry");
            }
        }
    }

    /// Step back one entry. Returns whether the cursor moved; a move is
    /// delivered to the subscriber as an external change.
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            debug!("already at the oldest history entry");
            return false;
        }
        self.cursor -= 1;
        self.notify();
        true
    }

    /// Step forward one entry. Returns whether the cursor moved.
    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            debug!("already at the newest history entry");
            return false;
        }
        self.cursor += 1;
        self.notify();
        true
    }

    fn notify(&self) {
        if let Some(notifier) = &self.notifier {
            // A dropped receiver only means nobody is listening yet
            let _ = notifier.send(self.entries[self.cursor].clone());
        }
    }

    /// Load a session file, starting fresh when none exists
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no session file, starting fresh");
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        let mut store: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session file {}", path.display()))?;
        store.sanitize();
        info!(path = %path.display(), entries = store.entries.len(), "loaded session");
        Ok(store)
    }

    /// Save the session file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create session directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)
            .context("Failed to serialize session state")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write session file {}", path.display()))?;
        Ok(())
    }

    /// Restore invariants after deserializing a possibly hand-edited file
    fn sanitize(&mut self) {
        if self.entries.is_empty() {
            warn!("session file had no entries, starting fresh");
            self.entries.push(Representation::new());
        }
        if self.cursor >= self.entries.len() {
            warn!(cursor = self.cursor, entries = self.entries.len(), "session cursor out of range, clamping");
            self.cursor = self.entries.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repr(pairs: &[(&str, &str)]) -> Representation {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_round_trip() {
        let original = repr(&[("seed", "142113030007"), ("hat", "ninja")]);
        assert_eq!(from_query(&to_query(&original)), original);
    }

    #[test]
    fn test_query_escapes_reserved_characters() {
        let original = repr(&[("hat", "a b&c=d")]);
        let query = to_query(&original);
        assert!(!query.contains(' '));
        assert_eq!(from_query(&query), original);
    }

    #[test]
    fn test_query_deterministic_key_order() {
        let query = to_query(&repr(&[("width", "113"), ("hair", "3"), ("height", "142")]));
        assert_eq!(query, "hair=3&height=142&width=113");
    }

    #[test]
    fn test_fresh_store_reads_empty() {
        let store = HistoryStore::new();
        assert!(store.read().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_navigate_pushes_entries() {
        let mut store = HistoryStore::new();
        store.write(repr(&[("seed", "1")]), WriteMode::Navigate);
        store.write(repr(&[("seed", "2")]), WriteMode::Navigate);
        assert_eq!(store.len(), 3);
        assert_eq!(store.read(), repr(&[("seed", "2")]));
    }

    #[test]
    fn test_replace_overwrites_without_growing() {
        let mut store = HistoryStore::new();
        store.write(repr(&[("seed", "1")]), WriteMode::Navigate);
        store.write(repr(&[("seed", "2")]), WriteMode::Replace);
        store.write(repr(&[("seed", "3")]), WriteMode::Replace);
        assert_eq!(store.len(), 2);
        assert_eq!(store.read(), repr(&[("seed", "3")]));
    }

    #[test]
    fn test_navigate_after_back_drops_forward_tail() {
        let mut store = HistoryStore::new();
        store.write(repr(&[("seed", "1")]), WriteMode::Navigate);
        store.write(repr(&[("seed", "2")]), WriteMode::Navigate);
        assert!(store.back());
        store.write(repr(&[("seed", "4")]), WriteMode::Navigate);
        assert_eq!(store.len(), 3);
        assert!(!store.forward());
        assert_eq!(store.read(), repr(&[("seed", "4")]));
    }

    #[test]
    fn test_back_and_forward_bounds() {
        let mut store = HistoryStore::new();
        assert!(!store.back());
        assert!(!store.forward());
        store.write(repr(&[("seed", "1")]), WriteMode::Navigate);
        assert!(store.back());
        assert!(!store.back());
        assert!(store.forward());
        assert!(!store.forward());
    }

    #[test]
    fn test_navigation_notifies_subscriber() {
        let mut store = HistoryStore::new();
        let changes = store.subscribe();
        store.write(repr(&[("seed", "1")]), WriteMode::Navigate);
        store.write(repr(&[("seed", "2")]), WriteMode::Navigate);
        assert!(store.back());
        assert_eq!(changes.try_recv().unwrap(), repr(&[("seed", "1")]));
        assert!(store.forward());
        assert_eq!(changes.try_recv().unwrap(), repr(&[("seed", "2")]));
    }

    #[test]
    fn test_own_writes_do_not_notify() {
        let mut store = HistoryStore::new();
        let changes = store.subscribe();
        store.write(repr(&[("seed", "1")]), WriteMode::Navigate);
        store.write(repr(&[("seed", "2")]), WriteMode::Replace);
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn test_session_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = HistoryStore::new();
        store.write(repr(&[("seed", "142113030007")]), WriteMode::Navigate);
        store.write(repr(&[("seed", "200113030007")]), WriteMode::Navigate);
        assert!(store.back());
        store.save(&path).unwrap();

        let loaded = HistoryStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.read(), repr(&[("seed", "142113030007")]));
    }

    #[test]
    fn test_load_missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_load_sanitizes_out_of_range_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"entries": [{"seed": "1421130000"}], "cursor": 9}"#).unwrap();

        let store = HistoryStore::load(&path).unwrap();
        assert_eq!(store.read(), repr(&[("seed", "1421130000")]));
    }

    #[test]
    fn test_load_sanitizes_empty_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"entries": [], "cursor": 0}"#).unwrap();

        let store = HistoryStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.read().is_empty());
    }
}
