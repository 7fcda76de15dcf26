//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Session/config file constants
pub mod config {
    /// Directory under the platform config dir holding session state
    pub const APP_DIR: &str = "seedling";

    /// Filename of the persisted edit-history session
    pub const SESSION_FILENAME: &str = "session.json";
}

/// Persisted-representation key names
pub mod keys {
    /// Query key carrying the encoded seed (seed persistence policy)
    pub const SEED: &str = "seed";
}

/// Share-link constants
pub mod share {
    /// Base URL used for the share link when none is given on the command line
    pub const DEFAULT_BASE: &str = "https://example.org/rpg-me";
}
