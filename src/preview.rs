//! Terminal stand-in for the avatar rendering boundary
//!
//! The real renderer is an opaque component that consumes a configuration
//! snapshot and produces pixels; here it produces an aligned textual summary.

use std::fmt::Write;

use crate::schema;
use crate::types::Configuration;

/// Format a configuration snapshot for terminal display
pub fn render(config: &Configuration) -> String {
    let label_width = schema::attributes()
        .map(|spec| spec.key.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for spec in schema::attributes() {
        let value = config
            .get(spec.key)
            .cloned()
            .unwrap_or_else(|| spec.default_value());
        let marker = if value == spec.default_value() { " " } else { "*" };
        let _ = writeln!(out, "{marker} {:label_width$}  {value}", spec.key);
    }
    out
}
