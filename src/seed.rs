//! Fixed-width positional seed codec
//!
//! A seed is the seed-bearing attributes' values, zero-padded to their
//! declared widths and concatenated in schema order. Layout v1:
//! height(3) width(3) hair(2) pants(2) shirt(2), 12 characters total.
//! The format carries no delimiter or version tag, so the layout constant
//! below is the compatibility contract: changing field order or widths
//! breaks every previously shared seed and requires a version bump.

use std::fmt::Write;

use crate::schema;
use crate::types::{Configuration, Value};

/// Seed layout version implemented by this codec
pub const LAYOUT_VERSION: u8 = 1;

/// Total length of a complete layout-v1 seed
pub fn layout_len() -> usize {
    schema::seed_fields().map(|spec| spec.seed_width.unwrap_or(0)).sum()
}

/// Encode the seed-bearing attributes of a configuration as a seed string.
///
/// Attributes missing from the configuration encode as their defaults; the
/// store never produces such a configuration, but the codec stays total.
pub fn encode(config: &Configuration) -> String {
    let mut seed = String::with_capacity(layout_len());
    for spec in schema::seed_fields() {
        let width = spec.seed_width.unwrap_or(0);
        let value = config
            .get(spec.key)
            .cloned()
            .unwrap_or_else(|| spec.default_value());
        let n = match value {
            Value::Int(n) => n,
            // Layout v1 has numeric fields only
            _ => spec.default_value().as_int().unwrap_or(0),
        };
        let _ = write!(seed, "{n:0width$}");
    }
    seed
}

/// Decode a seed string into a full configuration.
///
/// Never fails: fields that are absent (seed shorter than the layout) or
/// non-numeric stay at their defaults, a partial trailing field is parsed
/// and clamped like any other input, and characters beyond the layout are
/// ignored. An arbitrary shared seed always yields a valid character.
pub fn decode(seed: &str) -> Configuration {
    let mut config = schema::defaults();
    // Index by chars, not bytes, so multibyte junk cannot split a boundary
    let chars: Vec<char> = seed.chars().collect();
    let mut offset = 0;
    for spec in schema::seed_fields() {
        let width = spec.seed_width.unwrap_or(0);
        let end = (offset + width).min(chars.len());
        if offset >= end {
            break;
        }
        let field: String = chars[offset..end].iter().collect();
        offset += width;
        if field.chars().all(|c| c.is_ascii_digit()) {
            config.insert(spec.key, spec.coerce(&field));
        }
    }
    config
}
