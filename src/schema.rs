//! Static attribute schema
//!
//! Declares every configurable character attribute once: key, value domain,
//! default, and (for seed-bearing attributes) the fixed seed field width.
//! All validation funnels through [`AttributeSpec::coerce`], which never
//! fails and always returns a domain-valid value.

use thiserror::Error;
use tracing::warn;

use crate::types::{Configuration, Value};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Lookup of a key not present in the schema. Programming or CLI misuse,
    /// never expected at runtime with a fixed schema.
    #[error("unknown attribute: {key}")]
    UnknownAttribute { key: String },
}

/// Value domain of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Bounded integer range, inclusive on both ends
    Range { min: i64, max: i64 },
    /// Enumerated string set; the first option is the fallback member
    Choice { options: &'static [&'static str] },
    /// Boolean toggle
    Flag,
}

/// Const-constructible default (see [`AttributeSpec::default_value`])
#[derive(Debug, Clone, Copy)]
enum Preset {
    Int(i64),
    Text(&'static str),
    Flag(bool),
}

/// Declaration of a single configurable attribute
#[derive(Debug)]
pub struct AttributeSpec {
    pub key: &'static str,
    pub domain: Domain,
    default: Preset,
    /// Width of this attribute's zero-padded decimal field in the seed,
    /// or `None` for attributes carried only via the persistence layer
    pub seed_width: Option<usize>,
}

/// Hat options understood by the avatar renderer
pub const HAT_OPTIONS: &[&str] = &[
    "none",
    "bunny",
    "coffee",
    "construction",
    "cowboy",
    "education",
    "knight",
    "ninja",
    "party",
    "pirate",
    "watermelon",
];

/// The full attribute table, seed-bearing attributes first.
///
/// Seed field order and widths are layout v1 of the seed codec; never
/// reorder or resize these without a version bump (old shared seeds would
/// silently decode to the wrong character).
static ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        key: "height",
        domain: Domain::Range { min: 100, max: 200 },
        default: Preset::Int(142),
        seed_width: Some(3),
    },
    AttributeSpec {
        key: "width",
        domain: Domain::Range { min: 80, max: 150 },
        default: Preset::Int(113),
        seed_width: Some(3),
    },
    AttributeSpec {
        key: "hair",
        domain: Domain::Range { min: 0, max: 10 },
        default: Preset::Int(0),
        seed_width: Some(2),
    },
    AttributeSpec {
        key: "pants",
        domain: Domain::Range { min: 0, max: 10 },
        default: Preset::Int(0),
        seed_width: Some(2),
    },
    AttributeSpec {
        key: "shirt",
        domain: Domain::Range { min: 0, max: 10 },
        default: Preset::Int(0),
        seed_width: Some(2),
    },
    AttributeSpec {
        key: "accessories",
        domain: Domain::Range { min: 0, max: 9 },
        default: Preset::Int(0),
        seed_width: None,
    },
    AttributeSpec {
        key: "base",
        domain: Domain::Range { min: 0, max: 1 },
        default: Preset::Int(0),
        seed_width: None,
    },
    AttributeSpec {
        key: "face",
        domain: Domain::Range { min: 0, max: 5 },
        default: Preset::Int(0),
        seed_width: None,
    },
    AttributeSpec {
        key: "face-item",
        domain: Domain::Range { min: 0, max: 9 },
        default: Preset::Int(0),
        seed_width: None,
    },
    AttributeSpec {
        key: "skin",
        domain: Domain::Range { min: 0, max: 9 },
        default: Preset::Int(0),
        seed_width: None,
    },
    AttributeSpec {
        key: "hat",
        domain: Domain::Choice { options: HAT_OPTIONS },
        default: Preset::Text("none"),
        seed_width: None,
    },
    AttributeSpec {
        key: "hat-color",
        domain: Domain::Range { min: 0, max: 9 },
        default: Preset::Int(0),
        seed_width: None,
    },
    AttributeSpec {
        key: "walking",
        domain: Domain::Flag,
        default: Preset::Flag(false),
        seed_width: None,
    },
    AttributeSpec {
        key: "circle",
        domain: Domain::Flag,
        default: Preset::Flag(false),
        seed_width: None,
    },
    AttributeSpec {
        key: "fire",
        domain: Domain::Flag,
        default: Preset::Flag(false),
        seed_width: None,
    },
    AttributeSpec {
        key: "speed",
        domain: Domain::Range { min: 0, max: 1000 },
        default: Preset::Int(500),
        seed_width: None,
    },
];

/// Look up an attribute by key
pub fn get(key: &str) -> Result<&'static AttributeSpec, SchemaError> {
    ATTRIBUTES
        .iter()
        .find(|spec| spec.key == key)
        .ok_or_else(|| SchemaError::UnknownAttribute {
            key: key.to_string(),
        })
}

/// All attributes in declaration order
pub fn attributes() -> impl Iterator<Item = &'static AttributeSpec> {
    ATTRIBUTES.iter()
}

/// Seed-bearing attributes in seed field order
pub fn seed_fields() -> impl Iterator<Item = &'static AttributeSpec> {
    ATTRIBUTES.iter().filter(|spec| spec.seed_width.is_some())
}

/// Fully populated configuration using each attribute's default
pub fn defaults() -> Configuration {
    attributes()
        .map(|spec| (spec.key, spec.default_value()))
        .collect()
}

impl Domain {
    /// Whether a value satisfies this domain
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Domain::Range { min, max }, Value::Int(n)) => (*min..=*max).contains(n),
            (Domain::Choice { options }, Value::Text(s)) => options.contains(&s.as_str()),
            (Domain::Flag, Value::Flag(_)) => true,
            _ => false,
        }
    }
}

impl AttributeSpec {
    pub fn default_value(&self) -> Value {
        match self.default {
            Preset::Int(n) => Value::Int(n),
            Preset::Text(s) => Value::Text(s.to_string()),
            Preset::Flag(b) => Value::Flag(b),
        }
    }

    /// Coerce raw input into this attribute's domain.
    ///
    /// Total function: out-of-range numbers clamp, unrecognized options fall
    /// back to the first member, and anything unparseable falls back to the
    /// default. Malformed shared links must still yield a usable character.
    pub fn coerce(&self, raw: &str) -> Value {
        let raw = raw.trim();
        match self.domain {
            Domain::Range { min, max } => {
                match raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
                    Some(f) => {
                        let n = f.trunc() as i64;
                        let clamped = n.clamp(min, max);
                        if clamped != n {
                            warn!(attribute = self.key, value = n, clamped = clamped, "value outside range, clamping");
                        }
                        Value::Int(clamped)
                    }
                    None => {
                        warn!(attribute = self.key, raw = %raw, "unparseable numeric value, using default");
                        self.default_value()
                    }
                }
            }
            Domain::Choice { options } => {
                let lower = raw.to_ascii_lowercase();
                match options.iter().find(|option| **option == lower) {
                    Some(option) => Value::Text((*option).to_string()),
                    None => {
                        warn!(attribute = self.key, raw = %raw, fallback = options[0], "unrecognized option, using fallback");
                        Value::Text(options[0].to_string())
                    }
                }
            }
            Domain::Flag => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Value::Flag(true),
                "false" | "0" | "no" | "off" | "" => Value::Flag(false),
                _ => {
                    warn!(attribute = self.key, raw = %raw, "unrecognized flag value, using default");
                    self.default_value()
                }
            },
        }
    }
}
