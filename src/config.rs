//! Planner configuration
//!
//! Loaded once at startup, immutable afterwards, passed by reference into
//! every planning call.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Placeholder syntax used when rendering bound parameters
///
/// Only the placeholders change. The rest of the statement stays in the
/// PostgreSQL dialect (`ILIKE ... ESCAPE`, `->>`, `NULLS FIRST`), so
/// `Question` suits PostgreSQL drivers that bind positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (PostgreSQL)
    Numbered,
    /// `?` (positional)
    Question,
}

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Page size when neither `first` nor `last` is given (default: 100)
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Largest accepted `first`/`last` (default: 1000)
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,

    /// Locale used for i18n attributes when the caller has none (default: "en")
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Placeholder syntax (default: numbered)
    #[serde(default = "default_placeholder")]
    pub placeholder: PlaceholderStyle,
}

fn default_limit() -> u64 {
    100
}

fn default_max_limit() -> u64 {
    1000
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_placeholder() -> PlaceholderStyle {
    PlaceholderStyle::Numbered
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            default_locale: default_locale(),
            placeholder: default_placeholder(),
        }
    }
}

impl PlannerConfig {
    /// Config with a specific default page size
    pub fn with_default_limit(limit: u64) -> Self {
        Self {
            default_limit: limit,
            ..Default::default()
        }
    }

    /// Reads a config from a JSON file; missing keys take their defaults
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(std::io::Error::from)
    }
}
