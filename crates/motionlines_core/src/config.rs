//! Render configuration.
//!
//! # Responsibility
//! - Hold the organization-wide numbering settings and per-call options.
//! - Load settings from JSON and reject unusable values early.
//!
//! # Invariants
//! - A validated `RenderConfig` never carries a zero column width or a
//!   zero cache capacity.

use crate::changes::ViewMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_COLUMN_WIDTH: u32 = 85;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    InvalidColumnWidth(u32),
    InvalidCacheCapacity(usize),
    Json(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidColumnWidth(width) => {
                write!(f, "column_width must be >= 1, got {width}")
            }
            Self::InvalidCacheCapacity(capacity) => {
                write!(f, "cache_capacity must be >= 1, got {capacity}")
            }
            Self::Json(err) => write!(f, "invalid render config json: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Organization-wide rendering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Characters per line before wrapping.
    pub column_width: u32,
    /// Maximum number of memoized numbering results.
    pub cache_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            column_width: DEFAULT_COLUMN_WIDTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl RenderConfig {
    /// Parses and validates a JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.column_width == 0 {
            return Err(ConfigError::InvalidColumnWidth(self.column_width));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity(self.cache_capacity));
        }
        Ok(())
    }
}

/// Per-call rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub mode: ViewMode,
    /// Keep line markers in the output.
    pub line_numbers: bool,
    /// Diff mode only: show changes regardless of their merge state.
    pub show_all_changes: bool,
    /// Include internal change recommendations.
    pub include_internal: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: ViewMode::Original,
            line_numbers: true,
            show_all_changes: false,
            include_internal: false,
        }
    }
}

impl RenderOptions {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn without_line_numbers(self) -> Self {
        Self {
            line_numbers: false,
            ..self
        }
    }

    pub fn showing_all_changes(self) -> Self {
        Self {
            show_all_changes: true,
            ..self
        }
    }

    pub fn including_internal(self) -> Self {
        Self {
            include_internal: true,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RenderConfig, RenderOptions};
    use crate::changes::ViewMode;

    #[test]
    fn missing_fields_take_defaults() {
        let config = RenderConfig::from_json(r#"{"column_width": 40}"#).expect("valid config");
        assert_eq!(config.column_width, 40);
        assert_eq!(config.cache_capacity, 64);
        assert_eq!(RenderConfig::from_json("{}").expect("valid"), RenderConfig::default());
    }

    #[test]
    fn rejects_zero_values_and_bad_json() {
        assert!(matches!(
            RenderConfig::from_json(r#"{"column_width": 0}"#),
            Err(ConfigError::InvalidColumnWidth(0))
        ));
        assert!(matches!(
            RenderConfig::from_json(r#"{"cache_capacity": 0}"#),
            Err(ConfigError::InvalidCacheCapacity(0))
        ));
        assert!(matches!(RenderConfig::from_json("nope"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn options_deserialize_mode_by_name() {
        let options: RenderOptions =
            serde_json::from_str(r#"{"mode": "modified_final", "line_numbers": false}"#)
                .expect("valid options");
        assert_eq!(options.mode, ViewMode::ModifiedFinal);
        assert!(!options.line_numbers);
        assert!(!options.show_all_changes);
    }
}
