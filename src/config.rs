//! JSON configuration for the `climvis` binary and library callers
//!
//! Every key is optional:
//!
//! ```json
//! {
//!   "significance_level": 0.05,
//!   "flip_method": "roll",
//!   "threads": 8,
//!   "style_overrides": {
//!     "sst": { "absolute": { "vmin": -2.0, "vmax": 32.0, "levels": 18 } }
//!   }
//! }
//! ```

use crate::errors::{ClimVisError, Result};
use crate::geo::FlipMethod;
use crate::statistics::DEFAULT_SIGNIFICANCE_LEVEL;
use crate::style::{StyleOverride, StyleTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_significance_level() -> f64 {
    DEFAULT_SIGNIFICANCE_LEVEL
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClimVisConfig {
    /// p-values above this are masked by significance tests
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,
    #[serde(default)]
    pub flip_method: FlipMethod,
    /// Rayon worker count; all cores when unset
    #[serde(default)]
    pub threads: Option<usize>,
    /// Per-field replacements for preset bounds, keyed by any field alias
    #[serde(default)]
    pub style_overrides: BTreeMap<String, StyleOverride>,
}

impl Default for ClimVisConfig {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            flip_method: FlipMethod::default(),
            threads: None,
            style_overrides: BTreeMap::new(),
        }
    }
}

impl ClimVisConfig {
    /// Parse and validate a JSON configuration
    ///
    /// # Errors
    ///
    /// Returns `JsonError` for malformed JSON and `InvalidConfig`,
    /// `UnknownField` for values [`validate`](Self::validate) rejects.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Check value ranges and that every style override names a known field
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a level outside `(0, 1)` or zero threads,
    /// and the errors of [`StyleTable::with_overrides`].
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ClimVisError::InvalidConfig {
                message: format!(
                    "significance_level {} outside (0, 1)",
                    self.significance_level
                ),
            });
        }
        if self.threads == Some(0) {
            return Err(ClimVisError::InvalidConfig {
                message: "threads must be at least 1".to_string(),
            });
        }
        self.style_table().map(|_| ())
    }

    /// Style table with this configuration's overrides applied
    ///
    /// # Errors
    ///
    /// As [`StyleTable::with_overrides`].
    pub fn style_table(&self) -> Result<StyleTable> {
        StyleTable::with_overrides(&self.style_overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ClimVisConfig::from_json("{}").unwrap();
        assert_eq!(config, ClimVisConfig::default());
        assert_eq!(config.significance_level, 0.1);
        assert_eq!(config.flip_method, FlipMethod::Relabel);
    }

    #[test]
    fn overrides_reach_style_table() {
        let config = ClimVisConfig::from_json(
            r#"{
                "significance_level": 0.05,
                "flip_method": "roll",
                "style_overrides": {
                    "sst": { "absolute": { "vmin": -2.0, "vmax": 32.0, "levels": 18 } }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.flip_method, FlipMethod::Roll);
        let style = config.style_table().unwrap().field_style("sst", false).unwrap();
        assert_eq!((style.vmin, style.vmax, style.level_count), (-2.0, 32.0, 18));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ClimVisConfig::from_json(r#"{"significance_level": 1.5}"#),
            Err(ClimVisError::InvalidConfig { .. })
        ));
        assert!(matches!(
            ClimVisConfig::from_json(r#"{"style_overrides": {"nonsense": {}}}"#),
            Err(ClimVisError::UnknownField { .. })
        ));
        assert!(matches!(
            ClimVisConfig::from_json(r#"{"threads": 0}"#),
            Err(ClimVisError::InvalidConfig { .. })
        ));
        assert!(matches!(
            ClimVisConfig::from_json(r#"{"sig_level": 0.2}"#),
            Err(ClimVisError::JsonError(_))
        ));
    }
}
