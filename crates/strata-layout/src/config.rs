#![forbid(unsafe_code)]

//! Layout configuration as data.
//!
//! Every geometric constant the engine uses lives in [`LayoutConfig`], which
//! can be loaded from JSON or (with the `config-toml` feature) TOML.
//!
//! # Loading
//!
//! ```toml
//! # strata.toml
//! [canvas]
//! canvas_height = 1200
//!
//! [foundation]
//! max_x = 1000
//!
//! [drag]
//! snap_threshold = 150
//! ```
//!
//! ```rust,ignore
//! let config = LayoutConfig::from_toml_file("strata.toml")?.validated()?;
//! ```
//!
//! # Defaults
//!
//! Missing sections and fields take the built-in values, so an empty
//! document equals `LayoutConfig::default()`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::band::CanvasFrame;
use crate::drag::DragTuning;
use crate::foundation::FoundationGrid;

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub canvas: CanvasFrame,
    pub foundation: FoundationGrid,
    pub drag: DragTuning,
}

impl LayoutConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let canvas = &self.canvas;
        for (name, value) in [
            ("canvas.canvas_height", canvas.canvas_height),
            ("canvas.top_margin", canvas.top_margin),
            ("canvas.bottom_margin", canvas.bottom_margin),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be finite and >= 0 (got {value})"));
            }
        }
        if canvas.usable_height() <= 0.0 {
            errors.push(format!(
                "canvas height {} leaves no room inside margins {} + {}",
                canvas.canvas_height, canvas.top_margin, canvas.bottom_margin
            ));
        }

        let grid = &self.foundation;
        for (name, value) in [
            ("foundation.min_x", grid.min_x),
            ("foundation.max_x", grid.max_x),
        ] {
            if !value.is_finite() {
                errors.push(format!("{name} must be finite (got {value})"));
            }
        }
        if grid.max_x < grid.min_x {
            errors.push(format!(
                "foundation.max_x ({}) must be >= foundation.min_x ({})",
                grid.max_x, grid.min_x
            ));
        }
        for (name, value) in [
            ("foundation.node_width", grid.node_width),
            ("foundation.node_height", grid.node_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{name} must be finite and > 0 (got {value})"));
            }
        }
        for (name, value) in [
            ("foundation.gap_x", grid.gap_x),
            ("foundation.gap_y", grid.gap_y),
            ("foundation.top_inset", grid.top_inset),
            ("foundation.row_tolerance", grid.row_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be finite and >= 0 (got {value})"));
            }
        }

        errors.extend(self.drag.validate());
        errors
    }

    /// `self` if valid, otherwise every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Same config with a different canvas height.
    #[must_use]
    pub fn with_canvas_height(self, canvas_height: f64) -> Self {
        Self {
            canvas: self.canvas.with_height(canvas_height),
            ..self
        }
    }
}

/// Errors that can occur when loading a layout configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-toml")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-toml")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-toml")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LayoutConfig::default().validate().is_empty());
    }

    #[test]
    fn empty_json_is_default() {
        let config = LayoutConfig::from_json_str("{}").expect("parses");
        assert_eq!(config, LayoutConfig::default());
    }

    #[test]
    fn partial_json_overrides_single_fields() {
        let config = LayoutConfig::from_json_str(
            r#"{"canvas": {"canvas_height": 1200}, "drag": {"snap_lerp": 0.5}}"#,
        )
        .expect("parses");
        assert_eq!(config.canvas.canvas_height, 1200.0);
        assert_eq!(config.canvas.top_margin, 40.0);
        assert_eq!(config.drag.snap_lerp, 0.5);
        assert_eq!(config.drag.snap_threshold, 180.0);
    }

    #[test]
    fn json_round_trip() {
        let config = LayoutConfig::default().with_canvas_height(990.0);
        let json = serde_json::to_string(&config).expect("serializes");
        assert_eq!(LayoutConfig::from_json_str(&json).expect("parses"), config);
    }

    #[test]
    fn invalid_values_are_collected() {
        let mut config = LayoutConfig::default();
        config.canvas.canvas_height = 60.0;
        config.foundation.node_width = 0.0;
        config.drag.snap_threshold = -1.0;
        let errors = config.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");

        match config.validated() {
            Err(ConfigError::Validation(list)) => assert_eq!(list.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_error() {
        let err = LayoutConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LayoutConfig::from_json_file("/nonexistent/strata.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn toml_sections_load() {
        let config = LayoutConfig::from_toml_str(
            "[foundation]\nmax_x = 1000.0\n\n[drag]\nsnap_threshold = 150.0\n",
        )
        .expect("parses");
        assert_eq!(config.foundation.max_x, 1000.0);
        assert_eq!(config.foundation.columns(), 4);
        assert_eq!(config.drag.snap_threshold, 150.0);
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn malformed_toml_is_error() {
        let err = LayoutConfig::from_toml_str("[canvas\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
