//! Scene files and configuration loading.
//!
//! A scene is the persisted slice of one canvas:
//!
//! ```json
//! { "tiers": [ ... any tier list ... ], "nodes": [ { "id": "n1", "tier_id": "tier_1", "x_position": 10, "y_position": 300 } ] }
//! ```
//!
//! Tiers are normalized on read; a missing scene means default tiers and no
//! nodes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_layout::{LayoutConfig, LayoutState, Node, TierSet};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub tiers: TierSet,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        require(path)?;
        let content = std::fs::read_to_string(path)?;
        let scene: Self = serde_json::from_str(&content)?;
        tracing::debug!(
            target: "strata.cli",
            path = %path.display(),
            tiers = scene.tiers.len(),
            nodes = scene.nodes.len(),
            "scene loaded"
        );
        Ok(scene)
    }

    /// Scene at `path`, or the empty scene when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn into_state(self, config: LayoutConfig) -> LayoutState {
        LayoutState::new(config, self.tiers, self.nodes)
    }

    pub fn from_state(state: &LayoutState) -> Self {
        Self {
            tiers: state.tiers().clone(),
            nodes: state.nodes().to_vec(),
        }
    }
}

/// Load a layout config (TOML by `.toml` extension, JSON otherwise),
/// apply the canvas height override, and validate.
pub fn load_config(path: Option<&Path>, canvas_height: Option<f64>) -> Result<LayoutConfig> {
    let mut config = match path {
        Some(path) => {
            require(path)?;
            let is_toml = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
            if is_toml {
                LayoutConfig::from_toml_file(path)?
            } else {
                LayoutConfig::from_json_file(path)?
            }
        }
        None => LayoutConfig::default(),
    };
    if let Some(height) = canvas_height {
        config = config.with_canvas_height(height);
    }
    Ok(config.validated()?)
}

fn require(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::MissingPath {
            path: PathBuf::from(path),
        })
    }
}
