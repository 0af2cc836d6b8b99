// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! All policy constants live here instead of in the algorithms:
//! - Placement (inset offset, dynamic instance bound)
//! - Curve style (control-point offset, length sampling)
//! - Interaction (port hit radius)

use crate::curve::CurveStyle;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for this schema
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Port placement policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Inward offset applied to `inset` side ports
    pub inset_offset: f32,
    /// Upper bound on instances of one dynamic template
    pub max_dynamic_instances: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            inset_offset: 12.0,
            max_dynamic_instances: 64,
        }
    }
}

/// Drag-to-connect policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Distance within which the pointer counts as over a port
    pub hover_radius: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self { hover_radius: 10.0 }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Port placement
    pub placement: PlacementConfig,
    /// Connection curves
    pub curve: CurveStyle,
    /// Drag-to-connect
    pub interaction: InteractionConfig,
}

impl EngineConfig {
    /// Parse from RON text; missing fields take their defaults
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Pretty RON text
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}
