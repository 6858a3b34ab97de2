//! Scene build configuration shared by all engines.

use crate::{AccelError, Result};
use serde::{Deserialize, Serialize};

/// Embree BVH build quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildQuality {
    Low,
    #[default]
    Medium,
    High,
}

/// Scene build configuration.
///
/// Fields an engine does not understand are ignored by it, so one config
/// can be shared between the software and Embree backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Maximum triangles per leaf in the software BVH
    pub max_leaf_size: usize,
    /// Embree build quality
    pub build_quality: BuildQuality,
    /// Embree robust traversal mode (slower, watertight)
    pub robust: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            build_quality: BuildQuality::Medium,
            robust: false,
        }
    }
}

impl SceneConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_leaf_size == 0 {
            return Err(AccelError::Config(
                "max_leaf_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
