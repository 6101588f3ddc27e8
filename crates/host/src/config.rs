use std::path::Path;

use serde::{Deserialize, Serialize};
use scenegraph_render::RenderConfig;

use crate::error::HostError;

/// Host loop settings. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Id of the rotate node driven by horizontal drags and idle spin.
    pub yaw_id: String,
    /// Id of the rotate node driven by vertical drags.
    pub pitch_id: String,
    /// Degrees of rotation per pixel of drag.
    pub drag_sensitivity: f32,
    /// Degrees added to yaw on every idle tick. Zero disables the spin.
    pub idle_spin_degrees: f32,
    pub render: RenderConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            yaw_id: "yaw".into(),
            pitch_id: "pitch".into(),
            drag_sensitivity: 0.5,
            idle_spin_degrees: 0.5,
            render: RenderConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, HostError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "host config loaded");
        Ok(config)
    }
}
