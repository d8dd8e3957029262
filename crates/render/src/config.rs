use crate::camera::{CameraRig, LightRig};
use scenecore_kernel::SimConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render settings fixed at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Edge length of the square shadow map.
    pub shadow_resolution: u32,
    pub sphere_stacks: u32,
    pub sphere_sectors: u32,
    pub camera: CameraRig,
    pub light: LightRig,
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shadow_resolution: 2048,
            sphere_stacks: 24,
            sphere_sectors: 24,
            camera: CameraRig::default(),
            light: LightRig::default(),
            clear_color: [0.1, 0.1, 0.15, 1.0],
        }
    }
}

/// Top-level engine configuration. Every field has a default, so an empty
/// JSON object is a valid file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sim: SimConfig,
    pub render: RenderConfig,
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        tracing::debug!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
