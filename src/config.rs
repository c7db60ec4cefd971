//! Renderer configuration.
//!
//! Loaded from TOML. Every field has a default, so a file only needs the
//! values it changes:
//!
//! ```toml
//! width = 640
//! height = 480
//! render_mode = "filled"
//! shading = "gouraud"
//! fill = 0xFF228B22
//!
//! [camera]
//! position = { x = 0.0, y = 0.0, z = -5.0 }
//! fov = 60.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clipper::ClipMode;
use crate::colors;
use crate::math::Vec3;
use crate::render::{RenderMode, ShadingMode};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Values parsed but cannot be rendered with.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Initial camera placement and lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::FORWARD,
            up: Vec3::UP,
            fov: 90.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub render_mode: RenderMode,
    pub shading: ShadingMode,
    pub clip_mode: ClipMode,
    /// Packed ARGB clear color.
    pub background: u32,
    pub fill: u32,
    pub outline: u32,
    pub camera: CameraConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            render_mode: RenderMode::default(),
            shading: ShadingMode::default(),
            clip_mode: ClipMode::default(),
            background: colors::BACKGROUND,
            fill: colors::FILL,
            outline: colors::OUTLINE,
            camera: CameraConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Loads and validates a TOML configuration file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution {}x{} has a zero dimension",
                self.width, self.height
            )));
        }
        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far (near {}, far {})",
                camera.near, camera.far
            )));
        }
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov {} must be between 0 and 180 degrees",
                camera.fov
            )));
        }
        if camera.direction.magnitude() == 0.0 {
            return Err(ConfigError::Invalid("camera direction is zero".into()));
        }
        Ok(())
    }
}
