//! Scene configuration.
//!
//! Everything tweakable about the diorama lives in [`SceneConfig`]. A
//! `nashira.ron` next to the working directory overrides the defaults;
//! fields absent from the file keep their default values.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgb;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("audio volume {0} is outside [0, 1]")]
    Volume(f32),
    #[error("firefly count must be at least 1")]
    NoFireflies,
}

/// Top-level scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub fireflies: FireflyConfig,
    pub portal: PortalConfig,
    /// Warm emissive color of the pole lamps.
    pub pole_light_color: Rgb,
    /// Flat color of the diorama base.
    pub bottom_color: Rgb,
    /// Background clear color.
    pub clear_color: Rgb,
    pub camera: CameraConfig,
    pub audio: AudioConfig,
    pub assets: AssetPaths,
    pub credits: Credits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FireflyConfig {
    pub count: usize,
    /// Base point size in pixels at one unit of view depth.
    pub size: f32,
    pub seed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Gradient color where the portal noise is weakest.
    pub color_start: Rgb,
    /// Gradient color where the portal noise is strongest.
    pub color_end: Rgb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial eye position; the camera orbits the origin.
    pub eye: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Zoom clamp.
    pub min_distance: f32,
    pub max_distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Master volume in [0, 1].
    pub volume: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub dir: PathBuf,
    pub baked_texture: PathBuf,
    pub model: PathBuf,
    pub track: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credits {
    pub composer_url: String,
    pub artist_url: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fireflies: FireflyConfig::default(),
            portal: PortalConfig::default(),
            pole_light_color: Rgb::from_hex("#ffffe5").expect("valid default"),
            bottom_color: Rgb::from_hex("#08091b").expect("valid default"),
            clear_color: Rgb::from_hex("#0a0b24").expect("valid default"),
            camera: CameraConfig::default(),
            audio: AudioConfig::default(),
            assets: AssetPaths::default(),
            credits: Credits::default(),
        }
    }
}

impl Default for FireflyConfig {
    fn default() -> Self {
        Self {
            count: 30,
            size: 145.0,
            seed: 0x5eed,
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            color_start: Rgb::from_hex("#0a0b24").expect("valid default"),
            color_end: Rgb::from_hex("#fbbcc5").expect("valid default"),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(4.0, 4.0, 6.0),
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            min_distance: 2.0,
            max_distance: 20.0,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { volume: 0.1 }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            baked_texture: PathBuf::from("baked.jpg"),
            model: PathBuf::from("portal.glb"),
            track: PathBuf::from("nashira.wav"),
        }
    }
}

impl Default for Credits {
    fn default() -> Self {
        Self {
            composer_url: "https://open.spotify.com/artist/5XOKejcvmuUFLv5S7xgsQ8".to_string(),
            artist_url: "https://www.fridawiig.xyz".to_string(),
        }
    }
}

impl AssetPaths {
    pub fn baked_texture_path(&self) -> PathBuf {
        self.dir.join(&self.baked_texture)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model)
    }

    pub fn track_path(&self) -> PathBuf {
        self.dir.join(&self.track)
    }
}

impl SceneConfig {
    /// Load from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = ron::from_str(&text)?;
        config.validate()
    }

    /// Load from a RON file if it exists, otherwise use the defaults.
    pub fn load_if_present(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::info!("loading config from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ConfigError::Volume(self.audio.volume));
        }
        if self.fireflies.count == 0 {
            return Err(ConfigError::NoFireflies);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_are_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(fireflies: (count: 12), audio: (volume: 0.5))").unwrap();

        let config = SceneConfig::load(file.path()).unwrap();
        assert_eq!(config.fireflies.count, 12);
        assert_eq!(config.audio.volume, 0.5);
        // Untouched fields keep their defaults.
        assert_eq!(config.fireflies.size, 145.0);
        assert_eq!(config.camera.fov_degrees, 45.0);
        assert_eq!(config.portal.color_end, Rgb::from_hex("#fbbcc5").unwrap());
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(audio: (volume: 1.5))").unwrap();
        assert!(matches!(
            SceneConfig::load(file.path()),
            Err(ConfigError::Volume(_))
        ));
    }

    #[test]
    fn rejects_zero_fireflies() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(fireflies: (count: 0))").unwrap();
        assert!(matches!(
            SceneConfig::load(file.path()),
            Err(ConfigError::NoFireflies)
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = SceneConfig::load_if_present(Path::new("does-not-exist.ron")).unwrap();
        assert_eq!(config.fireflies.count, 30);
    }

    #[test]
    fn asset_paths_join_the_directory() {
        let paths = AssetPaths::default();
        assert_eq!(paths.model_path(), PathBuf::from("assets/portal.glb"));
    }
}
