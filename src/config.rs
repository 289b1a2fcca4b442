use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dither::{NoiseField, NoiseFieldError};
use crate::timeline::Section;

pub const DEFAULT_CONFIG_PATH: &str = "onebit.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the dither thresholds come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseSource {
    /// Grayscale image matching the screen size
    Image { path: PathBuf },
    Bayer,
    InterleavedGradient,
    White { seed: u32 },
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::InterleavedGradient
    }
}

impl NoiseSource {
    pub fn build(&self, width: usize, height: usize) -> Result<NoiseField, NoiseFieldError> {
        let field = match self {
            Self::Image { path } => NoiseField::from_image(path, width, height)?,
            Self::Bayer => NoiseField::bayer(width, height),
            Self::InterleavedGradient => NoiseField::interleaved_gradient(width, height),
            Self::White { seed } => NoiseField::white(width, height, *seed),
        };
        log::info!(
            "noise field: {:?} {}x{}, mean {:.1}",
            self,
            field.width(),
            field.height(),
            field.mean()
        );
        Ok(field)
    }
}

fn default_window_scale() -> u32 {
    2
}

fn default_vsync() -> bool {
    true
}

fn default_beat_seconds() -> f32 {
    0.46875
}

/// Demo settings, read from a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Integer zoom of the 400x240 panel in the host window
    #[serde(default = "default_window_scale")]
    pub window_scale: u32,
    #[serde(default = "default_vsync")]
    pub vsync: bool,
    #[serde(default)]
    pub noise: NoiseSource,
    /// Length of one beat; all timeline units are beats
    #[serde(default = "default_beat_seconds")]
    pub beat_seconds: f32,
    #[serde(default = "Section::default_timeline")]
    pub timeline: Vec<Section>,
    #[serde(default)]
    pub start_beat: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window_scale: default_window_scale(),
            vsync: default_vsync(),
            noise: NoiseSource::default(),
            beat_seconds: default_beat_seconds(),
            timeline: Section::default_timeline(),
            start_beat: 0.0,
        }
    }
}

impl DemoConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load `path`, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            },
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Self::default()
            },
            Err(e) => {
                log::warn!("{} ({}), using defaults", e, path.display());
                Self::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: DemoConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.window_scale, 2);
        assert!((config.beat_seconds - 0.46875).abs() < 1e-6);
    }

    #[test]
    fn test_noise_source_tags() {
        let config: DemoConfig = serde_json::from_str(
            r#"{ "noise": { "kind": "image", "path": "BlueNoise.tga" }, "vsync": false }"#,
        )
        .expect("parse");
        assert_eq!(
            config.noise,
            NoiseSource::Image {
                path: PathBuf::from("BlueNoise.tga")
            }
        );
        assert!(!config.vsync);

        let white: NoiseSource = serde_json::from_str(r#"{ "kind": "white", "seed": 9 }"#)
            .expect("parse");
        assert_eq!(white, NoiseSource::White { seed: 9 });
        let bayer: NoiseSource = serde_json::from_str(r#"{ "kind": "bayer" }"#).expect("parse");
        assert_eq!(bayer, NoiseSource::Bayer);
    }

    #[test]
    fn test_timeline_round_trips_through_json() {
        let config = DemoConfig::default();
        let json = serde_json::to_string_pretty(&config).expect("serialize");
        let back: DemoConfig = serde_json::from_str(&json).expect("parse");
        assert_eq!(back.timeline, config.timeline);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = DemoConfig::load_or_default("/nonexistent/onebit.json");
        assert_eq!(config, DemoConfig::default());
        assert!(matches!(
            DemoConfig::load("/nonexistent/onebit.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_build_procedural_noise() {
        let field = NoiseSource::Bayer.build(400, 240).expect("bayer");
        assert!(field.ensure_size(400, 240).is_ok());
    }
}
