//! Demo settings with persistence
//!
//! Settings are read from the path given on the command line, or from
//! `~/.config/foothold/settings.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use foothold_core::TimeConfig;
use foothold_game::{LocomotionConfig, MovementConfig};
use foothold_ik::FootIkConfig;
use foothold_physics::CharacterBodyConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All demo settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub time: TimeConfig,
    pub body: CharacterBodyConfig,
    pub locomotion: LocomotionConfig,
    pub movement: MovementConfig,
    pub foot_ik: FootIkConfig,
    pub run: RunSettings,
}

/// How the scripted run is driven
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Raw frame delta fed to the clock each iteration (seconds)
    pub frame_delta: f32,
    /// Hip height of the generated skeleton
    pub leg_length: f32,
    /// Forward/back swing of each foot at walk speed
    pub stride_length: f32,
    /// Foot lift at the top of a step
    pub step_height: f32,
    /// Gait cycles per second at walk speed
    pub cadence: f32,
    /// Also write the JSON report here
    pub report_path: Option<PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            frame_delta: 1.0 / 60.0,
            leg_length: 0.9,
            stride_length: 0.3,
            step_height: 0.1,
            cadence: 1.2,
            report_path: None,
        }
    }
}

impl DemoSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("foothold"))
    }

    /// Get the default settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from `path` (or the default location), falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let Some(path) = Self::settings_path() else {
                    warn!("Could not determine config directory");
                    return Self::default();
                };
                path
            }
        };

        if !path.exists() {
            info!("No settings file found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {:#}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parse TOML settings; missing sections and keys keep their defaults
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid settings TOML")
    }

    /// Save the current settings to `path`
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating settings directory {:?}", dir))?;
            }
        }

        let content = toml::to_string_pretty(self).context("serializing settings")?;
        fs::write(path, content).with_context(|| format!("writing settings to {:?}", path))?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = DemoSettings::parse(
            r#"
            [locomotion]
            jump_height = 1.5

            [foot_ik]
            debug = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.locomotion.jump_height, 1.5);
        assert_eq!(settings.locomotion.gravity, -15.0);
        assert!(settings.foot_ik.debug);
        assert_eq!(settings.foot_ik.probe_distance, 1.5);
        assert_eq!(settings.movement.walk_speed, 4.0);
    }

    #[test]
    fn test_invalid_settings_error() {
        assert!(DemoSettings::parse("[locomotion]\njump_height = \"high\"").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = DemoSettings::load(Some(Path::new("/nonexistent/foothold/settings.toml")));
        assert_eq!(settings.run.leg_length, 0.9);
    }

    #[test]
    fn test_defaults_roundtrip_through_toml() {
        let text = toml::to_string_pretty(&DemoSettings::default()).unwrap();
        let parsed = DemoSettings::parse(&text).unwrap();
        assert_eq!(parsed.locomotion.min_jump_air_time, 1.0);
        assert_eq!(parsed.body.step_offset, 0.3);
    }
}
