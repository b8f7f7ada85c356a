use directories::ProjectDirs;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::LibraryError;

/// When a drag gesture reaches the token handler.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One commit when the pointer is released.
    #[default]
    OnRelease,
    /// Commit on every pointer move.
    Continuous,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStrategy {
    /// Read the media clock on every frame.
    #[default]
    ClockSampling,
    /// Anchor once and extrapolate from the frame timestamp.
    TimestampExtrapolation,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct EditorConfig {
    pub min_duration: f64,
    pub default_span: f64,
    pub edge_handle_width_px: f64,
    pub thumb_width_px: f64,
    pub commit_mode: CommitMode,
    pub progress_strategy: ProgressStrategy,
    pub resync_threshold: f64,
    pub playback_rates: Vec<f64>,
    pub new_token_text: String,
    pub default_part_of_speech: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_duration: 0.05,
            default_span: 0.5,
            edge_handle_width_px: 8.0,
            thumb_width_px: 16.0,
            commit_mode: CommitMode::OnRelease,
            progress_strategy: ProgressStrategy::ClockSampling,
            resync_threshold: 0.25,
            playback_rates: vec![0.5, 0.75, 1.0, 1.25, 1.5],
            new_token_text: "new".to_string(),
            default_part_of_speech: "noun".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, LibraryError> {
        let config: EditorConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, LibraryError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), LibraryError> {
        if !(self.min_duration > 0.0) {
            return Err(LibraryError::InvalidArgument(format!(
                "min_duration must be positive, got {}",
                self.min_duration
            )));
        }
        if self.default_span < self.min_duration {
            return Err(LibraryError::InvalidArgument(format!(
                "default_span ({}) is shorter than min_duration ({})",
                self.default_span, self.min_duration
            )));
        }
        if self.playback_rates.iter().any(|r| !(*r > 0.0)) {
            return Err(LibraryError::InvalidArgument(
                "playback_rates must all be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Closest configured rate to `requested`, or `requested` itself when
    /// no rates are configured.
    pub fn nearest_playback_rate(&self, requested: f64) -> f64 {
        self.playback_rates
            .iter()
            .copied()
            .min_by(|a, b| (a - requested).abs().total_cmp(&(b - requested).abs()))
            .unwrap_or(requested)
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("io", "lyric-timing", "lyric_editor") {
        let config_dir = proj_dirs.config_dir();
        if !config_dir.exists() {
            if let Err(e) = fs::create_dir_all(config_dir) {
                error!("Failed to create config directory: {}", e);
                return None;
            }
        }
        return Some(config_dir.join("editor.toml"));
    }
    None
}

pub fn save_config(config: &EditorConfig) -> Result<PathBuf, LibraryError> {
    let path = get_config_path().ok_or_else(|| {
        LibraryError::InvalidArgument("No config directory available".to_string())
    })?;
    fs::write(&path, config.to_toml_string()?)?;
    info!("Editor config saved to {}", path.display());
    Ok(path)
}

pub fn load_config() -> EditorConfig {
    if let Some(path) = get_config_path() {
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(toml_str) => match EditorConfig::from_toml_str(&toml_str) {
                    Ok(config) => return config,
                    Err(e) => {
                        warn!("Failed to parse config file, using defaults: {}", e);
                    }
                },
                Err(e) => {
                    warn!("Failed to read config file, using defaults: {}", e);
                }
            }
        }
    }
    EditorConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let config = EditorConfig::from_toml_str(
            "min_duration = 0.1\ncommit_mode = \"continuous\"\n",
        )
        .unwrap();
        assert_eq!(config.min_duration, 0.1);
        assert_eq!(config.commit_mode, CommitMode::Continuous);
        assert_eq!(config.default_span, 0.5);
        assert_eq!(config.progress_strategy, ProgressStrategy::ClockSampling);
    }

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let config = EditorConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EditorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn non_positive_min_duration_is_rejected() {
        let err = EditorConfig::from_toml_str("min_duration = 0.0").unwrap_err();
        assert!(matches!(err, LibraryError::InvalidArgument(_)));
    }

    #[test]
    fn nearest_rate_snaps_to_configured_values() {
        let config = EditorConfig::default();
        assert_eq!(config.nearest_playback_rate(1.1), 1.0);
        assert_eq!(config.nearest_playback_rate(3.0), 1.5);
    }
}
