/// Startup configuration, read once from a RON file
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::render::LineStyle;
use crate::sequencer::{Instrument, PlaybackConfig};

pub const DEFAULT_CONFIG_FILE: &str = "notegrid.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bpm: f32,
    pub instrument: String,
    pub instruments: Vec<String>,
    pub columns: usize,
    pub sample_root: PathBuf,
    pub sample_extension: String,
    pub line_color: [u8; 3],
    pub line_width: f32,
}

impl Default for Config {
    fn default() -> Self {
        let line = LineStyle::default();
        Self {
            bpm: 90.0,
            instrument: Instrument::PIANO.to_string(),
            instruments: vec![Instrument::PIANO.to_string(), Instrument::KOTO.to_string()],
            columns: 8,
            sample_root: PathBuf::from("."),
            sample_extension: "mp3".to_string(),
            line_color: line.color,
            line_width: line.width,
        }
    }
}

impl Config {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Defaults when the file is absent; a broken file is reported and ignored
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                info!("loaded configuration from {}", path.display());
                config
            }
            Err(err) => {
                warn!("ignoring {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(ConfigError::Invalid(format!("bpm must be positive, got {}", self.bpm)));
        }
        if self.columns == 0 {
            return Err(ConfigError::Invalid("columns must be at least 1".to_string()));
        }
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid("instrument list is empty".to_string()));
        }
        if !self.instruments.contains(&self.instrument) {
            return Err(ConfigError::Invalid(format!(
                "default instrument {:?} is not in the instrument list",
                self.instrument
            )));
        }
        Ok(())
    }

    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig::new(Instrument::new(self.instrument.as_str()), self.bpm)
    }

    pub fn instruments(&self) -> Vec<Instrument> {
        self.instruments.iter().map(|id| Instrument::new(id.as_str())).collect()
    }

    pub fn line_style(&self) -> LineStyle {
        LineStyle {
            color: self.line_color,
            width: self.line_width,
        }
    }
}
