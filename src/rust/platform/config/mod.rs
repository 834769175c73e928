use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::dispatch::DispatchSettings;
use crate::engine::improvise::ImprovisationSettings;
use crate::engine::listener::ControlPitchMap;
use crate::engine::notes::MIDI_MAX;

pub const TOML_FILE: &str = "duet.toml";
pub const JSON_FILE: &str = "duet.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tempo: TempoSection,
    pub improvisation: ImprovisationSettings,
    pub input: InputSection,
    pub controls: ControlPitchMap,
    pub paths: PathsSection,
    pub dispatch: DispatchSettings,
    pub midi: MidiSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoSection {
    pub bpm: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// Pitches at or below this are recorded but never count as held keys.
    pub high_pass_threshold: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub history: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSection {
    pub input_port: Option<usize>,
    pub output_port: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub debug: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tempo.bpm must be greater than zero")]
    ZeroBpm,

    #[error("dispatch.{field} must be greater than zero")]
    ZeroCapacity { field: &'static str },

    #[error("control pitch {pitch} is outside the MIDI range 0-127")]
    ControlOutOfRange { pitch: u8 },

    #[error("control pitch {pitch} is bound to more than one action")]
    DuplicateControl { pitch: u8 },

    #[error("improvisation.phrase_length must be greater than zero")]
    EmptyPhrase,
}

impl Default for TempoSection {
    fn default() -> Self {
        Self { bpm: 120 }
    }
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            high_pass_threshold: 70,
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            history: PathBuf::from("music_history.json"),
        }
    }
}

impl AppConfig {
    /// Read `duet.toml` or `duet.json` from `root`. TOML wins when both are
    /// present. With neither, the defaults are written to `duet.json`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let toml_path = root.join(TOML_FILE);
        let json_path = root.join(JSON_FILE);

        if toml_path.exists() {
            load_toml(&toml_path)
        } else if json_path.exists() {
            load_json(&json_path)
        } else {
            let default = AppConfig::default();
            write_default_json(&json_path, &default)?;
            Ok(default)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tempo.bpm == 0 {
            return Err(ConfigError::ZeroBpm);
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "queue_capacity",
            });
        }
        if self.dispatch.max_in_flight == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "max_in_flight",
            });
        }
        if self.improvisation.phrase_length == 0 {
            return Err(ConfigError::EmptyPhrase);
        }

        let mut seen = HashSet::new();
        for pitch in self.controls.pitches() {
            if pitch > MIDI_MAX {
                return Err(ConfigError::ControlOutOfRange { pitch });
            }
            if !seen.insert(pitch) {
                return Err(ConfigError::DuplicateControl { pitch });
            }
        }
        Ok(())
    }

    pub fn history_path(&self, root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(&self.paths.history)
    }
}

fn load_json(path: &Path) -> Result<AppConfig> {
    let file = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = serde_json::from_str(&file)
        .with_context(|| format!("invalid JSON config: {}", path.display()))?;
    Ok(config)
}

fn load_toml(path: &Path) -> Result<AppConfig> {
    let file = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = toml::from_str(&file)
        .with_context(|| format!("invalid TOML config: {}", path.display()))?;
    Ok(config)
}

fn write_default_json(path: &Path, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("serialize default config")?;
    let mut file = File::create(path)
        .with_context(|| format!("failed to create config file: {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("unable to write config file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "test_config.rs"]
mod tests;
