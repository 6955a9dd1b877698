/// CLI configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tapedeck_playback::PlaybackConfig;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "tapedeck.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub engine: EngineSettings,
}

/// Behaviour of the simulated engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Time the engine takes to load a source
    #[serde(default = "default_prepare_delay_ms")]
    pub prepare_delay_ms: u64,

    /// Length reported for every item
    #[serde(default = "default_track_length_ms")]
    pub track_length_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            prepare_delay_ms: default_prepare_delay_ms(),
            track_length_ms: default_track_length_ms(),
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `tapedeck.toml` in the
    /// working directory is used when present. Environment variables such as
    /// `TAPEDECK_PLAYBACK__REPEAT=all` override both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with TAPEDECK_)
        settings = settings.add_source(
            config::Environment::with_prefix("TAPEDECK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.tick_interval_ms < 10 {
            return Err(CliError::Config(format!(
                "playback.tick_interval_ms must be at least 10 (got {})",
                self.playback.tick_interval_ms
            )));
        }

        if self.engine.track_length_ms == 0 {
            return Err(CliError::Config(
                "engine.track_length_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_prepare_delay_ms() -> u64 {
    200
}

fn default_track_length_ms() -> u64 {
    5_000
}
