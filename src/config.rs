use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::session::SessionConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub scoreboard_limit: usize,
    pub tick_rate_ms: u64,
    pub scores_file: Option<PathBuf>,
    pub show_scoreboard: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            max_delay_ms: 4000,
            scoreboard_limit: 5,
            tick_rate_ms: 100,
            scores_file: None,
            show_scoreboard: false,
        }
    }
}

impl Config {
    /// The delay window must be non-empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_delay_ms >= self.max_delay_ms {
            return Err(format!(
                "minimum delay ({}ms) must be below maximum delay ({}ms)",
                self.min_delay_ms, self.max_delay_ms
            ));
        }
        if self.tick_rate_ms == 0 {
            return Err("tick rate must be at least 1ms".to_string());
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            delay_range_ms: self.min_delay_ms..self.max_delay_ms,
            scoreboard_limit: self.scoreboard_limit,
            show_scoreboard: self.show_scoreboard,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "config_parse_failed");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
