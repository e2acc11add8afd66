use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "reflex";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("reflex_config.json"))
    }

    /// Player settings (the stored display name).
    pub fn settings_path() -> PathBuf {
        Self::data_dir()
            .map(|dir| dir.join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("reflex_settings.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::data_dir()
            .map(|dir| dir.join("reflex.log"))
            .unwrap_or_else(|| PathBuf::from("reflex.log"))
    }

    fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_dir().to_path_buf())
    }
}
