// Settings file: `<config dir>/linestat/settings.json`.

use std::path::{Path, PathBuf};

use linestat_tracker::TrackerSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub tracker: TrackerSettings,
}

fn settings_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("linestat").join("settings.json"))
}

/// Load settings from `path`, or from the default location when `None`.
/// Missing or unreadable files give defaults.
pub fn load_settings(path: Option<&Path>) -> AppSettings {
    let path = match path.map(Path::to_path_buf).or_else(settings_path) {
        Some(p) => p,
        None => return AppSettings::default(),
    };
    read_settings(&path)
}

fn read_settings(path: &Path) -> AppSettings {
    match std::fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to parse {}: {}", path.display(), e);
                AppSettings::default()
            }
        },
        Err(e) => {
            log::debug!("No settings at {}: {}", path.display(), e);
            AppSettings::default()
        }
    }
}
