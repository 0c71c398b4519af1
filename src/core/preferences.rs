/*
 * Persists the two UI preferences that survive a session: the colour theme and
 * whether the top-files panel is collapsed. They live in `preferences.json` in the
 * local app config directory. A missing file means defaults; a corrupt one is an
 * error the caller may log and then ignore.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

pub const PREFERENCES_FILENAME: &str = "preferences.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme '{other}', expected 'light' or 'dark'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub top_files_collapsed: bool,
}

#[derive(Debug)]
pub enum PreferencesError {
    Io(io::Error),
    Json(serde_json::Error),
    NoProjectDirectory,
}

impl From<io::Error> for PreferencesError {
    fn from(err: io::Error) -> Self {
        PreferencesError::Io(err)
    }
}

impl From<serde_json::Error> for PreferencesError {
    fn from(err: serde_json::Error) -> Self {
        PreferencesError::Json(err)
    }
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferencesError::Io(e) => write!(f, "Preferences I/O error: {e}"),
            PreferencesError::Json(e) => write!(f, "Preferences file is not valid JSON: {e}"),
            PreferencesError::NoProjectDirectory => {
                write!(f, "Could not determine the configuration directory")
            }
        }
    }
}

impl std::error::Error for PreferencesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreferencesError::Io(e) => Some(e),
            PreferencesError::Json(e) => Some(e),
            PreferencesError::NoProjectDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PreferencesError>;

pub trait PreferencesManagerOperations: Send + Sync {
    fn load_preferences(&self, app_name: &str) -> Result<Preferences>;
    fn save_preferences(&self, app_name: &str, preferences: &Preferences) -> Result<()>;
}

/*
 * File-backed preferences. By default the file lives in the platform config dir
 * for `app_name`; `with_config_dir` pins it to a fixed directory instead.
 */
pub struct CorePreferencesManager {
    config_dir_override: Option<PathBuf>,
}

impl CorePreferencesManager {
    pub fn new() -> Self {
        CorePreferencesManager {
            config_dir_override: None,
        }
    }

    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        CorePreferencesManager {
            config_dir_override: Some(config_dir),
        }
    }

    fn preferences_file(&self, app_name: &str) -> Result<PathBuf> {
        match &self.config_dir_override {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(dir.join(PREFERENCES_FILENAME))
            }
            None => path_utils::get_app_config_file_path(app_name, PREFERENCES_FILENAME)
                .ok_or(PreferencesError::NoProjectDirectory),
        }
    }
}

impl Default for CorePreferencesManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferencesManagerOperations for CorePreferencesManager {
    fn load_preferences(&self, app_name: &str) -> Result<Preferences> {
        let file_path = self.preferences_file(app_name)?;
        if !file_path.exists() {
            log::debug!("PreferencesManager: {file_path:?} does not exist, using defaults.");
            return Ok(Preferences::default());
        }
        let text = fs::read_to_string(&file_path)?;
        let preferences: Preferences = serde_json::from_str(&text)?;
        log::debug!("PreferencesManager: Loaded {preferences:?} from {file_path:?}.");
        Ok(preferences)
    }

    fn save_preferences(&self, app_name: &str, preferences: &Preferences) -> Result<()> {
        let file_path = self.preferences_file(app_name)?;
        let text = serde_json::to_string_pretty(preferences)?;
        fs::write(&file_path, text)?;
        log::debug!("PreferencesManager: Saved {preferences:?} to {file_path:?}.");
        Ok(())
    }
}
