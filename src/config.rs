use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{Result, SterlingError};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Directory where application state is stored
    pub data_dir: PathBuf,

    /// Default editor command
    pub editor_command: Option<String>,

    /// Width of the graph viewport
    pub viewport_width: f64,

    /// Height of the graph viewport
    pub viewport_height: f64,

    /// Milliseconds between two ticks of the live layout
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            editor_command: None,
            viewport_width: 800.0,
            viewport_height: 600.0,
            tick_interval_ms: 16,
        }
    }
}

/// Platform data directory, or `.sterling` in the working directory
pub fn default_data_dir() -> PathBuf {
    match ProjectDirs::from("", "", "sterling") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            warn!("No home directory found, storing data in ./.sterling");
            PathBuf::from(".sterling")
        }
    }
}

impl Config {
    /// Reads a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SterlingError::ConfigError {
                message: format!("Config file not found: {}", path.display()),
            });
        }

        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| SterlingError::ConfigError {
            message: format!("Invalid config {}: {}", path.display(), e),
        })
    }

    /// Loads `path` when given, otherwise the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -W -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}
