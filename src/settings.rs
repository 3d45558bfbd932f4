//! Theme and editor settings provider.
//!
//! Theme and settings are stored under their own keys next to the note
//! state. Loading never fails: unreadable values are logged and replaced
//! by defaults, and every change is written back best-effort.
use std::{fmt, str::FromStr};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::{FileStorage, Result, SterlingError, SETTINGS_KEY, THEME_KEY};

pub const DEFAULT_PRIMARY_COLOR: &str = "#0ea5e9";
pub const DEFAULT_ACCENT_COLOR: &str = "#d946ef";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    /// light → dark → system → light
    pub fn next(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::System,
            ThemeMode::System => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        };
        f.write_str(name)
    }
}

impl FromStr for ThemeMode {
    type Err = SterlingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            other => Err(SterlingError::InvalidSetting {
                key: "theme".to_string(),
                message: format!("unknown mode '{}', expected light, dark or system", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub mode: ThemeMode,
    pub primary_color: String,
    pub accent_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: ThemeMode::System,
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub theme: Theme,
    pub auto_save: bool,
    pub spell_check: bool,
    pub word_wrap: bool,
    pub font_size: u32,
    pub font_family: String,
    pub sidebar_width: u32,
    pub show_line_numbers: bool,
    pub show_minimap: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            auto_save: true,
            spell_check: true,
            word_wrap: true,
            font_size: 14,
            font_family: "Inter".to_string(),
            sidebar_width: 250,
            show_line_numbers: false,
            show_minimap: false,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| SterlingError::InvalidSetting {
            key: key.to_string(),
            message: format!("'{}': {}", value, e),
        })
}

#[derive(Debug, Default)]
pub struct SettingsProvider {
    theme: Theme,
    settings: AppSettings,
    storage: Option<FileStorage>,
}

impl SettingsProvider {
    /// Defaults without persistence
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads theme and settings from `storage`, falling back to defaults
    pub fn load(storage: FileStorage) -> Self {
        let theme = match storage.read_key::<Theme>(THEME_KEY) {
            Ok(theme) => theme.unwrap_or_default(),
            Err(e) => {
                error!("Error loading theme: {}", e);
                Theme::default()
            }
        };
        let settings = match storage.read_key::<AppSettings>(SETTINGS_KEY) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                error!("Error loading settings: {}", e);
                AppSettings::default()
            }
        };
        debug!("Loaded theme mode {}", theme.mode);

        Self {
            theme,
            settings,
            storage: Some(storage),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Updates one setting from its textual form.
    ///
    /// Keys are the snake_case field names; `theme`, `primary_color` and
    /// `accent_color` update the theme.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "theme" | "mode" => self.theme.mode = value.parse()?,
            "primary_color" => self.theme.primary_color = value.trim().to_string(),
            "accent_color" => self.theme.accent_color = value.trim().to_string(),
            "auto_save" => self.settings.auto_save = parse_value(key, value)?,
            "spell_check" => self.settings.spell_check = parse_value(key, value)?,
            "word_wrap" => self.settings.word_wrap = parse_value(key, value)?,
            "font_size" => self.settings.font_size = parse_value(key, value)?,
            "font_family" => self.settings.font_family = value.trim().to_string(),
            "sidebar_width" => self.settings.sidebar_width = parse_value(key, value)?,
            "show_line_numbers" => self.settings.show_line_numbers = parse_value(key, value)?,
            "show_minimap" => self.settings.show_minimap = parse_value(key, value)?,
            _ => {
                return Err(SterlingError::InvalidSetting {
                    key: key.to_string(),
                    message: "unknown setting".to_string(),
                })
            }
        }

        info!("Setting {} updated", key);
        self.persist();
        Ok(())
    }

    /// Cycles the theme mode and returns the new one
    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.theme.mode = self.theme.mode.next();
        info!("Theme mode is now {}", self.theme.mode);
        self.persist();
        self.theme.mode
    }

    pub fn reset(&mut self) {
        self.theme = Theme::default();
        self.settings = AppSettings::default();
        info!("Theme and settings reset to defaults");
        self.persist();
    }

    fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = storage.write_key(THEME_KEY, &self.theme) {
            error!("Error saving theme: {}", e);
        }
        if let Err(e) = storage.write_key(SETTINGS_KEY, &self.settings) {
            error!("Error saving settings: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let provider = SettingsProvider::new();
        let settings = provider.settings();
        assert_eq!(provider.theme().mode, ThemeMode::System);
        assert_eq!(provider.theme().primary_color, "#0ea5e9");
        assert_eq!(provider.theme().accent_color, "#d946ef");
        assert!(settings.auto_save && settings.spell_check && settings.word_wrap);
        assert_eq!(settings.font_size, 14);
        assert_eq!(settings.font_family, "Inter");
        assert_eq!(settings.sidebar_width, 250);
        assert!(!settings.show_line_numbers);
        assert!(!settings.show_minimap);
    }

    #[test]
    fn toggle_cycles_through_modes() {
        let mut provider = SettingsProvider::new();
        assert_eq!(provider.toggle_theme(), ThemeMode::Light);
        assert_eq!(provider.toggle_theme(), ThemeMode::Dark);
        assert_eq!(provider.toggle_theme(), ThemeMode::System);
    }

    #[test]
    fn set_parses_typed_values() {
        let mut provider = SettingsProvider::new();
        provider.set("font_size", "18").expect("valid size");
        provider.set("show_minimap", "true").expect("valid flag");
        provider.set("theme", "Dark").expect("valid mode");

        assert_eq!(provider.settings().font_size, 18);
        assert!(provider.settings().show_minimap);
        assert_eq!(provider.theme().mode, ThemeMode::Dark);

        assert!(matches!(
            provider.set("font_size", "huge"),
            Err(SterlingError::InvalidSetting { .. })
        ));
        assert!(matches!(
            provider.set("colour", "red"),
            Err(SterlingError::InvalidSetting { .. })
        ));
        assert_eq!(provider.settings().font_size, 18);
    }

    #[test]
    fn changes_survive_reload() {
        let dir = TempDir::new().expect("temp dir should be created");
        let mut provider = SettingsProvider::load(FileStorage::new(dir.path()));
        provider.toggle_theme();
        provider.set("sidebar_width", "300").expect("valid width");

        let reloaded = SettingsProvider::load(FileStorage::new(dir.path()));
        assert_eq!(reloaded.theme().mode, ThemeMode::Light);
        assert_eq!(reloaded.settings().sidebar_width, 300);

        let raw = fs::read_to_string(dir.path().join("sterling-settings.json"))
            .expect("settings file should exist");
        assert!(raw.contains("\"sidebarWidth\":300"));
    }

    #[test]
    fn unreadable_values_fall_back_to_defaults() {
        let dir = TempDir::new().expect("temp dir should be created");
        fs::write(dir.path().join("sterling-theme.json"), "not json")
            .expect("fixture should be written");

        let provider = SettingsProvider::load(FileStorage::new(dir.path()));
        assert_eq!(provider.theme(), &Theme::default());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut provider = SettingsProvider::new();
        provider.set("font_family", "Fira Code").expect("valid family");
        provider.toggle_theme();
        provider.reset();

        assert_eq!(provider.settings(), &AppSettings::default());
        assert_eq!(provider.theme(), &Theme::default());
    }
}
