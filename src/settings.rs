use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::scroll_tracker::{ScrollConfig, SectionGranularity};
use crate::theme::ThemeMode;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const STATE_FILENAME: &str = "state.json";
pub const APP_NAME: &str = "chapterbook";

/// Theme used when nothing is stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefaultTheme {
    /// Terminals do not report a colour scheme preference, so this is dark.
    #[default]
    System,
    Dark,
    Light,
}

impl DefaultTheme {
    pub fn resolve(self) -> ThemeMode {
        match self {
            DefaultTheme::System | DefaultTheme::Dark => ThemeMode::Dark,
            DefaultTheme::Light => ThemeMode::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultTheme::System => "system",
            DefaultTheme::Dark => "dark",
            DefaultTheme::Light => "light",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub default_theme: DefaultTheme,

    #[serde(default)]
    pub margin: u16,

    /// Rows added to the scroll offset before classifying the active section.
    #[serde(default = "default_look_ahead")]
    pub look_ahead: usize,

    #[serde(default = "default_scroll_top_threshold")]
    pub scroll_top_threshold: usize,

    /// Rows kept above a navigation target.
    #[serde(default = "default_header_clearance")]
    pub header_clearance: usize,

    #[serde(default = "default_scroll_throttle_ms")]
    pub scroll_throttle_ms: u64,

    #[serde(default)]
    pub section_granularity: SectionGranularity,

    #[serde(default = "default_true")]
    pub smooth_scroll: bool,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_look_ahead() -> usize {
    3
}

fn default_scroll_top_threshold() -> usize {
    30
}

fn default_header_clearance() -> usize {
    1
}

fn default_scroll_throttle_ms() -> u64 {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            default_theme: DefaultTheme::default(),
            margin: 0,
            look_ahead: default_look_ahead(),
            scroll_top_threshold: default_scroll_top_threshold(),
            header_clearance: default_header_clearance(),
            scroll_throttle_ms: default_scroll_throttle_ms(),
            section_granularity: SectionGranularity::default(),
            smooth_scroll: true,
        }
    }
}

impl Settings {
    pub fn scroll_config(&self) -> ScrollConfig {
        ScrollConfig {
            look_ahead: self.look_ahead,
            scroll_top_threshold: self.scroll_top_threshold,
            granularity: self.section_granularity,
        }
    }

    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Default location of the persisted reader state.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|data| data.join(APP_NAME).join(STATE_FILENAME))
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {path:?}");
                if settings.version != CURRENT_VERSION {
                    save_settings_to_file(&settings, path);
                }
                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

/// Parses a config file and brings it up to the current version.
pub fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    let mut settings: Settings = serde_yaml::from_str(content)?;
    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
    }
    Ok(settings)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(SETTINGS_HEADER);
    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(&format!(
        "default_theme: {}\n",
        settings.default_theme.as_str()
    ));
    content.push_str(&format!("margin: {}\n", settings.margin));
    content.push_str(&format!("look_ahead: {}\n", settings.look_ahead));
    content.push_str(&format!(
        "scroll_top_threshold: {}\n",
        settings.scroll_top_threshold
    ));
    content.push_str(&format!("header_clearance: {}\n", settings.header_clearance));
    content.push_str(&format!(
        "scroll_throttle_ms: {}\n",
        settings.scroll_throttle_ms
    ));
    let granularity = match settings.section_granularity {
        SectionGranularity::Chapter => "chapter",
        SectionGranularity::Section => "section",
    };
    content.push_str(&format!("section_granularity: {granularity}\n"));
    content.push_str(&format!("smooth_scroll: {}\n", settings.smooth_scroll));

    content
}

const SETTINGS_HEADER: &str = r#"# chapterbook settings
#
# default_theme: system | dark | light (used until a theme is toggled)
# look_ahead: rows below the top edge that already count as "current"
# scroll_top_threshold: rows scrolled before the back-to-top hint appears
# section_granularity: chapter | section (sidebar highlight depth)

"#;

// Public API for accessing settings

pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn get_margin() -> u16 {
    SETTINGS.read().map(|s| s.margin).unwrap_or(0)
}

pub fn get_default_theme() -> DefaultTheme {
    SETTINGS
        .read()
        .map(|s| s.default_theme)
        .unwrap_or_default()
}

pub fn scroll_config() -> ScrollConfig {
    current().scroll_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = parse_settings("margin: 2\n").unwrap();
        assert_eq!(settings.margin, 2);
        assert_eq!(settings.look_ahead, default_look_ahead());
        assert_eq!(settings.default_theme, DefaultTheme::System);
        assert_eq!(settings.version, CURRENT_VERSION);
    }

    #[test]
    fn test_old_version_is_migrated() {
        let settings = parse_settings("version: 0\nheader_clearance: 4\n").unwrap();
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(settings.header_clearance, 4);
    }

    #[test]
    fn test_generated_yaml_parses_back() {
        let settings = Settings {
            default_theme: DefaultTheme::Light,
            section_granularity: SectionGranularity::Section,
            smooth_scroll: false,
            ..Settings::default()
        };
        let parsed = parse_settings(&generate_settings_yaml(&settings)).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_system_theme_resolves_to_dark() {
        assert_eq!(DefaultTheme::System.resolve(), ThemeMode::Dark);
        assert_eq!(DefaultTheme::Light.resolve(), ThemeMode::Light);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILENAME);
        save_settings_to_file(&Settings::default(), &path);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(parse_settings(&content).unwrap(), Settings::default());
    }
}
