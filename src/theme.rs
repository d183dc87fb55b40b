use ratatui::style::Color;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::storage::KeyValueStore;

pub const THEME_STORAGE_KEY: &str = "theme";

// Color palette structure
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_09: Color, // Orange
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
    pub base_0e: Color, // Purple
    pub base_0f: Color, // Brown
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(ThemeMode::Dark),
            "light" => Some(ThemeMode::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    /// Label of the toggle button, naming the mode it switches to.
    pub fn toggle_label(self) -> &'static str {
        match self {
            ThemeMode::Dark => "Light Mode",
            ThemeMode::Light => "Dark Mode",
        }
    }

    pub fn palette(self) -> &'static Base16Palette {
        match self {
            ThemeMode::Dark => &DARK_PALETTE,
            ThemeMode::Light => &LIGHT_PALETTE,
        }
    }

    /// Stored preference if present and valid, otherwise `fallback`.
    pub fn load(storage: &dyn KeyValueStore, fallback: ThemeMode) -> Self {
        match storage.get(THEME_STORAGE_KEY) {
            Some(value) => Self::parse(&value).unwrap_or_else(|| {
                log::warn!("Ignoring unknown stored theme '{value}'");
                fallback
            }),
            None => fallback,
        }
    }

    pub fn save(self, storage: &mut dyn KeyValueStore) {
        if let Err(e) = storage.set(THEME_STORAGE_KEY, self.as_str().to_string()) {
            log::error!("Failed to save theme preference: {e}");
        }
    }
}

static DARK_MODE: AtomicBool = AtomicBool::new(true);

pub fn current_theme_mode() -> ThemeMode {
    if DARK_MODE.load(Ordering::Relaxed) {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

pub fn set_theme_mode(mode: ThemeMode) {
    DARK_MODE.store(mode == ThemeMode::Dark, Ordering::Relaxed);
}

pub fn current_theme() -> &'static Base16Palette {
    current_theme_mode().palette()
}

// Slate and indigo, after the dark web theme
static DARK_PALETTE: LazyLock<Base16Palette> = LazyLock::new(|| Base16Palette {
    base_00: Color::Rgb(0x0F, 0x17, 0x2A), // slate-900
    base_01: Color::Rgb(0x1E, 0x29, 0x3B), // slate-800
    base_02: Color::Rgb(0x33, 0x41, 0x55), // slate-700
    base_03: Color::Rgb(0x64, 0x74, 0x8B), // slate-500
    base_04: Color::Rgb(0x94, 0xA3, 0xB8), // slate-400
    base_05: Color::Rgb(0xCB, 0xD5, 0xE1), // slate-300
    base_06: Color::Rgb(0xE2, 0xE8, 0xF0), // slate-200
    base_07: Color::Rgb(0xF8, 0xFA, 0xFC), // slate-50
    base_08: Color::Rgb(0xF4, 0x72, 0xB6), // pink-400
    base_09: Color::Rgb(0xF5, 0x9E, 0x0B), // amber-500
    base_0a: Color::Rgb(0xFB, 0xBF, 0x24), // amber-400
    base_0b: Color::Rgb(0x34, 0xD3, 0x99), // emerald-400
    base_0c: Color::Rgb(0x67, 0xE8, 0xF9), // cyan-300
    base_0d: Color::Rgb(0x81, 0x8C, 0xF8), // indigo-400
    base_0e: Color::Rgb(0xA5, 0xB4, 0xFC), // indigo-300
    base_0f: Color::Rgb(0xB4, 0x53, 0x09), // amber-700
});

static LIGHT_PALETTE: LazyLock<Base16Palette> = LazyLock::new(|| Base16Palette {
    base_00: Color::Rgb(0xFF, 0xFF, 0xFF),
    base_01: Color::Rgb(0xF8, 0xFA, 0xFC), // slate-50
    base_02: Color::Rgb(0xE2, 0xE8, 0xF0), // slate-200
    base_03: Color::Rgb(0x94, 0xA3, 0xB8), // slate-400
    base_04: Color::Rgb(0x64, 0x74, 0x8B), // slate-500
    base_05: Color::Rgb(0x33, 0x41, 0x55), // slate-700
    base_06: Color::Rgb(0x1E, 0x29, 0x3B), // slate-800
    base_07: Color::Rgb(0x0F, 0x17, 0x2A), // slate-900
    base_08: Color::Rgb(0xDB, 0x27, 0x77), // pink-600
    base_09: Color::Rgb(0xD9, 0x77, 0x06), // amber-600
    base_0a: Color::Rgb(0xB4, 0x53, 0x09), // amber-700
    base_0b: Color::Rgb(0x05, 0x96, 0x69), // emerald-600
    base_0c: Color::Rgb(0x08, 0x91, 0xB2), // cyan-600
    base_0d: Color::Rgb(0x4F, 0x46, 0xE5), // indigo-600
    base_0e: Color::Rgb(0x31, 0x2E, 0x81), // indigo-900
    base_0f: Color::Rgb(0x92, 0x40, 0x0E), // amber-800
});

// Color utilities for focus states
impl Base16Palette {
    // Get colors for focused/unfocused panels
    pub fn get_panel_colors(&self, is_focused: bool) -> (Color, Color, Color) {
        if is_focused {
            (self.base_07, self.base_04, self.base_00)
        } else {
            (self.base_03, self.base_03, self.base_00)
        }
    }

    // Get selection colors for focused/unfocused states
    pub fn get_selection_colors(&self, is_focused: bool) -> (Color, Color) {
        if is_focused {
            (self.base_02, self.base_06)
        } else {
            (self.base_02, self.base_03)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StateStore;

    #[test]
    fn test_theme_round_trips_through_storage() {
        let mut storage = StateStore::ephemeral();
        assert_eq!(ThemeMode::load(&storage, ThemeMode::Light), ThemeMode::Light);

        ThemeMode::Dark.save(&mut storage);
        assert_eq!(storage.get(THEME_STORAGE_KEY).as_deref(), Some("dark"));
        assert_eq!(ThemeMode::load(&storage, ThemeMode::Light), ThemeMode::Dark);

        ThemeMode::Dark.toggled().save(&mut storage);
        assert_eq!(storage.get(THEME_STORAGE_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_unknown_stored_value_uses_fallback() {
        let mut storage = StateStore::ephemeral();
        storage
            .set(THEME_STORAGE_KEY, "solarized".to_string())
            .unwrap();
        assert_eq!(ThemeMode::load(&storage, ThemeMode::Dark), ThemeMode::Dark);
    }

    #[test]
    fn test_toggle_label_names_target_mode() {
        assert_eq!(ThemeMode::Dark.toggle_label(), "Light Mode");
        assert_eq!(ThemeMode::Light.toggle_label(), "Dark Mode");
    }
}
