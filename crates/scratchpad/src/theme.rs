use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use log::warn;

use crate::storage::Persistence;
use crate::surface::Surface;

/// DOM attribute carrying the active theme name.
pub const THEME_ATTRIBUTE: &str = "data-theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Glyph on the toggle button; it shows where a press would take you.
    pub fn glyph(self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

pub struct ThemeController {
    current: Cell<Theme>,
    persistence: Persistence,
    surface: Rc<dyn Surface>,
}

impl ThemeController {
    pub fn new(persistence: Persistence, surface: Rc<dyn Surface>) -> Self {
        Self {
            current: Cell::new(Theme::default()),
            persistence,
            surface,
        }
    }

    pub fn current(&self) -> Theme {
        self.current.get()
    }

    /// Apply the persisted theme, or the default when none was saved.
    pub fn restore(&self) -> Theme {
        let theme = self.persistence.load_theme().unwrap_or_default();
        self.current.set(theme);
        self.surface.apply_theme(theme);
        theme
    }

    pub fn toggle(&self) -> Theme {
        let theme = self.current.get().toggled();
        self.current.set(theme);
        if let Err(error) = self.persistence.save_theme(theme) {
            warn!("Failed to store theme preference: {error}");
        }
        self.surface.apply_theme(theme);
        theme
    }
}
