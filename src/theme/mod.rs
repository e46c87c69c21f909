//! D2 theme catalog and theme resolution.
//!
//! D2 identifies its visual presets by number. Consumers may pick a theme
//! by id or by its human-readable name, separately for light and dark
//! appearance; [`ThemeSelection`] folds those choices and the host
//! dark-mode flag into the single id used for a render pass.

pub mod dark_mode;

pub use dark_mode::DarkModeContext;

/// Static name-to-id table of the themes D2 ships with.
pub const THEMES: &[(&str, u32)] = &[
    // Light
    ("neutral-default", 0),
    ("neutral-grey", 1),
    ("flagship-terrastruct", 3),
    ("cool-classics", 4),
    ("mixed-berry-blue", 5),
    ("grape-soda", 6),
    ("aubergine", 7),
    ("colorblind-clear", 8),
    ("vanilla-nitro-cola", 100),
    ("orange-creamsicle", 101),
    ("shirley-temple", 102),
    ("earth-tones", 103),
    ("everglade-green", 104),
    ("buttered-toast", 105),
    // Special
    ("terminal", 300),
    ("terminal-grayscale", 301),
    ("origami", 302),
    // Dark
    ("dark-mauve", 200),
    ("dark-flagship-terrastruct", 201),
];

/// `neutral-default`
pub const DEFAULT_LIGHT_THEME_ID: u32 = 0;

/// `dark-mauve`
pub const DEFAULT_DARK_THEME_ID: u32 = 200;

/// Look up a theme id by catalog name.
pub fn theme_id(name: &str) -> Option<u32> {
    THEMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, id)| *id)
}

/// Look up the catalog name of a theme id.
pub fn theme_name(id: u32) -> Option<&'static str> {
    THEMES
        .iter()
        .find(|(_, candidate)| *candidate == id)
        .map(|(name, _)| *name)
}

/// Resolve the theme id to render with.
///
/// An explicit id wins outright. Otherwise a name found in [`THEMES`] maps
/// to its id. Anything else, including an unknown name, yields `fallback`.
pub fn resolve_theme_id(explicit_id: Option<u32>, explicit_name: Option<&str>, fallback: u32) -> u32 {
    if let Some(id) = explicit_id {
        return id;
    }
    if let Some(name) = explicit_name {
        if let Some(id) = theme_id(name) {
            return id;
        }
        tracing::debug!(theme = name, fallback, "unknown theme name, using fallback");
    }
    fallback
}

/// Light and dark theme choices for one diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSelection {
    pub theme_id: Option<u32>,
    pub theme: Option<String>,
    pub dark_theme_id: Option<u32>,
    pub dark_theme: Option<String>,
    /// Follow the host dark-mode flag.
    pub auto_sync_dark_mode: bool,
}

impl Default for ThemeSelection {
    fn default() -> Self {
        Self {
            theme_id: None,
            theme: None,
            dark_theme_id: None,
            dark_theme: None,
            auto_sync_dark_mode: true,
        }
    }
}

impl ThemeSelection {
    /// The theme id for the current appearance.
    ///
    /// The dark choices only apply when auto-sync is on and the host is
    /// dark; every other combination resolves the light choices.
    pub fn active_theme_id(&self, is_dark: bool) -> u32 {
        if self.auto_sync_dark_mode && is_dark {
            resolve_theme_id(
                self.dark_theme_id,
                self.dark_theme.as_deref(),
                DEFAULT_DARK_THEME_ID,
            )
        } else {
            resolve_theme_id(
                self.theme_id,
                self.theme.as_deref(),
                DEFAULT_LIGHT_THEME_ID,
            )
        }
    }
}
