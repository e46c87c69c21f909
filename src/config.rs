//! Saved defaults for the command line.
//!
//! Config files hold the same flags the binary accepts, one or more per
//! line, with `#` comments. Flags merge global, then local, then command
//! line; later sources win for values and booleans accumulate.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::options::{DiagramProps, Dimension, LayoutEngine};
use crate::theme::DarkModeContext;

pub const APP_DIR: &str = "d2-slides";
pub const LOCAL_CONFIG_FILE: &str = ".d2slidesrc";

/// Page appearance: follow nothing, or pin light or dark.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The dark-mode context a render should see.
    ///
    /// `Auto` has no host to ask, so it behaves as a host without dark-mode
    /// support.
    pub fn dark_mode_context(self) -> DarkModeContext {
        match self {
            Self::Auto => DarkModeContext::unavailable(),
            Self::Light => DarkModeContext::new(false),
            Self::Dark => DarkModeContext::new(true),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub sketch: bool,
    pub fit: bool,
    pub no_center: bool,
    pub force_appendix: bool,
    pub standalone: bool,
    /// Theme name or numeric id
    pub theme: Option<String>,
    pub dark_theme: Option<String>,
    pub appearance: Option<ThemeMode>,
    pub layout: Option<LayoutEngine>,
    pub pad: Option<f64>,
    pub scale: Option<f64>,
    pub max_width: Option<String>,
    pub max_height: Option<String>,
    pub d2_bin: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            sketch: self.sketch || other.sketch,
            fit: self.fit || other.fit,
            no_center: self.no_center || other.no_center,
            force_appendix: self.force_appendix || other.force_appendix,
            standalone: self.standalone || other.standalone,
            theme: other.theme.clone().or_else(|| self.theme.clone()),
            dark_theme: other.dark_theme.clone().or_else(|| self.dark_theme.clone()),
            appearance: other.appearance.or(self.appearance),
            layout: other.layout.or(self.layout),
            pad: other.pad.or(self.pad),
            scale: other.scale.or(self.scale),
            max_width: other.max_width.clone().or_else(|| self.max_width.clone()),
            max_height: other.max_height.clone().or_else(|| self.max_height.clone()),
            d2_bin: other.d2_bin.clone().or_else(|| self.d2_bin.clone()),
        }
    }

    /// Overlay the diagram-affecting flags onto `props`.
    pub fn apply_to(&self, mut props: DiagramProps) -> DiagramProps {
        if let Some(theme) = &self.theme {
            match theme.parse::<u32>() {
                Ok(id) => props.theme_id = Some(id),
                Err(_) => props.theme = Some(theme.clone()),
            }
        }
        if let Some(theme) = &self.dark_theme {
            match theme.parse::<u32>() {
                Ok(id) => props.dark_theme_id = Some(id),
                Err(_) => props.dark_theme = Some(theme.clone()),
            }
        }
        props.sketch |= self.sketch;
        props.fit |= self.fit;
        props.force_appendix |= self.force_appendix;
        if self.no_center {
            props.center = false;
        }
        if let Some(layout) = self.layout {
            props.layout_engine = layout;
        }
        if let Some(pad) = self.pad {
            props.pad = pad;
        }
        if let Some(scale) = self.scale {
            props.scale = scale;
        }
        if let Some(max_width) = &self.max_width {
            props.max_width = Dimension::parse_arg(max_width);
        }
        if let Some(max_height) = &self.max_height {
            props.max_height = Dimension::parse_arg(max_height);
        }
        props
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_CONFIG_FILE)
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    let flags = parse_flag_tokens(&tokens);
    tracing::debug!(path = %path.display(), ?flags, "loaded config");
    Ok(flags)
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# d2-slides defaults (saved with --save)".to_string()];
    let switches = [
        (flags.watch, "--watch"),
        (flags.sketch, "--sketch"),
        (flags.fit, "--fit"),
        (flags.no_center, "--no-center"),
        (flags.force_appendix, "--force-appendix"),
        (flags.standalone, "--standalone"),
    ];
    lines.extend(
        switches
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, flag)| (*flag).to_string()),
    );
    if let Some(theme) = &flags.theme {
        lines.push(format!("--theme {theme}"));
    }
    if let Some(theme) = &flags.dark_theme {
        lines.push(format!("--dark-theme {theme}"));
    }
    if let Some(appearance) = flags.appearance {
        lines.push(format!("--appearance {}", appearance.as_str()));
    }
    if let Some(layout) = flags.layout {
        lines.push(format!("--layout {layout}"));
    }
    if let Some(pad) = flags.pad {
        lines.push(format!("--pad {pad}"));
    }
    if let Some(scale) = flags.scale {
        lines.push(format!("--scale {scale}"));
    }
    if let Some(max_width) = &flags.max_width {
        lines.push(format!("--max-width {max_width}"));
    }
    if let Some(max_height) = &flags.max_height {
        lines.push(format!("--max-height {max_height}"));
    }
    if let Some(bin) = &flags.d2_bin {
        lines.push(format!("--d2-bin {}", bin.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of `tokens`. Unknown tokens and values that do
/// not parse are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--watch" => flags.watch = true,
            "--sketch" => flags.sketch = true,
            "--fit" => flags.fit = true,
            "--no-center" => flags.no_center = true,
            "--force-appendix" => flags.force_appendix = true,
            "--standalone" => flags.standalone = true,
            _ => {
                let (name, inline) = match token.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (token, None),
                };
                if takes_value(name) {
                    let value = match inline {
                        Some(value) => Some(value),
                        None => {
                            let next = tokens.get(i + 1).map(String::as_str);
                            if next.is_some() {
                                i += 1;
                            }
                            next
                        }
                    };
                    if let Some(value) = value {
                        apply_value(&mut flags, name, value);
                    }
                }
            }
        }
        i += 1;
    }
    flags
}

fn takes_value(name: &str) -> bool {
    matches!(
        name,
        "--theme"
            | "--dark-theme"
            | "--appearance"
            | "--layout"
            | "--pad"
            | "--scale"
            | "--max-width"
            | "--max-height"
            | "--d2-bin"
    )
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--theme" => flags.theme = Some(value.to_string()),
        "--dark-theme" => flags.dark_theme = Some(value.to_string()),
        "--appearance" => flags.appearance = parse_appearance(value),
        "--layout" => flags.layout = parse_layout(value),
        "--pad" => flags.pad = value.parse().ok(),
        "--scale" => flags.scale = value.parse().ok(),
        "--max-width" => flags.max_width = Some(value.to_string()),
        "--max-height" => flags.max_height = Some(value.to_string()),
        "--d2-bin" => flags.d2_bin = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_appearance(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

fn parse_layout(s: &str) -> Option<LayoutEngine> {
    match s {
        "dagre" => Some(LayoutEngine::Dagre),
        "elk" => Some(LayoutEngine::Elk),
        _ => None,
    }
}
