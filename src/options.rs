//! Diagram props and the engine option objects built from them.
//!
//! [`DiagramProps`] is what an embedding host configures. Compile and render
//! options are rebuilt from the props on every compile; they have no
//! identity of their own.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::CompileInput;
use crate::theme::ThemeSelection;

/// Virtual file set used to resolve D2 imports: path to source text.
pub type FileSet = BTreeMap<String, String>;

pub const DEFAULT_INPUT_PATH: &str = "index.d2";
pub const DEFAULT_ARIA_LABEL: &str = "D2 Diagram";

#[derive(
    clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEngine {
    #[default]
    Dagre,
    Elk,
}

impl LayoutEngine {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dagre => "dagre",
            Self::Elk => "elk",
        }
    }
}

impl fmt::Display for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container dimension. Numbers are pixels, strings are passed through
/// as CSS (`"100%"`, `"40rem"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Px(f64),
    Css(String),
}

impl Dimension {
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// Parse a command-line value: bare numbers are pixels.
    pub fn parse_arg(value: &str) -> Self {
        value
            .trim()
            .parse::<f64>()
            .map_or_else(|_| Self::css(value.trim()), Self::Px)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(px) => write!(f, "{px}px"),
            Self::Css(value) => f.write_str(value),
        }
    }
}

impl From<f64> for Dimension {
    fn from(px: f64) -> Self {
        Self::Px(px)
    }
}

impl From<u32> for Dimension {
    fn from(px: u32) -> Self {
        Self::Px(f64::from(px))
    }
}

impl From<&str> for Dimension {
    fn from(value: &str) -> Self {
        Self::Css(value.to_string())
    }
}

const fn default_true() -> bool {
    true
}

const fn default_scale() -> f64 {
    1.0
}

const fn default_pad() -> f64 {
    100.0
}

fn default_input_path() -> String {
    DEFAULT_INPUT_PATH.to_string()
}

fn default_max_width() -> Dimension {
    Dimension::css("100%")
}

fn default_max_height() -> Dimension {
    Dimension::css("500px")
}

fn default_aria_label() -> String {
    DEFAULT_ARIA_LABEL.to_string()
}

/// Everything an embedding host can configure for one diagram.
///
/// Deserializes from the camelCase shape hosts already use, e.g.
/// `{"code": "a -> b", "themeId": 6, "layoutEngine": "elk"}`. Only `code`
/// is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramProps {
    /// D2 source text.
    pub code: String,

    // Theme
    /// Numeric theme id; takes precedence over `theme`.
    #[serde(default)]
    pub theme_id: Option<u32>,
    /// Theme catalog name.
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub dark_theme_id: Option<u32>,
    #[serde(default)]
    pub dark_theme: Option<String>,
    /// Follow the host dark-mode flag.
    #[serde(default = "default_true")]
    pub auto_sync_dark_mode: bool,

    // Rendering
    /// Hand-drawn style.
    #[serde(default)]
    pub sketch: bool,
    #[serde(default = "default_true")]
    pub center: bool,
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Padding around the diagram in pixels.
    #[serde(default = "default_pad")]
    pub pad: f64,
    #[serde(default)]
    pub layout_engine: LayoutEngine,

    // Multi-board diagrams
    /// Milliseconds between boards when animating.
    #[serde(default)]
    pub animate_interval: Option<u32>,
    /// Board to render.
    #[serde(default)]
    pub target: Option<String>,

    // Imports
    #[serde(default)]
    pub fs: Option<FileSet>,
    /// Path the source is injected at when `fs` is used.
    #[serde(default = "default_input_path")]
    pub input_path: String,

    /// Append tooltips and links as an appendix.
    #[serde(default)]
    pub force_appendix: bool,

    // Container
    #[serde(default)]
    pub width: Option<Dimension>,
    #[serde(default)]
    pub height: Option<Dimension>,
    #[serde(default = "default_max_width")]
    pub max_width: Dimension,
    #[serde(default = "default_max_height")]
    pub max_height: Dimension,
    /// Let the container, not the SVG, decide the rendered size.
    #[serde(default)]
    pub fit: bool,
    #[serde(default = "default_aria_label")]
    pub aria_label: String,
}

impl Default for DiagramProps {
    fn default() -> Self {
        Self::new("")
    }
}

impl DiagramProps {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            theme_id: None,
            theme: None,
            dark_theme_id: None,
            dark_theme: None,
            auto_sync_dark_mode: true,
            sketch: false,
            center: true,
            scale: default_scale(),
            pad: default_pad(),
            layout_engine: LayoutEngine::Dagre,
            animate_interval: None,
            target: None,
            fs: None,
            input_path: default_input_path(),
            force_appendix: false,
            width: None,
            height: None,
            max_width: default_max_width(),
            max_height: default_max_height(),
            fit: false,
            aria_label: default_aria_label(),
        }
    }

    pub fn with_theme(mut self, name: impl Into<String>) -> Self {
        self.theme = Some(name.into());
        self
    }

    pub const fn with_theme_id(mut self, id: u32) -> Self {
        self.theme_id = Some(id);
        self
    }

    pub fn with_dark_theme(mut self, name: impl Into<String>) -> Self {
        self.dark_theme = Some(name.into());
        self
    }

    pub const fn with_dark_theme_id(mut self, id: u32) -> Self {
        self.dark_theme_id = Some(id);
        self
    }

    pub const fn with_auto_sync_dark_mode(mut self, enabled: bool) -> Self {
        self.auto_sync_dark_mode = enabled;
        self
    }

    pub const fn with_sketch(mut self, enabled: bool) -> Self {
        self.sketch = enabled;
        self
    }

    pub const fn with_center(mut self, enabled: bool) -> Self {
        self.center = enabled;
        self
    }

    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub const fn with_pad(mut self, pad: f64) -> Self {
        self.pad = pad;
        self
    }

    pub const fn with_layout_engine(mut self, layout: LayoutEngine) -> Self {
        self.layout_engine = layout;
        self
    }

    pub const fn with_animate_interval(mut self, interval_ms: u32) -> Self {
        self.animate_interval = Some(interval_ms);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_files(mut self, files: FileSet) -> Self {
        self.fs = Some(files);
        self
    }

    pub fn with_input_path(mut self, path: impl Into<String>) -> Self {
        self.input_path = path.into();
        self
    }

    pub const fn with_force_appendix(mut self, enabled: bool) -> Self {
        self.force_appendix = enabled;
        self
    }

    pub fn with_width(mut self, width: impl Into<Dimension>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn with_height(mut self, height: impl Into<Dimension>) -> Self {
        self.height = Some(height.into());
        self
    }

    pub fn with_max_width(mut self, max_width: impl Into<Dimension>) -> Self {
        self.max_width = max_width.into();
        self
    }

    pub fn with_max_height(mut self, max_height: impl Into<Dimension>) -> Self {
        self.max_height = max_height.into();
        self
    }

    pub const fn with_fit(mut self, enabled: bool) -> Self {
        self.fit = enabled;
        self
    }

    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = label.into();
        self
    }

    /// Empty and whitespace-only sources are never sent to the engine.
    pub fn is_blank(&self) -> bool {
        self.code.trim().is_empty()
    }

    pub fn theme_selection(&self) -> ThemeSelection {
        ThemeSelection {
            theme_id: self.theme_id,
            theme: self.theme.clone(),
            dark_theme_id: self.dark_theme_id,
            dark_theme: self.dark_theme.clone(),
            auto_sync_dark_mode: self.auto_sync_dark_mode,
        }
    }

    /// Dark theme forwarded to the engine.
    ///
    /// With auto-sync on, the host flag has already picked the active theme,
    /// so the engine must not switch a second time on its own.
    fn engine_dark_theme_id(&self) -> Option<u32> {
        if self.auto_sync_dark_mode {
            return None;
        }
        self.dark_theme_id
            .or_else(|| self.dark_theme.as_deref().and_then(crate::theme::theme_id))
    }

    pub fn compile_options(&self, active_theme_id: u32) -> CompileOptions {
        CompileOptions {
            sketch: self.sketch,
            theme_id: active_theme_id,
            dark_theme_id: self.engine_dark_theme_id(),
            center: self.center,
            scale: self.scale,
            pad: self.pad,
            layout: self.layout_engine,
        }
    }

    pub fn render_options(&self, active_theme_id: u32) -> RenderOptions {
        RenderOptions {
            sketch: self.sketch,
            theme_id: active_theme_id,
            dark_theme_id: self.engine_dark_theme_id(),
            center: self.center,
            scale: self.scale,
            pad: self.pad,
            animate_interval: self.animate_interval,
            target: self.target.clone(),
            force_appendix: self.force_appendix,
            no_xml_tag: true,
        }
    }

    /// The engine input: plain source, or the file set with the source
    /// injected at `input_path` when a non-empty file set is configured.
    pub fn compile_input(&self) -> CompileInput {
        match &self.fs {
            Some(files) if !files.is_empty() => {
                let mut files = files.clone();
                files.insert(self.input_path.clone(), self.code.clone());
                CompileInput::Files {
                    files,
                    input_path: self.input_path.clone(),
                }
            }
            _ => CompileInput::Source(self.code.clone()),
        }
    }
}

/// Options for the engine's compile step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    pub sketch: bool,
    #[serde(rename = "themeID")]
    pub theme_id: u32,
    #[serde(rename = "darkThemeID", skip_serializing_if = "Option::is_none")]
    pub dark_theme_id: Option<u32>,
    pub center: bool,
    pub scale: f64,
    pub pad: f64,
    pub layout: LayoutEngine,
}

/// Options for the engine's render step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub sketch: bool,
    #[serde(rename = "themeID")]
    pub theme_id: u32,
    #[serde(rename = "darkThemeID", skip_serializing_if = "Option::is_none")]
    pub dark_theme_id: Option<u32>,
    pub center: bool,
    pub scale: f64,
    pub pad: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animate_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub force_appendix: bool,
    /// Always true: the markup is embedded inline.
    #[serde(rename = "noXMLTag")]
    pub no_xml_tag: bool,
}

/// Render settings a compiled diagram suggests (e.g. from `d2-config`).
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOverrides {
    pub sketch: Option<bool>,
    #[serde(rename = "themeID")]
    pub theme_id: Option<u32>,
    #[serde(rename = "darkThemeID")]
    pub dark_theme_id: Option<u32>,
    pub center: Option<bool>,
    pub scale: Option<f64>,
    pub pad: Option<f64>,
    pub animate_interval: Option<u32>,
    pub target: Option<String>,
    pub force_appendix: Option<bool>,
}

impl RenderOptions {
    /// Layer the engine's suggestions over these options, then put the
    /// local theme and sketch settings back on top.
    pub fn merged_with(&self, overrides: &RenderOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(center) = overrides.center {
            merged.center = center;
        }
        if let Some(scale) = overrides.scale {
            merged.scale = scale;
        }
        if let Some(pad) = overrides.pad {
            merged.pad = pad;
        }
        if overrides.animate_interval.is_some() {
            merged.animate_interval = overrides.animate_interval;
        }
        if overrides.target.is_some() {
            merged.target.clone_from(&overrides.target);
        }
        if let Some(force_appendix) = overrides.force_appendix {
            merged.force_appendix = force_appendix;
        }
        if let Some(sketch) = overrides.sketch {
            merged.sketch = sketch;
        }
        if let Some(theme_id) = overrides.theme_id {
            merged.theme_id = theme_id;
        }
        if overrides.dark_theme_id.is_some() {
            merged.dark_theme_id = overrides.dark_theme_id;
        }

        merged.theme_id = self.theme_id;
        merged.dark_theme_id = self.dark_theme_id;
        merged.sketch = self.sketch;
        merged.no_xml_tag = true;
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let props = DiagramProps::new("a -> b");
        let compile = props.compile_options(0);
        assert!(!compile.sketch);
        assert!(compile.center);
        assert_eq!(compile.scale, 1.0);
        assert_eq!(compile.pad, 100.0);
        assert_eq!(compile.layout, LayoutEngine::Dagre);

        let render = props.render_options(0);
        assert!(!render.force_appendix);
        assert!(render.no_xml_tag);
        assert_eq!(render.animate_interval, None);
        assert_eq!(render.target, None);
    }

    #[test]
    fn test_props_deserialize_with_defaults() {
        let props: DiagramProps =
            serde_json::from_str(r#"{"code": "a -> b", "themeId": 6, "layoutEngine": "elk", "width": 500}"#)
                .unwrap();
        assert_eq!(props.theme_id, Some(6));
        assert_eq!(props.layout_engine, LayoutEngine::Elk);
        assert_eq!(props.width, Some(Dimension::Px(500.0)));
        assert_eq!(props.max_height, Dimension::css("500px"));
        assert_eq!(props.input_path, "index.d2");
        assert!(props.auto_sync_dark_mode);
        assert!(props.center);
    }

    #[test]
    fn test_props_require_code() {
        let result = serde_json::from_str::<DiagramProps>(r#"{"sketch": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_compile_options_serialize_with_engine_names() {
        let props = DiagramProps::new("x").with_sketch(true).with_layout_engine(LayoutEngine::Elk);
        let json = serde_json::to_value(props.compile_options(6)).unwrap();
        assert_eq!(json["themeID"], 6);
        assert_eq!(json["sketch"], true);
        assert_eq!(json["layout"], "elk");
        assert!(json.get("darkThemeID").is_none());
    }

    #[test]
    fn test_render_options_always_omit_xml_tag() {
        let json = serde_json::to_value(DiagramProps::new("x").render_options(0)).unwrap();
        assert_eq!(json["noXMLTag"], true);
    }

    #[test]
    fn test_dark_theme_forwarded_only_without_auto_sync() {
        let synced = DiagramProps::new("x").with_dark_theme_id(201);
        assert_eq!(synced.compile_options(0).dark_theme_id, None);

        let manual = synced.with_auto_sync_dark_mode(false);
        assert_eq!(manual.compile_options(0).dark_theme_id, Some(201));

        let named = DiagramProps::new("x")
            .with_auto_sync_dark_mode(false)
            .with_dark_theme("dark-mauve");
        assert_eq!(named.render_options(0).dark_theme_id, Some(200));
    }

    #[test]
    fn test_merge_keeps_local_theme_and_sketch() {
        let base = DiagramProps::new("x").with_sketch(true).render_options(4);
        let overrides = RenderOverrides {
            sketch: Some(false),
            theme_id: Some(200),
            dark_theme_id: Some(201),
            pad: Some(0.0),
            target: Some("layers.detail".to_string()),
            ..RenderOverrides::default()
        };
        let merged = base.merged_with(&overrides);
        assert!(merged.sketch);
        assert_eq!(merged.theme_id, 4);
        assert_eq!(merged.dark_theme_id, None);
        assert_eq!(merged.pad, 0.0);
        assert_eq!(merged.target.as_deref(), Some("layers.detail"));
        assert!(merged.no_xml_tag);
    }

    #[test]
    fn test_overrides_deserialize_from_engine_json() {
        let overrides: RenderOverrides =
            serde_json::from_str(r#"{"themeID": 3, "pad": 0, "forceAppendix": true}"#).unwrap();
        assert_eq!(overrides.theme_id, Some(3));
        assert_eq!(overrides.pad, Some(0.0));
        assert_eq!(overrides.force_appendix, Some(true));
        assert_eq!(overrides.sketch, None);
    }

    #[test]
    fn test_fractional_pad_is_accepted() {
        let props: DiagramProps = serde_json::from_str(r#"{"code": "a", "pad": 12.5}"#).unwrap();
        assert_eq!(props.compile_options(0).pad, 12.5);

        let overrides: RenderOverrides = serde_json::from_str(r#"{"pad": -4.5}"#).unwrap();
        assert_eq!(overrides.pad, Some(-4.5));
    }

    #[test]
    fn test_plain_source_without_files() {
        let props = DiagramProps::new("a -> b").with_files(FileSet::new());
        assert_eq!(props.compile_input(), CompileInput::Source("a -> b".to_string()));
    }

    #[test]
    fn test_source_injected_into_file_set() {
        let mut files = FileSet::new();
        files.insert("shared.d2".to_string(), "db: { shape: cylinder }".to_string());
        files.insert("main.d2".to_string(), "stale".to_string());
        let props = DiagramProps::new("...@shared\napp -> db")
            .with_files(files)
            .with_input_path("main.d2");

        let CompileInput::Files { files, input_path } = props.compile_input() else {
            panic!("expected file set input");
        };
        assert_eq!(input_path, "main.d2");
        assert_eq!(files["main.d2"], "...@shared\napp -> db");
        assert_eq!(files["shared.d2"], "db: { shape: cylinder }");
    }

    #[test]
    fn test_blank_detection() {
        assert!(DiagramProps::new("").is_blank());
        assert!(DiagramProps::new("   \n\t  ").is_blank());
        assert!(!DiagramProps::new(" a ").is_blank());
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension::from(500u32).to_string(), "500px");
        assert_eq!(Dimension::Px(12.5).to_string(), "12.5px");
        assert_eq!(Dimension::from("40rem").to_string(), "40rem");
    }

    #[test]
    fn test_dimension_parse_arg_treats_numbers_as_pixels() {
        assert_eq!(Dimension::parse_arg("500"), Dimension::Px(500.0));
        assert_eq!(Dimension::parse_arg(" 80% "), Dimension::css("80%"));
    }
}
