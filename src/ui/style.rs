//! Container sizing.
//!
//! Width and height are only emitted when set; the max bounds always are,
//! since they carry defaults.

use crate::options::DiagramProps;

/// Rules the container and fit classes need when the fragment is embedded
/// in a page that does not already provide them.
pub const STYLESHEET: &str = "\
.d2-diagram-container { display: flex; align-items: center; justify-content: center; overflow: auto; }
.d2-diagram { max-width: 100%; max-height: 100%; }
.d2-fit { width: 100%; height: 100%; }
.d2-fit svg { width: 100%; height: 100%; }
.d2-error { color: #c62828; font-family: monospace; white-space: pre-wrap; }
.d2-loading { opacity: 0.6; }
";

/// Inline style for the container, e.g.
/// `width: 500px; height: 400px; max-width: 800px; max-height: 600px`.
pub fn container_style(props: &DiagramProps) -> String {
    let mut rules = Vec::with_capacity(4);
    if let Some(width) = &props.width {
        rules.push(format!("width: {width}"));
    }
    if let Some(height) = &props.height {
        rules.push(format!("height: {height}"));
    }
    rules.push(format!("max-width: {}", props.max_width));
    rules.push(format!("max-height: {}", props.max_height));
    rules.join("; ")
}
