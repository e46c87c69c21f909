//! SVG post-processing for embedded diagrams.
//!
//! D2 emits a nested document: an outer `<svg>` with a `viewBox` wrapping an
//! inner `<svg>` that carries explicit pixel dimensions. In fit mode both
//! levels must lose their fixed size so container CSS decides how large the
//! diagram is drawn.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

// Quoted values may contain `>`, so the tag ends at the first unquoted one.
static SVG_START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<svg\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid svg tag regex")
});

// Every quoted attribute, so text inside another attribute's value is never
// mistaken for a dimension.
static QUOTED_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s([^\s="'/>]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

static ABSOLUTE_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\+?(?:\d+\.?\d*|\.\d+)(?:e[+-]?\d+)?(?:px|pt|pc|mm|cm|in)?$")
        .expect("valid length regex")
});

/// Remove absolute `width`/`height` attributes from every `<svg>` start tag.
///
/// Relative values such as `100%` are kept, as are `viewBox` and all other
/// attributes. Child elements (`<rect width=...>`) are never touched.
pub fn strip_fixed_dimensions(markup: &str) -> String {
    SVG_START_TAG
        .replace_all(markup, |tag: &Captures<'_>| strip_tag_dimensions(&tag[0]).into_owned())
        .into_owned()
}

fn strip_tag_dimensions(tag: &str) -> Cow<'_, str> {
    QUOTED_ATTR.replace_all(tag, |attr: &Captures<'_>| {
        let name = &attr[1];
        let value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .map_or("", |m| m.as_str())
            .trim();
        let is_dimension = name.eq_ignore_ascii_case("width") || name.eq_ignore_ascii_case("height");
        if is_dimension && ABSOLUTE_LENGTH.is_match(value) {
            String::new()
        } else {
            attr[0].to_string()
        }
    })
}

/// The markup to embed: dimension-stripped in fit mode, untouched otherwise.
pub fn prepare_markup(markup: &str, fit: bool) -> Cow<'_, str> {
    if fit {
        Cow::Owned(strip_fixed_dimensions(markup))
    } else {
        Cow::Borrowed(markup)
    }
}
