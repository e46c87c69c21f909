use std::fmt;

use htmlize::{escape_attribute, escape_text};

use crate::app::Model;
use crate::compiler::CompileState;
use crate::svg::prepare_markup;
use crate::ui::{CONTAINER_CLASS, DIAGRAM_CLASS, FIT_CLASS, STYLESHEET, container_style};

type LoadingSlot = Box<dyn Fn() -> String>;
type ErrorSlot = Box<dyn Fn(&str) -> String>;

/// Fragments shown in place of the diagram while loading or after a
/// failure. Either can be replaced independently.
pub struct Slots {
    loading: LoadingSlot,
    error: ErrorSlot,
}

impl Default for Slots {
    fn default() -> Self {
        Self {
            loading: Box::new(default_loading),
            error: Box::new(default_error),
        }
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slots").finish_non_exhaustive()
    }
}

impl Slots {
    pub fn with_loading(mut self, slot: impl Fn() -> String + 'static) -> Self {
        self.loading = Box::new(slot);
        self
    }

    /// The slot receives the raw message and is responsible for escaping.
    pub fn with_error(mut self, slot: impl Fn(&str) -> String + 'static) -> Self {
        self.error = Box::new(slot);
        self
    }

    pub fn loading(&self) -> String {
        (self.loading)()
    }

    pub fn error(&self, message: &str) -> String {
        (self.error)(message)
    }
}

pub fn default_loading() -> String {
    r#"<div class="d2-loading">Loading diagram...</div>"#.to_string()
}

pub fn default_error(message: &str) -> String {
    format!(r#"<div class="d2-error">{}</div>"#, escape_text(message))
}

/// Render the container for the model's current state.
///
/// `aria-busy` is true exactly while a compile is in flight. An idle model
/// renders an empty container.
pub fn render(model: &Model, slots: &Slots) -> String {
    let props = &model.props;
    let body = match &model.state {
        CompileState::Idle => String::new(),
        CompileState::Loading => slots.loading(),
        CompileState::Failed { message } => slots.error(message),
        CompileState::Ready { svg } => {
            let class = if props.fit {
                format!("{DIAGRAM_CLASS} {FIT_CLASS}")
            } else {
                DIAGRAM_CLASS.to_string()
            };
            format!(
                r#"<div class="{class}">{}</div>"#,
                prepare_markup(svg, props.fit)
            )
        }
    };

    format!(
        r#"<div class="{CONTAINER_CLASS}" role="img" aria-label="{}" aria-busy="{}" style="{}">{body}</div>"#,
        escape_attribute(props.aria_label.as_str()),
        model.is_loading(),
        escape_attribute(container_style(props)),
    )
}

/// Wrap a rendered fragment in a standalone HTML document.
pub fn page(title: &str, fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{STYLESHEET}</style>\n</head>\n<body>\n{fragment}\n</body>\n</html>\n",
        escape_text(title)
    )
}
