// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. engine::EngineError)
    clippy::module_name_repetitions
)]

//! # d2-slides
//!
//! Embed [D2](https://d2lang.com) diagrams in slide decks and other HTML
//! hosts.
//!
//! d2-slides takes diagram source plus styling options as reactive inputs,
//! hands compilation and rendering to an external D2 engine, and wraps the
//! returned SVG in a themed, sized, accessible container:
//! - Light/dark theme selection that follows the host's dark mode
//! - At most one compile per batch of input changes
//! - Stale engine responses never overwrite newer ones
//! - Fit-to-container mode that strips fixed SVG dimensions
//!
//! ## Architecture
//!
//! d2-slides uses The Elm Architecture (TEA) pattern:
//! - **Model**: Per-diagram state
//! - **Message**: Input changes, host signals and engine results
//! - **Update**: Pure state transitions
//! - **View**: Render to HTML
//!
//! ## Modules
//!
//! - [`app`]: Model, update and the runtime event loop
//! - [`compiler`]: Compile/render orchestration around an engine
//! - [`engine`]: The engine seam and the `d2` command-line engine
//! - [`options`]: Consumer props and engine option builders
//! - [`theme`]: Theme catalog and dark-mode context
//! - [`svg`]: Output post-processing
//! - [`ui`]: HTML container rendering
//! - [`config`]: Saved command-line defaults
//! - [`watcher`]: File watching

pub mod app;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod options;
pub mod svg;
pub mod theme;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{DiagramEvent, DiagramRuntime, Message, Model};
    pub use crate::compiler::{CompileState, SettlePolicy};
    pub use crate::engine::{D2CliEngine, DiagramEngine, EngineError};
    pub use crate::options::{DiagramProps, Dimension, LayoutEngine};
    pub use crate::theme::DarkModeContext;
    pub use crate::ui::Slots;
}
