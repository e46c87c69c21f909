//! The seam to the external D2 engine.
//!
//! Compilation, layout and SVG generation all happen behind
//! [`DiagramEngine`]. The crate only decides when to call it, with what
//! options, and what to do with the result.

pub mod cli;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;
use thiserror::Error;

use crate::options::{CompileOptions, FileSet, RenderOptions, RenderOverrides};

pub use cli::D2CliEngine;

/// Shown when a failure carries no message of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown compilation error";

/// What the engine compiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileInput {
    /// Plain D2 source.
    Source(String),
    /// A virtual file set plus the path of the entry file.
    Files { files: FileSet, input_path: String },
}

/// A compiled diagram and the render settings it suggests.
#[derive(Debug, Clone)]
pub struct Compiled<D> {
    pub diagram: D,
    pub render_options: RenderOverrides,
}

impl<D> Compiled<D> {
    pub fn new(diagram: D) -> Self {
        Self {
            diagram,
            render_options: RenderOverrides::default(),
        }
    }

    pub fn with_render_options(mut self, render_options: RenderOverrides) -> Self {
        self.render_options = render_options;
        self
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Compile(String),
    #[error("{0}")]
    Render(String),
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// The text shown to users. Never empty.
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// An external diagram engine.
///
/// Implementations run on a single-threaded executor, so their futures
/// need not be `Send`.
#[async_trait(?Send)]
pub trait DiagramEngine {
    /// Opaque compiled diagram.
    type Diagram: 'static;

    async fn compile(
        &self,
        input: CompileInput,
        options: &CompileOptions,
    ) -> Result<Compiled<Self::Diagram>, EngineError>;

    async fn render(
        &self,
        diagram: &Self::Diagram,
        options: &RenderOptions,
    ) -> Result<String, EngineError>;
}
