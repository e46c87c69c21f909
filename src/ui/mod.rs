//! HTML presentation of one diagram.
//!
//! This module contains everything that turns a [`crate::app::Model`] into
//! markup:
//! - [`style`]: Container sizing and the stylesheet the classes rely on
//! - [`render()`]: The accessible container and its state-dependent body
//! - [`Slots`]: Replaceable loading and error fragments

pub mod style;

mod render;

pub use render::{Slots, default_error, default_loading, page, render};
pub use style::{STYLESHEET, container_style};

pub const CONTAINER_CLASS: &str = "d2-diagram-container";
pub const DIAGRAM_CLASS: &str = "d2-diagram";
pub const FIT_CLASS: &str = "d2-fit";
