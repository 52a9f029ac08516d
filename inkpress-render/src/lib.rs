//! # inkpress-render
//!
//! Template rendering library for inkpress.
//!
//! Templates are user files read at build time, so this crate renders
//! them with MiniJinja rather than compiling them in.

pub mod templates;

pub use templates::{RenderError, TemplateRenderer};
