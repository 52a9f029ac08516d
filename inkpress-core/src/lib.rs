//! # inkpress-core
//!
//! Core library for the inkpress static site generator.
//!
//! This crate splits source documents into front-matter metadata and a
//! rendered markdown body, and holds the configuration and content model
//! shared by the renderer and the CLI.

pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod parser;
pub mod slug;

pub use config::{BuildDirectories, Config, MarkdownOptions};
pub use markdown::MarkdownProcessor;
pub use models::{Metadata, ParsedDocument, PostSummary};
pub use parser::{ContentError, ContentParser};
pub use slug::slugify;
