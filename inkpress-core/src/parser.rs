//! Source document parsing: front matter plus rendered markdown body.

use crate::config::MarkdownOptions;
use crate::frontmatter::{parse_frontmatter, FrontmatterError};
use crate::markdown::MarkdownProcessor;
use crate::models::ParsedDocument;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Malformed metadata: {0}")]
    MalformedMetadata(#[from] FrontmatterError),
}

/// Turns raw source text into a [`ParsedDocument`].
///
/// Holds no mutable state, so one instance can be shared across every
/// document in a build.
#[derive(Debug, Clone, Default)]
pub struct ContentParser {
    markdown: MarkdownProcessor,
}

impl ContentParser {
    pub fn new(options: MarkdownOptions) -> Self {
        Self {
            markdown: MarkdownProcessor::new(options),
        }
    }

    pub fn parse(&self, text: &str) -> Result<ParsedDocument, ContentError> {
        let (metadata, body) = parse_frontmatter(text)?;
        let content = self.markdown.render(&body);
        Ok(ParsedDocument { metadata, content })
    }
}
