//! Content model structs for parsed documents and post summaries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Front-matter fields of a document, keyed by field name
pub type Metadata = BTreeMap<String, String>;

/// A source document split into metadata and rendered HTML
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedDocument {
    /// Front-matter fields (e.g. heading, subheading, date)
    pub metadata: Metadata,

    /// Rendered HTML fragment for the body
    pub content: String,
}

impl ParsedDocument {
    /// Look up a metadata field by name
    pub fn field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Per-post record consumed by index generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Public link, e.g. "/posts/hello-world"
    pub href: String,
}

impl PostSummary {
    /// Build the summary for a document found at `rel_path` under the posts root.
    pub fn from_document(doc: &ParsedDocument, rel_path: &Path) -> Self {
        Self {
            heading: doc.field("heading").map(str::to_string),
            date: doc.field("date").map(str::to_string),
            href: post_href(rel_path),
        }
    }
}

/// Compute the public link for a post from its path relative to the posts root.
///
/// Posts live in their own folder, so the link is the folder path
/// (`hello/index.md` -> `/posts/hello`). A loose file at the posts root
/// links to its rendered page instead (`note.md` -> `/posts/note.html`).
pub fn post_href(rel_path: &Path) -> String {
    let parent: Vec<String> = rel_path
        .parent()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    if parent.is_empty() {
        let stem = rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("/posts/{}.html", stem)
    } else {
        format!("/posts/{}", parent.join("/"))
    }
}
