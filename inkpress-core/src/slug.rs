//! Anchor slugs for rendered headings.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

/// Turn heading text into a URL fragment id
///
/// Lowercases, maps whitespace and underscores to hyphens, drops
/// punctuation (unicode letters survive) and collapses hyphen runs.
///
/// ```
/// use inkpress_core::slugify;
///
/// assert_eq!(slugify("Hi"), "hi");
/// assert_eq!(slugify("Getting Started: Part 2"), "getting-started-part-2");
/// ```
pub fn slugify(input: &str) -> String {
    let kept: String = input
        .to_lowercase()
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if c.is_whitespace() || c == '_' {
                Some("-")
            } else if c.is_alphanumeric() || c == '-' {
                Some(g)
            } else {
                None
            }
        })
        .collect();

    let re = HYPHEN_RUNS.get_or_init(|| Regex::new(r"-{2,}").unwrap());
    re.replace_all(&kept, "-").trim_matches('-').to_string()
}
