//! Markdown to HTML rendering.

use crate::config::MarkdownOptions;
use crate::slug::slugify;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

/// Markdown processor with a fixed set of extensions
#[derive(Debug, Clone)]
pub struct MarkdownProcessor {
    options: Options,
    heading_ids: bool,
}

impl MarkdownProcessor {
    pub fn new(config: MarkdownOptions) -> Self {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, config.tables);
        options.set(Options::ENABLE_FOOTNOTES, config.footnotes);
        options.set(Options::ENABLE_STRIKETHROUGH, config.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, config.tasklists);
        options.set(Options::ENABLE_SMART_PUNCTUATION, config.smart_punctuation);
        // Explicit `{#id}` attributes always win over generated ids
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            options,
            heading_ids: config.heading_ids,
        }
    }

    /// Convert a markdown body into an HTML fragment
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);

        if self.heading_ids {
            let events: Vec<Event> = parser.collect();
            let ids = collect_heading_ids(&events);
            html::push_html(&mut html_output, attach_heading_ids(events, &ids).into_iter());
        } else {
            html::push_html(&mut html_output, parser);
        }

        html_output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new(MarkdownOptions::default())
    }
}

/// One generated id per heading, in document order. Repeats get a numeric suffix.
fn collect_heading_ids(events: &[Event]) -> Vec<String> {
    let mut ids = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => current = Some(String::new()),
            Event::Text(text) | Event::Code(text) => {
                if let Some(title) = current.as_mut() {
                    title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(title) = current.take() {
                    ids.push(unique_id(slugify(&title), &mut seen));
                }
            }
            _ => {}
        }
    }

    ids
}

fn unique_id(base: String, seen: &mut HashMap<String, usize>) -> String {
    if base.is_empty() {
        return base;
    }
    let count = seen.entry(base.clone()).or_insert(0);
    let id = if *count == 0 {
        base
    } else {
        format!("{}-{}", base, count)
    };
    *count += 1;
    id
}

fn attach_heading_ids<'a>(events: Vec<Event<'a>>, ids: &[String]) -> Vec<Event<'a>> {
    let mut ids = ids.iter();

    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let generated = ids.next().filter(|s| !s.is_empty());
                let id = id.or_else(|| generated.map(|s| CowStr::from(s.clone())));
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                })
            }
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_gets_id() {
        let processor = MarkdownProcessor::default();
        insta::assert_snapshot!(processor.render("# Hi").trim_end(), @r#"<h1 id="hi">Hi</h1>"#);
    }

    #[test]
    fn test_basic_markdown() {
        let processor = MarkdownProcessor::default();
        let html = processor.render("# Hello World\n\nThis is a **test**.");
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains("<strong>test</strong>"));
    }

    #[test]
    fn test_duplicate_headings_are_suffixed() {
        let processor = MarkdownProcessor::default();
        let html = processor.render("## Notes\n\n## Notes\n\n## Notes");
        assert!(html.contains(r#"<h2 id="notes">"#));
        assert!(html.contains(r#"<h2 id="notes-1">"#));
        assert!(html.contains(r#"<h2 id="notes-2">"#));
    }

    #[test]
    fn test_explicit_id_is_kept() {
        let processor = MarkdownProcessor::default();
        let html = processor.render("# Intro {#start}\n\n# Next");
        assert!(html.contains(r#"<h1 id="start">Intro</h1>"#));
        assert!(html.contains(r#"<h1 id="next">Next</h1>"#));
    }

    #[test]
    fn test_heading_ids_disabled() {
        let processor = MarkdownProcessor::new(MarkdownOptions {
            heading_ids: false,
            ..MarkdownOptions::default()
        });
        assert_eq!(processor.render("# Hi").trim_end(), "<h1>Hi</h1>");
    }

    #[test]
    fn test_tables() {
        let processor = MarkdownProcessor::default();
        let md = r#"
| Header 1 | Header 2 |
|----------|----------|
| Cell 1   | Cell 2   |
"#;
        let html = processor.render(md);
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Header 1</th>"));
    }

    #[test]
    fn test_tables_disabled() {
        let processor = MarkdownProcessor::new(MarkdownOptions {
            tables: false,
            ..MarkdownOptions::default()
        });
        let html = processor.render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_code_blocks() {
        let processor = MarkdownProcessor::default();
        let html = processor.render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<pre><code class="language-rust">"#));
        assert!(html.contains("fn main() {}"));
    }

    #[test]
    fn test_deterministic() {
        let processor = MarkdownProcessor::default();
        let md = "# A\n\n## B\n\n- [ ] task\n\n~~gone~~";
        assert_eq!(processor.render(md), processor.render(md));
    }
}
