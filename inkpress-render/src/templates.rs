//! Runtime HTML templates for post pages and the index page.

use inkpress_core::{ParsedDocument, PostSummary};
use minijinja::{
    context, escape_formatter, AutoEscape, Environment, Output, State, UndefinedBehavior, Value,
};
use std::collections::BTreeMap;
use std::fmt::Write;
use thiserror::Error;

// The `.html` suffix turns on HTML auto-escaping for interpolated values.
const PAGE_TEMPLATE: &str = "page.html";
const INDEX_TEMPLATE: &str = "index.html";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Compiled page and index templates.
///
/// Placeholders that resolve to nothing render as empty text, including
/// attribute lookups on missing values (`{{ post.missing.field }}`).
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new(
        page_template: impl Into<String>,
        index_template: impl Into<String>,
    ) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_keep_trailing_newline(true);
        env.set_formatter(html_formatter);
        env.add_template_owned(PAGE_TEMPLATE, page_template.into())?;
        env.add_template_owned(INDEX_TEMPLATE, index_template.into())?;
        Ok(Self { env })
    }

    /// Render a post page.
    ///
    /// The context is every metadata field plus `content` (inserted
    /// verbatim) and `refresh`; those two shadow metadata keys of the same
    /// name.
    pub fn render_page(&self, doc: &ParsedDocument, refresh: bool) -> Result<String, RenderError> {
        let mut ctx: BTreeMap<&str, Value> = doc
            .metadata
            .iter()
            .map(|(key, value)| (key.as_str(), Value::from(value.as_str())))
            .collect();
        ctx.insert("content", Value::from_safe_string(doc.content.clone()));
        ctx.insert("refresh", Value::from(refresh));

        let template = self.env.get_template(PAGE_TEMPLATE)?;
        Ok(template.render(&ctx)?)
    }

    /// Render the index page listing `posts` in the given order
    pub fn render_index(&self, posts: &[PostSummary]) -> Result<String, RenderError> {
        let template = self.env.get_template(INDEX_TEMPLATE)?;
        Ok(template.render(context! { posts => posts })?)
    }
}

/// Escape the HTML-significant characters only.
///
/// minijinja's built-in HTML escaping also rewrites `/`, which would turn
/// `/posts/hello` into `&#x2f;posts&#x2f;hello`.
fn html_formatter(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> Result<(), minijinja::Error> {
    if !matches!(state.auto_escape(), AutoEscape::Html)
        || value.is_safe()
        || value.is_undefined()
        || value.is_none()
    {
        return escape_formatter(out, state, value);
    }

    let text = value.to_string();
    let mut last = 0;
    for (idx, ch) in text.char_indices() {
        let entity = match ch {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&#x27;",
            _ => continue,
        };
        out.write_str(&text[last..idx])?;
        out.write_str(entity)?;
        last = idx + ch.len_utf8();
    }
    out.write_str(&text[last..])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<title>{{ heading }}</title>\
{% if refresh %}<script>reload</script>{% endif %}\
<main>{{ content }}</main><p>{{ subheading }}</p>";

    const INDEX: &str = "<ul>{% for post in posts %}\
<li><a href=\"{{ post.href }}\">{{ post.heading }}</a> {{ post.date }}</li>\
{% endfor %}</ul>";

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new(PAGE, INDEX).unwrap()
    }

    fn doc(fields: &[(&str, &str)], content: &str) -> ParsedDocument {
        ParsedDocument {
            metadata: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_page_substitutes_metadata_and_content() {
        let html = renderer()
            .render_page(&doc(&[("heading", "Hello")], "<h1 id=\"hi\">Hi</h1>"), false)
            .unwrap();
        assert_eq!(
            html,
            "<title>Hello</title><main><h1 id=\"hi\">Hi</h1></main><p></p>"
        );
    }

    #[test]
    fn test_refresh_flag() {
        let with = renderer().render_page(&doc(&[], ""), true).unwrap();
        let without = renderer().render_page(&doc(&[], ""), false).unwrap();
        assert!(with.contains("<script>reload</script>"));
        assert!(!without.contains("<script>"));
    }

    #[test]
    fn test_metadata_is_escaped() {
        let html = renderer()
            .render_page(&doc(&[("heading", "Fish & <Chips>")], ""), false)
            .unwrap();
        assert!(html.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
    }

    #[test]
    fn test_slashes_and_quotes_in_values() {
        let renderer =
            TemplateRenderer::new("<a title=\"{{ heading }}\">{{ date }}</a>", "").unwrap();
        let html = renderer
            .render_page(&doc(&[("heading", "say \"hi\""), ("date", "1/1/2023")], ""), false)
            .unwrap();
        assert_eq!(html, "<a title=\"say &quot;hi&quot;\">1/1/2023</a>");
    }

    #[test]
    fn test_content_key_cannot_be_overridden_by_metadata() {
        let html = renderer()
            .render_page(&doc(&[("content", "from metadata")], "<p>body</p>"), false)
            .unwrap();
        assert!(html.contains("<main><p>body</p></main>"));
    }

    #[test]
    fn test_unresolved_placeholders_render_empty() {
        let renderer = TemplateRenderer::new("[{{ nope }}][{{ nope.deeper }}]", "").unwrap();
        assert_eq!(renderer.render_page(&doc(&[], ""), false).unwrap(), "[][]");
    }

    #[test]
    fn test_index_lists_posts_in_order() {
        let posts = vec![
            PostSummary {
                heading: Some("First".into()),
                date: Some("1-1-2023".into()),
                href: "/posts/first".into(),
            },
            PostSummary {
                heading: None,
                date: None,
                href: "/posts/second".into(),
            },
        ];
        let html = renderer().render_index(&posts).unwrap();
        assert_eq!(
            html,
            "<ul><li><a href=\"/posts/first\">First</a> 1-1-2023</li>\
<li><a href=\"/posts/second\"></a> </li></ul>"
        );
    }

    #[test]
    fn test_index_with_no_posts() {
        assert_eq!(renderer().render_index(&[]).unwrap(), "<ul></ul>");
    }

    #[test]
    fn test_trailing_newline_is_kept() {
        let renderer = TemplateRenderer::new("{{ content }}\n", "").unwrap();
        let html = renderer.render_page(&doc(&[], "x"), false).unwrap();
        assert_eq!(html, "x\n");
    }

    #[test]
    fn test_syntax_error() {
        let result = TemplateRenderer::new("{% if %}", INDEX);
        assert!(matches!(result, Err(RenderError::Template(_))));
    }
}
