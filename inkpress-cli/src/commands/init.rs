//! Init command implementation.

use anyhow::{Context, Result};
use inkpress_core::config::CONFIG_FILE_NAME;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# inkpress configuration. Every key is optional.
paths:
  output: build
  posts: posts
  static: public
  template: template.html

markdown:
  tables: true
  footnotes: true
  strikethrough: true
  tasklists: true
  smart_punctuation: false
  heading_ids: true

dev:
  port: 8080
  reload_port: 8081
"#;

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ heading }}</title>
  <link rel="stylesheet" href="/style.css">
</head>
<body>
  <header>
    <a href="/">Home</a>
    <h1>{{ heading }}</h1>
    {% if subheading %}<p class="subheading">{{ subheading }}</p>{% endif %}
    <time>{{ date }}</time>
  </header>
  <article>
{{ content }}
  </article>
  {% if refresh %}
  <script>
    new WebSocket("ws://localhost:8081").onmessage = (event) => {
      if (event.data === "refresh") location.reload();
    };
  </script>
  {% endif %}
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Posts</title>
  <link rel="stylesheet" href="/style.css">
</head>
<body>
  <h1>Posts</h1>
  <ul>
  {% for post in posts %}
    <li><a href="{{ post.href }}">{{ post.heading }}</a> <time>{{ post.date }}</time></li>
  {% endfor %}
  </ul>
</body>
</html>
"#;

const STYLESHEET: &str = r#"body {
  max-width: 40rem;
  margin: 2rem auto;
  font-family: system-ui, sans-serif;
  line-height: 1.5;
}
"#;

const SAMPLE_POST: &str = r#"---
heading: Hello, world
subheading: The first post
date: 1-1-2023
---

# Welcome

This post lives in `posts/hello-world/index.md`. Build the site with:

```bash
inkpress build
```
"#;

/// Initialize a new inkpress project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    let files = [
        (CONFIG_FILE_NAME, DEFAULT_CONFIG),
        ("template.html", PAGE_TEMPLATE),
        ("public/index.html", INDEX_TEMPLATE),
        ("public/style.css", STYLESHEET),
        ("posts/hello-world/index.md", SAMPLE_POST),
    ];
    for (rel, contents) in files {
        write_if_missing(root, rel, contents)?;
    }

    println!("✓ inkpress initialized in {:?}", root);
    println!("  - Write posts as posts/<name>/index.md");
    println!("  - Run `inkpress build`, then `inkpress dev` while editing");
    Ok(())
}

fn write_if_missing(root: &Path, rel: &str, contents: &str) -> Result<()> {
    let path = root.join(rel);
    if path.exists() {
        println!("{:?} already exists, leaving it alone", path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(&path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    println!("Created {:?}", path);
    Ok(())
}
