//! Build command implementation.

use anyhow::{Context, Result};
use inkpress_core::config::INDEX_TEMPLATE_NAME;
use inkpress_core::{BuildDirectories, ContentError, ContentParser, MarkdownOptions, PostSummary};
use inkpress_render::{RenderError, TemplateRenderer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::task::{JoinError, JoinSet};
use walkdir::WalkDir;

/// Extension of source documents inside the posts tree
pub const SOURCE_EXTENSION: &str = "md";

/// Extension rendered pages are written with
pub const OUTPUT_EXTENSION: &str = "html";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("I/O error at {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}", .path.display())]
    Content { path: PathBuf, source: ContentError },

    #[error("Invalid template")]
    Template(#[from] RenderError),

    #[error("Failed to render {}", .path.display())]
    Render { path: PathBuf, source: RenderError },

    #[error("Build task failed")]
    Task(#[from] JoinError),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
    move |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn walk_err(root: &Path, err: walkdir::Error) -> BuildError {
    let path = err.path().unwrap_or(root).to_path_buf();
    BuildError::Io {
        path,
        source: std::io::Error::from(err),
    }
}

/// Knobs for a single build
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Wipe the output directory before writing
    pub clean: bool,
    /// Passed to the page template as `refresh`
    pub refresh: bool,
    pub markdown: MarkdownOptions,
}

/// What a finished build produced
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    /// One entry per rendered post, in discovery order
    pub posts: Vec<PostSummary>,
}

/// Build the site described by the selected config (CLI entry point)
pub async fn build_site(config_path: Option<&Path>, clean: bool, refresh: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let dirs = config.directories();
    let options = BuildOptions {
        clean,
        refresh,
        markdown: config.markdown,
    };

    tracing::info!("Building site into {:?}", dirs.output);

    let report = build(&dirs, &options)
        .await
        .context("Failed to build site")?;

    tracing::info!("✓ Built {} posts", report.posts.len());
    tracing::info!("✓ Output written to {:?}", report.output_dir);

    Ok(())
}

/// Run the full pipeline: clean, copy assets and posts, render every post,
/// then write the index.
///
/// The first failure aborts the build. Files written before the failure
/// stay where they are.
pub async fn build(
    dirs: &BuildDirectories,
    options: &BuildOptions,
) -> Result<BuildReport, BuildError> {
    let page_template = read_text(&dirs.template).await?;
    let index_template = read_text(&dirs.index_template()).await?;
    let renderer = Arc::new(TemplateRenderer::new(page_template, index_template)?);

    prepare_output(&dirs.output, options.clean).await?;

    let assets = copy_tree(&dirs.static_assets, &dirs.output).await?;
    tracing::debug!("Copied {} static files", assets);

    let posts_root = dirs.posts_output();
    copy_tree(&dirs.posts, &posts_root).await?;

    let sources = discover_sources(&posts_root).await?;
    tracing::info!("Found {} markdown files", sources.len());

    let parser = Arc::new(ContentParser::new(options.markdown));
    let posts = transform_all(
        sources,
        &posts_root,
        parser,
        Arc::clone(&renderer),
        options.refresh,
    )
    .await?;

    write_index(&renderer, &posts, dirs).await?;

    Ok(BuildReport {
        output_dir: dirs.output.clone(),
        posts,
    })
}

async fn read_text(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).await.map_err(io_err(path))
}

async fn prepare_output(output: &Path, clean: bool) -> Result<(), BuildError> {
    if clean {
        match fs::remove_dir_all(output).await {
            Ok(()) => tracing::debug!("Removed {:?}", output),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(io_err(output)(err)),
        }
    }
    fs::create_dir_all(output).await.map_err(io_err(output))
}

/// Recursively copy `src` into `dst`, returning the number of files copied
async fn copy_tree(src: &Path, dst: &Path) -> Result<usize, BuildError> {
    let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
    tokio::task::spawn_blocking(move || copy_tree_blocking(&src, &dst)).await?
}

fn copy_tree_blocking(src: &Path, dst: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_err(src, e))?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(io_err(&target))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(io_err(&target))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// List source documents under `root` in a stable (file-name sorted) order
async fn discover_sources(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut files = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| walk_err(&root, e))?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    })
    .await?
}

/// Transform every source concurrently and return summaries in input order
async fn transform_all(
    sources: Vec<PathBuf>,
    posts_root: &Path,
    parser: Arc<ContentParser>,
    renderer: Arc<TemplateRenderer>,
    refresh: bool,
) -> Result<Vec<PostSummary>, BuildError> {
    let mut slots: Vec<Option<PostSummary>> = vec![None; sources.len()];
    let mut tasks = JoinSet::new();

    for (index, source) in sources.into_iter().enumerate() {
        let parser = Arc::clone(&parser);
        let renderer = Arc::clone(&renderer);
        let posts_root = posts_root.to_path_buf();
        tasks.spawn(async move {
            transform_post(&source, &posts_root, &parser, &renderer, refresh)
                .await
                .map(|summary| (index, summary))
        });
    }

    // Returning early drops the set, which aborts whatever is still running.
    while let Some(joined) = tasks.join_next().await {
        let (index, summary) = joined??;
        slots[index] = Some(summary);
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Render one copied source file in place: `<name>.md` becomes `<name>.html`.
async fn transform_post(
    source: &Path,
    posts_root: &Path,
    parser: &ContentParser,
    renderer: &TemplateRenderer,
    refresh: bool,
) -> Result<PostSummary, BuildError> {
    let text = read_text(source).await?;

    let doc = parser.parse(&text).map_err(|err| BuildError::Content {
        path: source.to_path_buf(),
        source: err,
    })?;

    let html = renderer
        .render_page(&doc, refresh)
        .map_err(|err| BuildError::Render {
            path: source.to_path_buf(),
            source: err,
        })?;

    let target = source.with_extension(OUTPUT_EXTENSION);
    fs::write(&target, html).await.map_err(io_err(&target))?;
    fs::remove_file(source).await.map_err(io_err(source))?;

    tracing::debug!("Rendered: {:?}", target);

    let rel = source.strip_prefix(posts_root).unwrap_or(source);
    Ok(PostSummary::from_document(&doc, rel))
}

/// Write the index page to the output root and to the posts directory
async fn write_index(
    renderer: &TemplateRenderer,
    posts: &[PostSummary],
    dirs: &BuildDirectories,
) -> Result<(), BuildError> {
    let html = renderer
        .render_index(posts)
        .map_err(|err| BuildError::Render {
            path: dirs.index_template(),
            source: err,
        })?;

    for target in [
        dirs.output.join(INDEX_TEMPLATE_NAME),
        dirs.posts_output().join(INDEX_TEMPLATE_NAME),
    ] {
        fs::write(&target, &html).await.map_err(io_err(&target))?;
    }

    Ok(())
}
