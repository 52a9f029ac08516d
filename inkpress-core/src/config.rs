//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "inkpress.yml";

/// Name of the posts subdirectory inside the output tree
pub const POSTS_OUTPUT_DIR: &str = "posts";

/// Index template, read from the static-assets directory
pub const INDEX_TEMPLATE_NAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the inkpress.yml schema.
///
/// Every field is optional; an absent file yields the default layout
/// (`template.html`, `public/`, `posts/` -> `build/`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub markdown: MarkdownOptions,

    #[serde(default)]
    pub dev: DevConfig,

    // Directory that relative paths resolve against
    #[serde(skip)]
    root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default = "default_posts")]
    pub posts: PathBuf,

    #[serde(rename = "static", default = "default_static")]
    pub static_assets: PathBuf,

    #[serde(default = "default_template")]
    pub template: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("build")
}

fn default_posts() -> PathBuf {
    PathBuf::from("posts")
}

fn default_static() -> PathBuf {
    PathBuf::from("public")
}

fn default_template() -> PathBuf {
    PathBuf::from("template.html")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            posts: default_posts(),
            static_assets: default_static(),
            template: default_template(),
        }
    }
}

/// Markdown renderer settings, fixed when the processor is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub smart_punctuation: bool,
    /// Give every heading a slug id so it can be linked to
    pub heading_ids: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
            smart_punctuation: false,
            heading_ids: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_reload_port")]
    pub reload_port: u16,
}

fn default_port() -> u16 {
    8080
}

fn default_reload_port() -> u16 {
    8081
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            reload_port: default_reload_port(),
        }
    }
}

/// The filesystem roots one build reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirectories {
    pub output: PathBuf,
    pub posts: PathBuf,
    pub static_assets: PathBuf,
    pub template: PathBuf,
}

impl BuildDirectories {
    /// Default layout rooted at `root`
    pub fn from_root(root: &Path) -> Self {
        Config::default().with_root(root).directories()
    }

    /// Where posts are copied to and rendered in
    pub fn posts_output(&self) -> PathBuf {
        self.output.join(POSTS_OUTPUT_DIR)
    }

    /// Source of the index page template
    pub fn index_template(&self) -> PathBuf {
        self.static_assets.join(INDEX_TEMPLATE_NAME)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;

        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config.with_root(root))
    }

    /// Load `path` if it exists, otherwise fall back to defaults rooted
    /// next to where the file would have been.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.is_file() {
            tracing::debug!("Loading config from {:?}", path);
            return Self::from_file(path);
        }

        tracing::debug!("No config at {:?}, using defaults", path);
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::default().with_root(root))
    }

    /// Re-root relative paths at `root`
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Resolve all build paths against the config root
    pub fn directories(&self) -> BuildDirectories {
        BuildDirectories {
            output: self.resolve_path(&self.paths.output),
            posts: self.resolve_path(&self.paths.posts),
            static_assets: self.resolve_path(&self.paths.static_assets),
            template: self.resolve_path(&self.paths.template),
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
