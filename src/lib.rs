//! postfolio: a markdown blog and portfolio site generator
//!
//! Posts live as markdown files with YAML front matter. Posts sharing a
//! `seriesName` are grouped into series on the homepage, `featured` posts get
//! their own section, and a small server proxies newsletter sign-ups to the
//! mailing list API.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod subscribe;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::content::{ContentStore, MarkdownRenderer, PostAggregator};

/// The main blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown posts directory
    pub posts_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied verbatim into the output
    pub static_dir: PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let posts_dir = base_dir.join(&config.posts_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Ok(Self {
            config,
            base_dir,
            posts_dir,
            public_dir,
            static_dir,
        })
    }

    /// Content store over the posts directory
    pub fn store(&self) -> ContentStore {
        ContentStore::new(&self.posts_dir, &self.config.content_extension)
    }

    /// Fresh aggregator; nothing is shared between calls
    pub fn aggregator(&self) -> PostAggregator {
        let renderer = MarkdownRenderer::with_options(
            &self.config.highlight.theme,
            self.config.highlight.line_number,
        );
        PostAggregator::new(self.store(), renderer)
    }

    /// Generate the static site
    pub fn build(&self) -> Result<()> {
        commands::build::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, series: Option<(&str, i64)>) -> Result<PathBuf> {
        commands::new::create_post(self, title, series)
    }
}
