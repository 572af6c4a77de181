//! Generator module - assembles static pages from the post listing

use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

use tera::Context;
use walkdir::WalkDir;

use crate::content::{featured_list, find_series, ListingItem, PostAggregator, PostRecord};
use crate::helpers::{date_rfc3339, full_url_for, iso_date, post_path, ShareLinks};
use crate::templates::{SiteData, TemplateRenderer};
use crate::Blog;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Static site generator using Tera templates
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site.
    ///
    /// A bad content item aborts the build.
    pub fn generate(&self, aggregator: &PostAggregator) -> Result<()> {
        fs::create_dir_all(&self.blog.public_dir)?;

        self.copy_static_assets()?;

        let items = aggregator.list_all()?;
        let posts = aggregator
            .list_ids()?
            .iter()
            .map(|id| aggregator.get_single(id))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!("Loaded {} posts in {} listing entries", posts.len(), items.len());

        let site = SiteData::from_config(&self.blog.config);

        self.generate_index(&items, &site)?;
        self.generate_post_pages(&posts, &items, &site)?;
        self.generate_not_found(&site)?;
        self.generate_sitemap(&posts)?;
        self.generate_atom_feed(&posts)?;

        Ok(())
    }

    fn base_context(&self, site: &SiteData) -> Context {
        let mut context = Context::new();
        context.insert("site", site);
        context
    }

    /// Homepage: featured posts, subscribe form, full listing
    fn generate_index(&self, items: &[ListingItem], site: &SiteData) -> Result<()> {
        let featured = featured_list(items);

        let mut context = self.base_context(site);
        context.insert("items", items);
        context.insert("featured", &featured);

        let html = self.renderer.render("index.html", &context)?;
        self.write_page(Path::new("index.html"), &html)
    }

    /// One page per post under `posts/<id>/`
    fn generate_post_pages(
        &self,
        posts: &[PostRecord],
        items: &[ListingItem],
        site: &SiteData,
    ) -> Result<()> {
        for post in posts {
            let path = post_path(&post.id);
            let url = full_url_for(&self.blog.config, &path);
            let series = post
                .series_name
                .as_deref()
                .and_then(|name| find_series(items, name));

            let mut context = self.base_context(site);
            context.insert("post", post);
            context.insert("series", &series);
            context.insert("tags", &post.tags());
            context.insert("share", &ShareLinks::new(&url, &post.title, &site.twitter_username));

            let html = self
                .renderer
                .render("post.html", &context)
                .with_context(|| format!("Failed to render post {}", post.id))?;

            let output = Path::new(path.trim_matches('/')).join("index.html");
            self.write_page(&output, &html)?;
        }

        Ok(())
    }

    fn generate_not_found(&self, site: &SiteData) -> Result<()> {
        let html = self.renderer.render("404.html", &self.base_context(site))?;
        self.write_page(Path::new("404.html"), &html)
    }

    /// Sitemap with the homepage and every post
    fn generate_sitemap(&self, posts: &[PostRecord]) -> Result<()> {
        let mut xml = String::with_capacity(4096);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NS));

        let latest = posts.iter().map(|p| p.date).max();
        push_url(
            &mut xml,
            &full_url_for(&self.blog.config, "/"),
            latest.map(|d| iso_date(&d)),
        );
        for post in posts {
            push_url(
                &mut xml,
                &full_url_for(&self.blog.config, &post_path(&post.id)),
                Some(iso_date(&post.date)),
            );
        }

        xml.push_str("</urlset>\n");

        self.write_page(Path::new("sitemap.xml"), &xml)?;
        tracing::info!("Generated sitemap.xml");
        Ok(())
    }

    /// Atom feed with the most recent posts, series members included
    fn generate_atom_feed(&self, posts: &[PostRecord]) -> Result<()> {
        let config = &self.blog.config;
        let mut recent: Vec<&PostRecord> = posts.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link href=\"{}/atom.xml\" rel=\"self\"/>\n",
            config.base_url()
        ));
        feed.push_str(&format!("  <link href=\"{}/\"/>\n", config.base_url()));
        if let Some(newest) = recent.first() {
            feed.push_str(&format!(
                "  <updated>{}</updated>\n",
                date_rfc3339(&newest.date)
            ));
        }
        feed.push_str(&format!("  <id>{}/</id>\n", config.base_url()));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for post in recent.iter().take(config.feed_limit) {
            let url = full_url_for(config, &post_path(&post.id));
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", url));
            feed.push_str(&format!("    <id>{}</id>\n", url));
            feed.push_str(&format!(
                "    <updated>{}</updated>\n",
                date_rfc3339(&post.date)
            ));
            if let Some(subtitle) = &post.subtitle {
                feed.push_str(&format!("    <summary>{}</summary>\n", escape_xml(subtitle)));
            }
            let content = post.content_html.as_deref().unwrap_or_default();
            let content = convert_relative_urls_to_absolute(content, config.base_url());
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                strip_invalid_xml_chars(&content).replace("]]>", "]]]]><![CDATA[>")
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        self.write_page(Path::new("atom.xml"), &feed)?;
        tracing::info!("Generated atom.xml");
        Ok(())
    }

    /// Copy the static directory (images, css) into the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
        }

        Ok(())
    }

    fn write_page(&self, relative: &Path, contents: &str) -> Result<()> {
        let output_path = self.blog.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, contents)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

fn push_url(xml: &mut String, loc: &str, lastmod: Option<String>) {
    xml.push_str("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(loc)));
    if let Some(lastmod) = lastmod {
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
    }
    xml.push_str("  </url>\n");
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Convert root-relative `href`/`src` attributes to absolute URLs
fn convert_relative_urls_to_absolute(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
}

/// Strip characters XML 1.0 does not allow (keeps tab, newline, carriage return)
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}
