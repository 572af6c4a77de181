//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Content HTML is inserted pre-rendered, and the content source is trusted
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("404.html", include_str!("site/404.html")),
            // Partials
            (
                "partials/post_card.html",
                include_str!("site/partials/post_card.html"),
            ),
            (
                "partials/subscribe.html",
                include_str!("site/partials/subscribe.html"),
            ),
        ])?;

        tera.register_filter("long_date", long_date_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: `2023-05-30` -> `May 30, 2023`
fn long_date_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("long_date", "value", String, value);
    match chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        Ok(date) => Ok(tera::Value::String(crate::helpers::long_date(&date))),
        // Not a plain date; leave it alone
        Err(_) => Ok(tera::Value::String(s)),
    }
}

/// Site-wide values available to every template as `site`
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,
    pub twitter_username: String,
    pub analytics_script: Option<String>,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            url: config.base_url().to_string(),
            twitter_username: config.twitter_username.trim_start_matches('@').to_string(),
            analytics_script: config.analytics.script_url.clone(),
        }
    }
}
