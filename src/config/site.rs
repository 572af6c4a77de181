//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,
    pub twitter_username: String,

    // Directory
    pub posts_dir: String,
    pub public_dir: String,
    pub static_dir: String,
    pub content_extension: String,

    // Feed
    pub feed_limit: usize,

    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub subscribe: SubscribeConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: String::new(),
            author: "John Doe".to_string(),
            url: "http://example.com".to_string(),
            twitter_username: String::new(),

            posts_dir: "posts".to_string(),
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),
            content_extension: "md".to_string(),

            feed_limit: 20,

            highlight: HighlightConfig::default(),
            subscribe: SubscribeConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Site URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Newsletter proxy configuration.
///
/// Credentials never live in the config file; only the names of the
/// environment variables holding them do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeConfig {
    pub audience_id_env: String,
    pub api_key_env: String,
    /// Overrides `https://<dc>.api.mailchimp.com`
    pub api_base: Option<String>,
    pub upstream_error_message: String,
}

impl Default for SubscribeConfig {
    fn default() -> Self {
        Self {
            audience_id_env: "MAILCHIMP_AUDIENCE_ID".to_string(),
            api_key_env: "MAILCHIMP_API_KEY".to_string(),
            api_base: None,
            upstream_error_message: "There was an error subscribing to the newsletter. \
                DM me on Twitter and I'll add you to the list."
                .to_string(),
        }
    }
}

/// Analytics integration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Script injected into every page head, e.g. `https://cdn.splitbee.io/sb.js`
    pub script_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.posts_dir, "posts");
        assert_eq!(config.content_extension, "md");
        assert_eq!(config.feed_limit, 20);
        assert_eq!(config.subscribe.api_key_env, "MAILCHIMP_API_KEY");
        assert!(config.analytics.script_url.is_none());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Derek's Blog
url: https://example.com/
posts_dir: content
subscribe:
  api_base: http://127.0.0.1:9000
  upstream_error_message: Ping me instead.
highlight:
  theme: InspiredGitHub
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Derek's Blog");
        assert_eq!(config.posts_dir, "content");
        assert_eq!(config.base_url(), "https://example.com");
        assert_eq!(
            config.subscribe.api_base.as_deref(),
            Some("http://127.0.0.1:9000")
        );
        assert_eq!(config.subscribe.upstream_error_message, "Ping me instead.");
        // Untouched nested fields keep their defaults
        assert_eq!(config.subscribe.audience_id_env, "MAILCHIMP_AUDIENCE_ID");
        assert_eq!(config.highlight.theme, "InspiredGitHub");
        assert!(!config.highlight.line_number);
    }
}
