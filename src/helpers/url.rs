//! URL helper functions

use crate::config::SiteConfig;

/// Site-relative path of a post page
///
/// # Examples
/// ```ignore
/// post_path("hello-world") // -> "/posts/hello-world/"
/// ```
pub fn post_path(id: &str) -> String {
    format!("/posts/{}/", id)
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/posts/hello/") // -> "https://example.com/posts/hello/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{}/{}", config.base_url(), path)
}

/// Percent-encode a value for use in a query string
pub fn encode_component(value: &str) -> String {
    percent_encoding::utf8_percent_encode(value, percent_encoding::NON_ALPHANUMERIC).to_string()
}
