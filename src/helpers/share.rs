//! Social share links for a post page

use serde::Serialize;

use super::url::encode_component;

/// Outbound links that share or discuss a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareLinks {
    pub twitter: String,
    pub linkedin: String,
    pub facebook: String,
    /// Twitter search for the page URL
    pub discuss: String,
}

impl ShareLinks {
    /// Build share links for `url`; `via` is the author's Twitter handle, if any
    pub fn new(url: &str, title: &str, via: &str) -> Self {
        let url = encode_component(url);
        let mut twitter = format!(
            "https://twitter.com/intent/tweet?url={}&text={}",
            url,
            encode_component(title)
        );
        let via = via.trim_start_matches('@');
        if !via.is_empty() {
            twitter.push_str("&via=");
            twitter.push_str(&encode_component(via));
        }

        Self {
            twitter,
            linkedin: format!("https://www.linkedin.com/sharing/share-offsite/?url={}", url),
            facebook: format!("https://www.facebook.com/sharer/sharer.php?u={}", url),
            discuss: format!("https://mobile.twitter.com/search?q={}", url),
        }
    }
}
