//! Post, series and listing models

use chrono::NaiveDate;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

use super::FrontMatter;
use crate::error::BlogError;

/// Front-matter keys mapped onto typed `PostRecord` fields
const KNOWN_KEYS: &[&str] = &[
    "date",
    "title",
    "subtitle",
    "seriesName",
    "seriesSubtitle",
    "sequence",
    "featured",
    "image",
    "imageAltText",
    "imageWidth",
    "imageHeight",
    "photographer",
    "photographerLink",
];

/// A heading found in the raw markdown body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub text: String,
    /// Matches the `id` of the rendered heading
    pub anchor: String,
    pub level: u8,
}

/// One parsed content item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    /// File stem of the content file, also the URL segment
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub subtitle: Option<String>,
    pub series_name: Option<String>,
    pub series_subtitle: Option<String>,
    pub sequence: Option<i64>,
    /// Lower ranks are shown first
    pub featured: Option<f64>,

    // Presentation metadata
    pub image: Option<String>,
    pub image_alt_text: Option<String>,
    pub image_width: Option<String>,
    pub image_height: Option<String>,
    pub photographer: Option<String>,
    pub photographer_link: Option<String>,

    /// Front-matter keys without a typed field (e.g. `tags`)
    pub extra: BTreeMap<String, Value>,

    /// Rendered body, only set on a single-post fetch
    pub content_html: Option<String>,
    /// Table of contents, only set on a single-post fetch
    pub headings: Vec<Heading>,
}

impl PostRecord {
    /// Build a typed record from raw front matter.
    ///
    /// `date` and `title` are required, as is `sequence` once `seriesName` is set.
    pub fn from_front_matter(id: &str, fm: &FrontMatter) -> Result<Self, BlogError> {
        let date = match fm.get("date") {
            Some(value) => parse_date(value)
                .ok_or_else(|| BlogError::malformed(id, "`date` is not an ISO date"))?,
            None => return Err(BlogError::malformed(id, "missing required field `date`")),
        };

        let title = scalar_string(id, fm, "title")?
            .ok_or_else(|| BlogError::malformed(id, "missing required field `title`"))?;

        let series_name = scalar_string(id, fm, "seriesName")?;

        let sequence = match fm.get("sequence") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_i64()
                    .ok_or_else(|| BlogError::malformed(id, "`sequence` must be an integer"))?,
            ),
        };
        if series_name.is_some() && sequence.is_none() {
            return Err(BlogError::malformed(
                id,
                "`sequence` is required when `seriesName` is set",
            ));
        }

        let featured = match fm.get("featured") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_f64()
                    .ok_or_else(|| BlogError::malformed(id, "`featured` must be a number"))?,
            ),
        };

        let extra = fm
            .iter()
            .filter(|(key, _)| !KNOWN_KEYS.contains(key))
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();

        Ok(Self {
            id: id.to_string(),
            date,
            title,
            subtitle: scalar_string(id, fm, "subtitle")?,
            series_name,
            series_subtitle: scalar_string(id, fm, "seriesSubtitle")?,
            sequence,
            featured,
            image: scalar_string(id, fm, "image")?,
            image_alt_text: scalar_string(id, fm, "imageAltText")?,
            image_width: scalar_string(id, fm, "imageWidth")?,
            image_height: scalar_string(id, fm, "imageHeight")?,
            photographer: scalar_string(id, fm, "photographer")?,
            photographer_link: scalar_string(id, fm, "photographerLink")?,
            extra,
            content_html: None,
            headings: Vec::new(),
        })
    }

    /// Tags listed in the `tags` front-matter key, if any
    pub fn tags(&self) -> Vec<String> {
        match self.extra.get("tags") {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            Some(Value::String(tag)) => vec![tag.clone()],
            _ => Vec::new(),
        }
    }
}

/// A named series of posts, derived at listing time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesGroup {
    pub series_name: String,
    pub series_subtitle: Option<String>,
    /// Most recent member date
    pub date: NaiveDate,
    /// Members ordered by ascending `sequence`
    pub posts: Vec<PostRecord>,
}

/// One entry of the homepage listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingItem {
    Post(PostRecord),
    Series(SeriesGroup),
}

impl ListingItem {
    pub fn date(&self) -> NaiveDate {
        match self {
            ListingItem::Post(post) => post.date,
            ListingItem::Series(series) => series.date,
        }
    }

    pub fn series_name(&self) -> Option<&str> {
        match self {
            ListingItem::Post(_) => None,
            ListingItem::Series(series) => Some(&series.series_name),
        }
    }

    /// Posts contained in this item, in display order
    pub fn posts(&self) -> &[PostRecord] {
        match self {
            ListingItem::Post(post) => std::slice::from_ref(post),
            ListingItem::Series(series) => &series.posts,
        }
    }
}

/// Parse an ISO calendar date, accepting a trailing time component
fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    let formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
    formats
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// Read an optional display string; numbers and booleans are stringified
fn scalar_string(id: &str, fm: &FrontMatter, key: &str) -> Result<Option<String>, BlogError> {
    match fm.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(BlogError::malformed(id, format!("`{}` must be a string", key))),
    }
}
