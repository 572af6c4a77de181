//! Post aggregator - builds the homepage listing, single posts and series views

use indexmap::IndexMap;

use super::frontmatter::FrontMatterError;
use super::markdown::extract_headings;
use super::{ContentStore, FrontMatter, ListingItem, MarkdownRenderer, PostRecord, SeriesGroup};
use crate::error::BlogError;

/// Read-side queries over the content store.
///
/// Nothing is cached: every call re-reads and re-parses the store.
pub struct PostAggregator {
    store: ContentStore,
    renderer: MarkdownRenderer,
}

impl PostAggregator {
    pub fn new(store: ContentStore, renderer: MarkdownRenderer) -> Self {
        Self { store, renderer }
    }

    /// All content ids, used to enumerate post pages
    pub fn list_ids(&self) -> Result<Vec<String>, BlogError> {
        self.store.list_ids()
    }

    /// Load every post's metadata (bodies are not rendered) and group it into
    /// a listing, newest first
    pub fn list_all(&self) -> Result<Vec<ListingItem>, BlogError> {
        let records = self
            .store
            .list_ids()?
            .iter()
            .map(|id| self.load_record(id).map(|(record, _)| record))
            .collect::<Result<Vec<_>, _>>()?;

        group_listing(records)
    }

    /// Load one post with its rendered HTML and table of contents
    pub fn get_single(&self, id: &str) -> Result<PostRecord, BlogError> {
        let (mut record, body) = self.load_record(id)?;

        let html = self.renderer.render(&body).map_err(|e| BlogError::Render {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        record.content_html = Some(html);
        record.headings = extract_headings(&body);
        Ok(record)
    }

    /// The series called `series_name`, or `None` when no post belongs to it
    pub fn get_series(&self, series_name: &str) -> Result<Option<SeriesGroup>, BlogError> {
        let items = self.list_all()?;
        Ok(find_series(&items, series_name).cloned())
    }

    fn load_record(&self, id: &str) -> Result<(PostRecord, String), BlogError> {
        let raw = self.store.read_raw(id)?;
        let (fm, body) = FrontMatter::parse(&raw).map_err(|e| lift(id, e))?;
        let record = PostRecord::from_front_matter(id, &fm)?;
        Ok((record, body.to_string()))
    }
}

fn lift(id: &str, e: FrontMatterError) -> BlogError {
    BlogError::malformed(id, e.to_string())
}

/// Group parsed records into standalone posts and series, newest first.
///
/// Series keep the order in which their first member was seen; members are
/// ordered by `sequence`. Items with equal dates keep their relative order,
/// series ahead of standalone posts.
pub fn group_listing(records: Vec<PostRecord>) -> Result<Vec<ListingItem>, BlogError> {
    let mut series: IndexMap<String, Vec<PostRecord>> = IndexMap::new();
    let mut standalone = Vec::new();

    for record in records {
        match &record.series_name {
            Some(name) => match series.get_mut(name) {
                Some(members) => members.push(record),
                None => {
                    let name = name.clone();
                    series.insert(name, vec![record]);
                }
            },
            None => standalone.push(record),
        }
    }

    let mut items = Vec::with_capacity(series.len() + standalone.len());
    for (series_name, members) in series {
        items.push(ListingItem::Series(build_series(series_name, members)?));
    }
    items.extend(standalone.into_iter().map(ListingItem::Post));

    // Stable, so equal dates keep concatenation order
    items.sort_by(|a, b| b.date().cmp(&a.date()));

    Ok(items)
}

fn build_series(series_name: String, mut posts: Vec<PostRecord>) -> Result<SeriesGroup, BlogError> {
    // Subtitle comes from source order, before sorting by sequence
    let mut series_subtitle: Option<&PostRecord> = None;
    for post in &posts {
        let Some(subtitle) = post.series_subtitle.as_deref() else {
            continue;
        };
        match series_subtitle {
            None => series_subtitle = Some(post),
            Some(first) if first.series_subtitle.as_deref() != Some(subtitle) => {
                return Err(BlogError::malformed(
                    &post.id,
                    format!(
                        "seriesSubtitle {:?} for series {:?} disagrees with {:?} in {}",
                        subtitle,
                        series_name,
                        first.series_subtitle.as_deref().unwrap_or_default(),
                        first.id
                    ),
                ));
            }
            Some(_) => {}
        }
    }
    let series_subtitle = series_subtitle.and_then(|p| p.series_subtitle.clone());

    let Some(date) = posts.iter().map(|p| p.date).max() else {
        return Err(BlogError::malformed(&series_name, "series has no posts"));
    };

    posts.sort_by_key(|p| p.sequence);
    for pair in posts.windows(2) {
        if pair[0].sequence == pair[1].sequence {
            tracing::warn!(
                "Series {:?} has duplicate sequence {:?} ({} and {})",
                series_name,
                pair[0].sequence,
                pair[0].id,
                pair[1].id
            );
        }
    }

    Ok(SeriesGroup {
        series_name,
        series_subtitle,
        date,
        posts,
    })
}

/// Linear scan of a listing for a series
pub fn find_series<'a>(items: &'a [ListingItem], series_name: &str) -> Option<&'a SeriesGroup> {
    items.iter().find_map(|item| match item {
        ListingItem::Series(series) if series.series_name == series_name => Some(series),
        _ => None,
    })
}

/// Every post carrying a `featured` rank, lowest rank first
pub fn featured_list(items: &[ListingItem]) -> Vec<&PostRecord> {
    let mut featured: Vec<&PostRecord> = items
        .iter()
        .flat_map(|item| item.posts())
        .filter(|post| post.featured.is_some())
        .collect();

    featured.sort_by(|a, b| {
        let a = a.featured.unwrap_or(f64::INFINITY);
        let b = b.featured.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });

    featured
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn post(id: &str, on: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            date: date(on),
            title: id.to_uppercase(),
            subtitle: None,
            series_name: None,
            series_subtitle: None,
            sequence: None,
            featured: None,
            image: None,
            image_alt_text: None,
            image_width: None,
            image_height: None,
            photographer: None,
            photographer_link: None,
            extra: BTreeMap::new(),
            content_html: None,
            headings: Vec::new(),
        }
    }

    fn member(id: &str, on: &str, series: &str, sequence: i64) -> PostRecord {
        PostRecord {
            series_name: Some(series.to_string()),
            sequence: Some(sequence),
            ..post(id, on)
        }
    }

    fn ranked(id: &str, on: &str, rank: f64) -> PostRecord {
        PostRecord {
            featured: Some(rank),
            ..post(id, on)
        }
    }

    fn ids(items: &[ListingItem]) -> Vec<String> {
        items
            .iter()
            .map(|item| match item {
                ListingItem::Post(p) => p.id.clone(),
                ListingItem::Series(s) => format!("series:{}", s.series_name),
            })
            .collect()
    }

    #[test]
    fn test_listing_scenario() {
        let items = group_listing(vec![
            post("jan", "2023-01-01"),
            member("x-1", "2023-01-15", "X", 1),
            post("feb", "2023-02-01"),
            member("x-2", "2023-01-20", "X", 2),
        ])
        .unwrap();

        assert_eq!(ids(&items), vec!["feb", "series:X", "jan"]);
        match &items[1] {
            ListingItem::Series(series) => {
                assert_eq!(series.date, date("2023-01-20"));
                let members: Vec<_> = series.posts.iter().map(|p| p.id.as_str()).collect();
                assert_eq!(members, vec!["x-1", "x-2"]);
            }
            other => panic!("expected series, got {:?}", other),
        }
    }

    #[test]
    fn test_series_members_sorted_by_sequence() {
        let items = group_listing(vec![
            member("third", "2023-03-01", "S", 3),
            member("first", "2023-05-01", "S", 1),
            member("second", "2023-01-01", "S", 2),
        ])
        .unwrap();

        let ListingItem::Series(series) = &items[0] else {
            panic!("expected a series");
        };
        let order: Vec<_> = series.posts.iter().map(|p| p.sequence).collect();
        assert_eq!(order, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(series.date, date("2023-05-01"));
    }

    #[test]
    fn test_equal_dates_keep_relative_order() {
        let items = group_listing(vec![
            post("a", "2023-01-01"),
            post("b", "2023-01-01"),
            member("s-1", "2023-01-01", "S", 1),
            post("c", "2023-01-01"),
        ])
        .unwrap();

        // Series come first in concatenation order, then standalone posts
        assert_eq!(ids(&items), vec!["series:S", "a", "b", "c"]);
    }

    #[test]
    fn test_listing_sorted_descending() {
        let items = group_listing(vec![
            post("old", "2020-06-01"),
            post("new", "2024-06-01"),
            member("mid-1", "2022-01-01", "Mid", 1),
            post("older", "2019-01-01"),
        ])
        .unwrap();

        let dates: Vec<_> = items.iter().map(|i| i.date()).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
    }

    #[test]
    fn test_standalone_post_unchanged() {
        let original = PostRecord {
            subtitle: Some("sub".into()),
            image: Some("pic.png".into()),
            ..post("solo", "2023-01-01")
        };
        let items = group_listing(vec![original.clone()]).unwrap();
        assert_eq!(items, vec![ListingItem::Post(original)]);
    }

    #[test]
    fn test_series_subtitle_from_first_member_in_source_order() {
        let items = group_listing(vec![
            PostRecord {
                series_subtitle: None,
                ..member("b", "2023-01-02", "S", 2)
            },
            PostRecord {
                series_subtitle: Some("Subtitle".into()),
                ..member("a", "2023-01-01", "S", 1)
            },
        ])
        .unwrap();
        let ListingItem::Series(series) = &items[0] else {
            panic!("expected a series");
        };
        assert_eq!(series.series_subtitle.as_deref(), Some("Subtitle"));
    }

    #[test]
    fn test_conflicting_series_subtitles_rejected() {
        let err = group_listing(vec![
            PostRecord {
                series_subtitle: Some("One".into()),
                ..member("a", "2023-01-01", "S", 1)
            },
            PostRecord {
                series_subtitle: Some("Two".into()),
                ..member("b", "2023-01-02", "S", 2)
            },
        ])
        .unwrap_err();
        assert!(matches!(err, BlogError::MalformedContent { ref id, .. } if id == "b"));
    }

    #[test]
    fn test_featured_list() {
        let items = group_listing(vec![
            ranked("third", "2023-01-01", 3.0),
            post("plain", "2023-02-01"),
            PostRecord {
                featured: Some(1.0),
                ..member("series-part", "2023-03-01", "S", 1)
            },
            ranked("zero", "2023-04-01", 0.0),
            ranked("second", "2023-05-01", 2.0),
        ])
        .unwrap();

        let featured: Vec<_> = featured_list(&items).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(featured, vec!["zero", "series-part", "second", "third"]);
    }

    #[test]
    fn test_find_series() {
        let items = group_listing(vec![
            member("x-1", "2023-01-15", "X", 1),
            post("solo", "2023-02-01"),
        ])
        .unwrap();

        let series = find_series(&items, "X").unwrap();
        assert!(series.posts.iter().all(|p| p.series_name.as_deref() == Some("X")));
        assert!(find_series(&items, "Y").is_none());
        assert!(find_series(&items, "solo").is_none());
    }

    fn write_posts(files: &[(&str, &str)]) -> (TempDir, PostAggregator) {
        let dir = TempDir::new().unwrap();
        for (id, content) in files {
            fs::write(dir.path().join(format!("{}.md", id)), content).unwrap();
        }
        let store = ContentStore::new(dir.path(), "md");
        (dir, PostAggregator::new(store, MarkdownRenderer::new()))
    }

    #[test]
    fn test_list_all_from_store() {
        let (_dir, aggregator) = write_posts(&[
            ("jan", "---\ntitle: January\ndate: 2023-01-01\n---\nHi"),
            ("feb", "---\ntitle: February\ndate: 2023-02-01\n---\nHi"),
            (
                "x-1",
                "---\ntitle: X one\ndate: 2023-01-15\nseriesName: X\nsequence: 1\n---\nHi",
            ),
            (
                "x-2",
                "---\ntitle: X two\ndate: 2023-01-20\nseriesName: X\nsequence: 2\n---\nHi",
            ),
        ]);

        let items = aggregator.list_all().unwrap();
        assert_eq!(ids(&items), vec!["feb", "series:X", "jan"]);
        // Listing never renders bodies
        assert!(items
            .iter()
            .flat_map(|i| i.posts())
            .all(|p| p.content_html.is_none()));
    }

    #[test]
    fn test_list_all_fails_on_bad_item() {
        let (_dir, aggregator) = write_posts(&[
            ("good", "---\ntitle: Good\ndate: 2023-01-01\n---\nHi"),
            ("bad", "---\ntitle: Bad\ndate: 2023-01-01\nno closing marker"),
        ]);

        let err = aggregator.list_all().unwrap_err();
        assert!(matches!(err, BlogError::MalformedContent { ref id, .. } if id == "bad"));
    }

    #[test]
    fn test_get_single() {
        let (_dir, aggregator) = write_posts(&[(
            "hooks",
            "---\ntitle: Hooks\ndate: 2023-01-01\n---\n## Why hooks\n\nBecause.\n\n### useState\n",
        )]);

        let post = aggregator.get_single("hooks").unwrap();
        assert_eq!(post.id, "hooks");
        let html = post.content_html.unwrap();
        assert!(html.contains(r#"<h2 id="why-hooks">Why hooks</h2>"#));
        assert!(html.contains("<p>Because.</p>"));
        assert_eq!(post.headings.len(), 2);
        assert_eq!(post.headings[1].text, "useState");
        assert_eq!(post.headings[1].level, 3);
    }

    #[test]
    fn test_every_listed_id_loads() {
        let (_dir, aggregator) = write_posts(&[
            ("what..next", "---\ntitle: What next\ndate: 2023-03-01\n---\nSoon."),
            ("v1.2-notes", "---\ntitle: Notes\ndate: 2023-03-02\n---\n"),
        ]);

        let mut listed = ids(&aggregator.list_all().unwrap());
        listed.sort();
        assert_eq!(listed, vec!["v1.2-notes", "what..next"]);
        for id in aggregator.list_ids().unwrap() {
            assert_eq!(aggregator.get_single(&id).unwrap().id, id);
        }
    }

    #[test]
    fn test_get_single_not_found() {
        let (_dir, aggregator) = write_posts(&[]);
        assert!(matches!(
            aggregator.get_single("nope"),
            Err(BlogError::NotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_get_single_render_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("code.md"),
            "---\ntitle: Code\ndate: 2023-01-01\n---\n```rust\nfn main() {}\n```\n",
        )
        .unwrap();
        let aggregator = PostAggregator::new(
            ContentStore::new(dir.path(), "md"),
            MarkdownRenderer::with_options("missing-theme", false),
        );
        assert!(matches!(
            aggregator.get_single("code"),
            Err(BlogError::Render { ref id, .. }) if id == "code"
        ));
    }

    #[test]
    fn test_get_series() {
        let (_dir, aggregator) = write_posts(&[
            (
                "x-2",
                "---\ntitle: X two\ndate: 2023-01-20\nseriesName: X\nsequence: 2\n---\n",
            ),
            (
                "x-1",
                "---\ntitle: X one\ndate: 2023-01-15\nseriesName: X\nsequence: 1\nseriesSubtitle: All about X\n---\n",
            ),
            ("solo", "---\ntitle: Solo\ndate: 2023-02-01\n---\n"),
        ]);

        let series = aggregator.get_series("X").unwrap().unwrap();
        assert_eq!(series.series_subtitle.as_deref(), Some("All about X"));
        assert_eq!(series.posts[0].id, "x-1");
        assert!(aggregator.get_series("Nope").unwrap().is_none());
    }
}
