//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::content::{featured_list, ListingItem};
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let aggregator = blog.aggregator();

    let output = match content_type {
        "ids" => {
            let ids = aggregator.list_ids()?;
            let mut out = format!("Ids ({}):\n", ids.len());
            for id in ids {
                writeln!(out, "  {}", id)?;
            }
            out
        }
        _ => describe(&aggregator.list_all()?, content_type)?,
    };

    print!("{}", output);
    Ok(())
}

/// Describe a listing as text
fn describe(items: &[ListingItem], content_type: &str) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            writeln!(out, "Posts ({}):", items.len())?;
            for item in items {
                match item {
                    ListingItem::Post(post) => {
                        writeln!(out, "  {} - {} [{}]", post.date, post.title, post.id)?;
                    }
                    ListingItem::Series(series) => {
                        writeln!(out, "  {} - {} (series)", series.date, series.series_name)?;
                        for post in &series.posts {
                            writeln!(
                                out,
                                "      {}. {} - {} [{}]",
                                post.sequence.unwrap_or_default(),
                                post.date,
                                post.title,
                                post.id
                            )?;
                        }
                    }
                }
            }
        }
        "series" => {
            let series: Vec<_> = items.iter().filter_map(|i| i.series_name()).collect();
            writeln!(out, "Series ({}):", series.len())?;
            for item in items {
                if let ListingItem::Series(s) = item {
                    writeln!(out, "  {} ({} posts)", s.series_name, s.posts.len())?;
                }
            }
        }
        "featured" => {
            let featured = featured_list(items);
            writeln!(out, "Featured ({}):", featured.len())?;
            for post in featured {
                writeln!(
                    out,
                    "  #{} {} [{}]",
                    post.featured.unwrap_or_default(),
                    post.title,
                    post.id
                )?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, series, featured, ids",
                content_type
            );
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::group_listing;
    use crate::content::{FrontMatter, PostRecord};

    fn record(id: &str, front: &str) -> PostRecord {
        let raw = format!("---\n{}\n---\n", front);
        let (fm, _) = FrontMatter::parse(&raw).unwrap();
        PostRecord::from_front_matter(id, &fm).unwrap()
    }

    fn listing() -> Vec<ListingItem> {
        group_listing(vec![
            record("solo", "title: Solo\ndate: 2023-02-01\nfeatured: 1"),
            record("x-1", "title: X One\ndate: 2023-01-15\nseriesName: X\nsequence: 1"),
        ])
        .unwrap()
    }

    #[test]
    fn test_describe_posts() {
        let out = describe(&listing(), "posts").unwrap();
        assert!(out.starts_with("Posts (2):\n"));
        assert!(out.contains("  2023-02-01 - Solo [solo]\n"));
        assert!(out.contains("  2023-01-15 - X (series)\n"));
        assert!(out.contains("      1. 2023-01-15 - X One [x-1]\n"));
    }

    #[test]
    fn test_describe_series_and_featured() {
        let items = listing();
        assert!(describe(&items, "series").unwrap().contains("  X (1 posts)"));
        assert!(describe(&items, "featured").unwrap().contains("#1 Solo [solo]"));
    }

    #[test]
    fn test_describe_unknown_type() {
        assert!(describe(&listing(), "tags").is_err());
    }
}
