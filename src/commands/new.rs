//! Create a new post

use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::Blog;

/// Create a new post, optionally as part `sequence` of a series
pub fn create_post(blog: &Blog, title: &str, series: Option<(&str, i64)>) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Title {:?} gives an empty post id", title);
    }

    fs::create_dir_all(&blog.posts_dir)?;

    let file_path = blog
        .posts_dir
        .join(format!("{}.{}", slug, blog.config.content_extension));

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let today = chrono::Local::now().date_naive();
    fs::write(&file_path, scaffold(title, today, series))?;

    println!("Created: {:?}", file_path);

    Ok(file_path)
}

fn scaffold(title: &str, date: NaiveDate, series: Option<(&str, i64)>) -> String {
    let mut content = String::from("---\n");
    content.push_str(&format!("title: {}\n", yaml_string(title)));
    content.push_str(&format!("date: {}\n", date.format("%Y-%m-%d")));
    if let Some((name, sequence)) = series {
        content.push_str(&format!("seriesName: {}\n", yaml_string(name)));
        content.push_str(&format!("sequence: {}\n", sequence));
    }
    content.push_str("---\n\n");
    content
}

/// Double-quoted YAML scalar
fn yaml_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
