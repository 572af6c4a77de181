//! Content module - reads, parses, renders and groups posts

pub mod aggregator;
mod frontmatter;
mod markdown;
mod post;
mod store;

pub use aggregator::{featured_list, find_series, group_listing, PostAggregator};
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use markdown::{extract_headings, MarkdownRenderer, RenderError};
pub use post::{Heading, ListingItem, PostRecord, SeriesGroup};
pub use store::ContentStore;
