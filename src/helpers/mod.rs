//! Helper functions for templates and page assembly

mod date;
mod share;
mod url;

pub use date::*;
pub use share::*;
pub use url::*;
