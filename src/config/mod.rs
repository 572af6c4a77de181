//! Configuration module

mod site;

pub use site::AnalyticsConfig;
pub use site::HighlightConfig;
pub use site::SiteConfig;
pub use site::SubscribeConfig;
