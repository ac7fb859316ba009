//! Crawl configuration: types, fluent builder, and TOML loading with
//! validation and sensible defaults.

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::CrawlConfigBuilder;
pub use loader::{load, validate, ConfigError};
pub use types::{BrowserOptions, CrawlConfig, CrawlControl, WarcNaming, WarcOptions};
