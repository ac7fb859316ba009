//! Crawl orchestration: browser-driven archiving of frontier entries.

pub mod crawl_types;
pub mod link_extractor;
pub mod orchestrator;
pub mod page_events;

pub use crawl_types::{CrawlError, CrawlSummary, PageStatus};
pub use link_extractor::{collect_links, CollectedLinks, CrawlLink};
pub use orchestrator::crawl_pages;
