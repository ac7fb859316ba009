//! High-fidelity web archiving: drive a real browser through a crawl
//! frontier, capture every HTTP transaction over CDP, and serialize the
//! capture as ISO 28500 WARC files.

pub mod browser_setup;
pub mod config;
pub mod crawl_engine;
pub mod frontier;
pub mod net_watch;
pub mod request_monitor;
pub mod warc;

pub use config::{CrawlConfig, CrawlConfigBuilder, WarcNaming};
pub use crawl_engine::{CrawlError, CrawlSummary};
pub use frontier::{CrawlMode, Frontier, Seed};
pub use net_watch::{IdleOutcome, IdleParams, NetIdleWatcher};
pub use request_monitor::RequestMonitor;
pub use warc::WarcWriter;

use anyhow::Result;

/// Run a crawl to completion with the given configuration.
pub async fn crawl(config: CrawlConfig) -> Result<CrawlSummary> {
    crawl_engine::crawl_pages(config).await
}
