//! Crawl configuration types.
//!
//! `CrawlConfig` is the normalized form the orchestrator consumes: seeds
//! with their modes and depth budgets, idle-detection timings, WARC output
//! options, and browser options. It is built either from a TOML file
//! (loader.rs) or programmatically (builder.rs).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::frontier::Seed;
use crate::net_watch::IdleParams;

/// Idle-detection timings, in milliseconds on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlControl {
    /// Absolute per-page ceiling before idle is forced.
    pub global_wait_ms: u64,
    /// Quiet period required once in-flight traffic is low.
    pub inflight_idle_ms: u64,
    /// Max concurrent in-flight requests still considered quiet.
    pub num_inflight: usize,
    /// Ceiling for the initial navigation await.
    pub nav_wait_ms: u64,
}

impl Default for CrawlControl {
    fn default() -> Self {
        Self {
            global_wait_ms: 60_000,
            inflight_idle_ms: 1_500,
            num_inflight: 2,
            nav_wait_ms: 8_000,
        }
    }
}

impl CrawlControl {
    /// The watcher parameters these timings describe.
    #[must_use]
    pub fn idle_params(&self) -> IdleParams {
        IdleParams {
            global_wait: Duration::from_millis(self.global_wait_ms),
            idle_time: Duration::from_millis(self.inflight_idle_ms),
            idle_inflight_threshold: self.num_inflight,
            nav_timeout: Duration::from_millis(self.nav_wait_ms),
        }
    }
}

/// Archive file naming policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarcNaming {
    /// One file per archived URL, named from the URL plus a date stamp.
    Url,
    /// A single fixed-name file the whole crawl appends to.
    Fixed,
}

impl Default for WarcNaming {
    fn default() -> Self {
        Self::Url
    }
}

/// WARC output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarcOptions {
    pub naming: WarcNaming,
    /// Output directory for `.warc` files.
    pub output: PathBuf,
    /// Append to an existing file instead of truncating. Implied by
    /// `Fixed` naming after the first page.
    pub append: bool,
    /// File name used with `Fixed` naming.
    pub file_name: String,
    /// `isPartOf` field of the warcinfo record.
    pub is_part_of: String,
    /// `description` field of the warcinfo record.
    pub description: String,
}

impl Default for WarcOptions {
    fn default() -> Self {
        Self {
            naming: WarcNaming::Url,
            output: PathBuf::from("./archives"),
            append: false,
            file_name: String::from("crawl"),
            is_part_of: String::from("warcforge crawl"),
            description: String::from("High-fidelity page capture"),
        }
    }
}

/// Browser session options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: String,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: String::from(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
            ),
        }
    }
}

/// The full crawl configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub seeds: Vec<Seed>,
    #[serde(default)]
    pub crawl_control: CrawlControl,
    #[serde(default)]
    pub warc: WarcOptions,
    #[serde(default)]
    pub browser: BrowserOptions,
}

impl CrawlConfig {
    #[must_use]
    pub fn builder() -> super::builder::CrawlConfigBuilder {
        super::builder::CrawlConfigBuilder::default()
    }
}
