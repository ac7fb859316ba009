//! Fluent builder for `CrawlConfig`.
//!
//! Programmatic alternative to the TOML loader; defaults match the loader's
//! defaults so the two paths produce identical configs for identical input.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::frontier::{CrawlMode, Seed};

use super::types::{BrowserOptions, CrawlConfig, CrawlControl, WarcNaming, WarcOptions};

#[derive(Debug, Default)]
pub struct CrawlConfigBuilder {
    seeds: Vec<Seed>,
    crawl_control: CrawlControl,
    warc: WarcOptions,
    browser: BrowserOptions,
}

impl CrawlConfigBuilder {
    /// Add one seed with its mode and depth budget.
    #[must_use]
    pub fn seed(mut self, url: impl Into<String>, mode: CrawlMode, depth: u32) -> Self {
        self.seeds.push(Seed::new(url, mode, depth));
        self
    }

    #[must_use]
    pub fn global_wait_ms(mut self, ms: u64) -> Self {
        self.crawl_control.global_wait_ms = ms;
        self
    }

    #[must_use]
    pub fn inflight_idle_ms(mut self, ms: u64) -> Self {
        self.crawl_control.inflight_idle_ms = ms;
        self
    }

    #[must_use]
    pub fn num_inflight(mut self, n: usize) -> Self {
        self.crawl_control.num_inflight = n;
        self
    }

    #[must_use]
    pub fn nav_wait_ms(mut self, ms: u64) -> Self {
        self.crawl_control.nav_wait_ms = ms;
        self
    }

    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.warc.output = dir.into();
        self
    }

    #[must_use]
    pub fn warc_naming(mut self, naming: WarcNaming) -> Self {
        self.warc.naming = naming;
        self
    }

    #[must_use]
    pub fn append(mut self, append: bool) -> Self {
        self.warc.append = append;
        self
    }

    #[must_use]
    pub fn warc_file_name(mut self, name: impl Into<String>) -> Self {
        self.warc.file_name = name.into();
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.browser.user_agent = user_agent.into();
        self
    }

    /// Validate and produce the config. At least one seed is required.
    pub fn build(self) -> Result<CrawlConfig> {
        if self.seeds.is_empty() {
            return Err(anyhow!("At least one seed URL is required"));
        }
        let config = CrawlConfig {
            seeds: self.seeds,
            crawl_control: self.crawl_control,
            warc: self.warc,
            browser: self.browser,
        };
        super::loader::validate(&config)?;
        Ok(config)
    }
}
