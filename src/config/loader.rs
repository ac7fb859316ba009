//! TOML configuration loading and validation.
//!
//! Frontier scope violations (malformed seeds, unparseable URLs) are
//! rejected here, at load time; the core components downstream assume
//! well-formed input and do not re-validate.

use std::path::Path;

use log::info;
use thiserror::Error;
use url::Url;

use super::types::{CrawlConfig, WarcNaming};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("No seeds configured")]
    NoSeeds,
    #[error("Seed URL is not a valid http(s) URL: {0}")]
    BadSeedUrl(String),
    #[error("Seed depth must be at least 1: {0}")]
    BadDepth(String),
    #[error("Crawl control: {0}")]
    BadTiming(&'static str),
    #[error("WARC file name must not be empty with fixed naming")]
    EmptyWarcFileName,
}

/// Load and validate a crawl configuration from a TOML file.
pub fn load(path: &Path) -> Result<CrawlConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: CrawlConfig = toml::from_str(&raw)?;
    validate(&config)?;
    info!(
        target: "warcforge::config",
        "Loaded config with {} seed(s) from {}",
        config.seeds.len(),
        path.display()
    );
    Ok(config)
}

/// Validate a configuration regardless of where it came from.
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::NoSeeds);
    }
    for seed in &config.seeds {
        let parsed =
            Url::parse(&seed.url).map_err(|_| ConfigError::BadSeedUrl(seed.url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::BadSeedUrl(seed.url.clone()));
        }
        if seed.depth == 0 {
            return Err(ConfigError::BadDepth(seed.url.clone()));
        }
    }
    if config.crawl_control.global_wait_ms == 0 {
        return Err(ConfigError::BadTiming("global_wait_ms must be positive"));
    }
    if config.crawl_control.inflight_idle_ms == 0 {
        return Err(ConfigError::BadTiming("inflight_idle_ms must be positive"));
    }
    if config.warc.naming == WarcNaming::Fixed && config.warc.file_name.trim().is_empty() {
        return Err(ConfigError::EmptyWarcFileName);
    }
    Ok(())
}
