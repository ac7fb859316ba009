//! Core types for the crawl loop: the error taxonomy and per-page
//! outcome reporting.

use thiserror::Error;

/// Crawl failure taxonomy.
///
/// Only `Disconnected` is fatal to the whole crawl (no browser left to
/// drive); `Protocol` failures skip the current frontier entry, and
/// `Warc` failures end the current archive file but the crawl continues
/// with the next one.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The browser transport is gone; nothing further can be navigated.
    #[error("Browser disconnected: {0}")]
    Disconnected(String),

    /// A protocol command was rejected or failed for this page.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The WARC output stream errored.
    #[error("WARC write error: {0}")]
    Warc(#[source] anyhow::Error),

    /// Browser launch or environment setup failed.
    #[error("Browser error: {0}")]
    Browser(String),
}

impl CrawlError {
    /// Classify a CDP command failure: transport-level failures mean the
    /// browser is unreachable, anything else is a per-page protocol error.
    #[must_use]
    pub fn from_cdp(err: &chromiumoxide::error::CdpError) -> Self {
        let msg = err.to_string();
        let lowered = msg.to_lowercase();
        if lowered.contains("websocket")
            || lowered.contains("channel")
            || lowered.contains("connection")
            || lowered.contains("send error")
        {
            Self::Disconnected(msg)
        } else {
            Self::Protocol(msg)
        }
    }
}

/// How one navigation ended, for the crawl summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Network settled within the idle criteria.
    Idle,
    /// The global ceiling fired first; archived whatever was captured.
    TimedOut,
}

/// Totals for a finished crawl.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlSummary {
    pub pages_archived: usize,
    pub pages_skipped: usize,
    pub pages_timed_out: usize,
    pub records_written: usize,
}
