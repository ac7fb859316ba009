//! Seed definitions and per-seed bookkeeping.
//!
//! A seed is a user-specified starting URL plus the policy that governs how
//! far the crawl spreads from it. Each distinct seed owns a `SeedTracker`
//! that records which URLs have been attributed to it and how many of them
//! are still waiting in the frontier.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Traversal policy for a seed.
///
/// The mode decides both which discovered links are followed and when the
/// crawl rooted at the seed terminates. Every policy branch matches on this
/// enum exhaustively; there is no string comparison at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// Archive the page itself; never follow discovered links.
    PageOnly,
    /// Follow links whose registrable domain matches the seed's, up to the
    /// seed's depth budget.
    PageSameDomain,
    /// Follow any in-scope link, up to the seed's depth budget.
    PageAllLinks,
    /// Same-domain following with no depth limit.
    Site,
}

impl CrawlMode {
    /// Whether this mode follows links at all.
    #[must_use]
    pub const fn follows_links(&self) -> bool {
        !matches!(self, Self::PageOnly)
    }

    /// Whether links must stay on the seed page's domain.
    #[must_use]
    pub const fn same_domain_only(&self) -> bool {
        matches!(self, Self::PageSameDomain | Self::Site)
    }
}

impl Default for CrawlMode {
    fn default() -> Self {
        Self::PageOnly
    }
}

/// A starting URL with its crawl mode and depth budget.
///
/// Immutable after creation; validation of the URL string happens at config
/// load time, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    pub url: String,
    #[serde(default)]
    pub mode: CrawlMode,
    /// Depth budget. Ignored for `Site` mode. Minimum 1.
    #[serde(default = "default_depth")]
    pub depth: u32,
}

const fn default_depth() -> u32 {
    1
}

impl Seed {
    #[must_use]
    pub fn new(url: impl Into<String>, mode: CrawlMode, depth: u32) -> Self {
        Self {
            url: url.into(),
            mode,
            depth: depth.max(1),
        }
    }
}

/// Per-seed crawl state.
///
/// `pending` counts queued-but-not-yet-processed URLs attributed to the
/// seed; it starts at 1 (the seed itself) and the tracker is removed from
/// the frontier when it reaches zero, which is the seed's completion
/// signal. `seen` holds every normalized URL ever enqueued for the seed so
/// the same URL is never crawled twice under one seed.
#[derive(Debug)]
pub struct SeedTracker {
    pub mode: CrawlMode,
    pub depth_limit: u32,
    pending: usize,
    seen: HashSet<String>,
}

impl SeedTracker {
    /// Create a tracker for a seed, with the seed URL pre-registered in
    /// `seen` and a pending count of 1.
    #[must_use]
    pub fn new(seed: &Seed, normalized_url: String) -> Self {
        let mut seen = HashSet::new();
        seen.insert(normalized_url);
        Self {
            mode: seed.mode,
            depth_limit: seed.depth.max(1),
            pending: 1,
            seen,
        }
    }

    /// Idempotent membership: returns true and records the URL only if it
    /// has never been offered before.
    pub fn admit(&mut self, normalized_url: &str) -> bool {
        if self.seen.contains(normalized_url) {
            return false;
        }
        self.seen.insert(normalized_url.to_string());
        self.pending += 1;
        true
    }

    #[must_use]
    pub fn has_seen(&self, normalized_url: &str) -> bool {
        self.seen.contains(normalized_url)
    }

    /// Account for one dequeued-and-processed entry. Returns true when no
    /// work attributed to this seed remains and the tracker can be retired.
    pub fn complete_one(&mut self) -> bool {
        self.pending = self.pending.saturating_sub(1);
        self.pending == 0
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
