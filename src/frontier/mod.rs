//! Crawl frontier: the pending-URL queue plus the policy state that
//! decides which discovered links are admitted.
//!
//! The frontier is mutated only by the orchestrator's single logical
//! thread of control: `next()` dequeues one entry and retains it as the
//! current one, and `process()` must then be called exactly once with the
//! links discovered on that page before the next `next()` call. The crawl
//! terminates when `exhausted()` holds after all in-flight processing is
//! done.

pub mod filters;
pub mod seed;

use std::collections::{HashMap, VecDeque};

use log::{debug, info, warn};

pub use filters::{has_excluded_extension, normalize_for_dedup, same_domain};
pub use seed::{CrawlMode, Seed, SeedTracker};

/// One queued crawl target. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
    pub mode: CrawlMode,
    /// Normalized URL of the seed this entry is attributed to.
    pub seed_key: String,
}

/// FIFO queue of pending crawl targets with per-seed trackers.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    trackers: HashMap<String, SeedTracker>,
    current: Option<FrontierEntry>,
}

impl Frontier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the frontier. Each seed gets a tracker (pending = 1, seen =
    /// {seed url}) and a depth-0 entry. Seeds whose URL does not parse are
    /// rejected upstream by config validation; anything that slips through
    /// is skipped with a warning rather than crashing the crawl.
    pub fn init<I>(&mut self, seeds: I)
    where
        I: IntoIterator<Item = Seed>,
    {
        for seed in seeds {
            let Some(normalized) = filters::normalize_for_dedup(&seed.url) else {
                warn!(target: "warcforge::frontier", "Skipping unusable seed URL: {}", seed.url);
                continue;
            };
            if self.trackers.contains_key(&normalized) {
                debug!(target: "warcforge::frontier", "Duplicate seed ignored: {normalized}");
                continue;
            }
            self.trackers
                .insert(normalized.clone(), SeedTracker::new(&seed, normalized.clone()));
            self.queue.push_back(FrontierEntry {
                url: normalized.clone(),
                depth: 0,
                mode: seed.mode,
                seed_key: normalized,
            });
        }
        info!(
            target: "warcforge::frontier",
            "Frontier initialized with {} seed(s)",
            self.trackers.len()
        );
    }

    /// Pop the next crawl target, retaining it as the current entry for
    /// the mandatory follow-up `process()` call.
    pub fn next(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.current = Some(entry.clone());
        Some(entry)
    }

    /// Entries not yet dequeued.
    #[must_use]
    pub fn size(&self) -> usize {
        self.queue.len()
    }

    /// The crawl termination condition.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.queue.is_empty()
    }

    /// Apply scope policy to the links discovered on the current page,
    /// enqueue the newly in-scope ones, then settle the bookkeeping for
    /// the just-completed entry (retiring the seed's tracker when its
    /// pending count hits zero).
    ///
    /// Must be called exactly once per `next()`.
    pub fn process<'a, I>(&mut self, discovered: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(current) = self.current.take() else {
            warn!(target: "warcforge::frontier", "process() called with no current entry");
            return;
        };

        if current.mode.follows_links() {
            self.admit_links(&current, discovered);
        }

        let retire = match self.trackers.get_mut(&current.seed_key) {
            Some(tracker) => tracker.complete_one(),
            None => {
                warn!(
                    target: "warcforge::frontier",
                    "No tracker for seed {} while processing {}",
                    current.seed_key, current.url
                );
                false
            }
        };
        if retire {
            self.trackers.remove(&current.seed_key);
            info!(
                target: "warcforge::frontier",
                "Seed complete: {} ({} still active)",
                current.seed_key,
                self.trackers.len()
            );
        }
    }

    fn admit_links<'a, I>(&mut self, current: &FrontierEntry, discovered: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let next_depth = current.depth + 1;

        // At the depth limit the children are still captured, but with
        // their mode downgraded to PageOnly so they are never expanded.
        let child_mode = match current.mode {
            CrawlMode::Site => CrawlMode::Site,
            mode => {
                let limit = self
                    .trackers
                    .get(&current.seed_key)
                    .map_or(1, |t| t.depth_limit);
                if next_depth >= limit {
                    CrawlMode::PageOnly
                } else {
                    mode
                }
            }
        };

        let mut added = 0usize;
        for raw in discovered {
            let Some(normalized) = filters::normalize_for_dedup(raw) else {
                continue;
            };
            if filters::has_excluded_extension(&normalized) {
                continue;
            }
            let in_scope = match current.mode {
                CrawlMode::PageOnly => false,
                CrawlMode::PageSameDomain | CrawlMode::Site => {
                    filters::same_domain(&normalized, &current.url)
                }
                CrawlMode::PageAllLinks => true,
            };
            if !in_scope {
                continue;
            }
            let Some(tracker) = self.trackers.get_mut(&current.seed_key) else {
                break;
            };
            if !tracker.admit(&normalized) {
                continue;
            }
            self.queue.push_back(FrontierEntry {
                url: normalized,
                depth: next_depth,
                mode: child_mode,
                seed_key: current.seed_key.clone(),
            });
            added += 1;
        }
        if added > 0 {
            debug!(
                target: "warcforge::frontier",
                "Enqueued {added} link(s) from {} at depth {next_depth}",
                current.url
            );
        }
    }

    /// Number of seeds that still have pending work.
    #[must_use]
    pub fn active_seeds(&self) -> usize {
        self.trackers.len()
    }

    #[cfg(test)]
    pub(crate) fn tracker(&self, seed_key: &str) -> Option<&SeedTracker> {
        self.trackers.get(seed_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsite_links_leave_no_trace_in_seen() {
        let mut frontier = Frontier::new();
        frontier.init([Seed::new("https://site.com/", CrawlMode::PageSameDomain, 3)]);

        let entry = frontier.next().unwrap();
        frontier.process(["https://site.com/a", "https://elsewhere.com/c"]);

        let tracker = frontier.tracker(&entry.seed_key).unwrap();
        assert!(tracker.has_seen("https://site.com/a"));
        // Out-of-scope links are rejected before dedup registration, so
        // they never occupy memory in the seed's seen set.
        assert!(!tracker.has_seen("https://elsewhere.com/c"));
        assert_eq!(tracker.seen_count(), 2);
    }
}
