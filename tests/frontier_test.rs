//! Frontier policy tests: seeding, scope filtering, depth handling, and
//! seed retirement.

use warcforge::frontier::{CrawlMode, Frontier, Seed};

fn frontier_with(seed: Seed) -> Frontier {
    let mut frontier = Frontier::new();
    frontier.init([seed]);
    frontier
}

#[test]
fn seed_is_enqueued_at_depth_zero() {
    let mut frontier = frontier_with(Seed::new("https://example.com/", CrawlMode::PageOnly, 1));
    assert_eq!(frontier.size(), 1);
    assert_eq!(frontier.active_seeds(), 1);

    let entry = frontier.next().expect("seed entry");
    assert_eq!(entry.depth, 0);
    assert_eq!(entry.url, "https://example.com/");
    assert_eq!(entry.mode, CrawlMode::PageOnly);
}

#[test]
fn unparseable_seed_is_skipped() {
    let mut frontier = Frontier::new();
    frontier.init([Seed::new("not a url", CrawlMode::Site, 1)]);
    assert!(frontier.exhausted());
    assert_eq!(frontier.active_seeds(), 0);
}

#[test]
fn page_only_never_follows_links() {
    let mut frontier = frontier_with(Seed::new("https://example.com/", CrawlMode::PageOnly, 5));
    frontier.next().expect("seed entry");
    frontier.process(["https://example.com/other", "https://elsewhere.com/"]);
    assert!(frontier.exhausted());
    // The only pending entry was processed, so the seed is retired.
    assert_eq!(frontier.active_seeds(), 0);
}

#[test]
fn same_domain_mode_filters_offsite_links() {
    let mut frontier =
        frontier_with(Seed::new("https://example.com/", CrawlMode::PageSameDomain, 2));
    frontier.next().expect("seed entry");
    frontier.process([
        "https://example.com/a",
        "https://www.example.com/b",
        "https://elsewhere.com/c",
    ]);

    // Offsite link rejected; www. counts as the same registrable domain.
    assert_eq!(frontier.size(), 2);
    let urls: Vec<String> = std::iter::from_fn(|| {
        let entry = frontier.next()?;
        frontier.process(std::iter::empty::<&str>());
        Some(entry.url)
    })
    .collect();
    assert!(urls.contains(&"https://example.com/a".to_string()));
    assert!(urls.contains(&"https://www.example.com/b".to_string()));
}

#[test]
fn all_links_mode_crosses_domains() {
    let mut frontier =
        frontier_with(Seed::new("https://example.com/", CrawlMode::PageAllLinks, 2));
    frontier.next().expect("seed entry");
    frontier.process(["https://elsewhere.com/c"]);
    assert_eq!(frontier.size(), 1);
}

#[test]
fn children_at_depth_limit_are_downgraded_to_page_only() {
    let mut frontier =
        frontier_with(Seed::new("https://example.com/", CrawlMode::PageSameDomain, 1));
    frontier.next().expect("seed entry");
    frontier.process(["https://example.com/a"]);

    // Depth budget 1: the child is still archived, but its mode is
    // downgraded so its own links are never followed.
    let child = frontier.next().expect("child entry");
    assert_eq!(child.depth, 1);
    assert_eq!(child.mode, CrawlMode::PageOnly);

    frontier.process(["https://example.com/grandchild"]);
    assert!(frontier.exhausted());
}

#[test]
fn site_mode_has_no_depth_limit() {
    let mut frontier = frontier_with(Seed::new("https://example.com/", CrawlMode::Site, 1));
    frontier.next().expect("seed entry");
    frontier.process(["https://example.com/a"]);

    let child = frontier.next().expect("child entry");
    assert_eq!(child.mode, CrawlMode::Site);
    frontier.process(["https://example.com/b"]);

    let grandchild = frontier.next().expect("grandchild entry");
    assert_eq!(grandchild.depth, 2);
    assert_eq!(grandchild.mode, CrawlMode::Site);
}

#[test]
fn duplicate_links_are_enqueued_once() {
    let mut frontier = frontier_with(Seed::new("https://example.com/", CrawlMode::Site, 1));
    frontier.next().expect("seed entry");
    frontier.process([
        "https://example.com/a",
        "https://example.com/a",
        "https://example.com/a#section",
        "https://example.com/",
    ]);
    // One distinct new URL after fragment stripping; the seed itself is
    // already seen.
    assert_eq!(frontier.size(), 1);
}

#[test]
fn excluded_extensions_are_not_enqueued() {
    let mut frontier = frontier_with(Seed::new("https://example.com/", CrawlMode::Site, 1));
    frontier.next().expect("seed entry");
    frontier.process([
        "https://example.com/photo.jpg",
        "https://example.com/doc.pdf",
        "https://example.com/archive.zip",
        "https://example.com/page.html",
    ]);
    assert_eq!(frontier.size(), 1);
    assert_eq!(
        frontier.next().expect("entry").url,
        "https://example.com/page.html"
    );
}

#[test]
fn seed_retires_only_when_all_descendants_processed() {
    let mut frontier = frontier_with(Seed::new("https://example.com/", CrawlMode::Site, 1));
    frontier.next().expect("seed entry");
    frontier.process(["https://example.com/a", "https://example.com/b"]);
    assert_eq!(frontier.active_seeds(), 1);

    frontier.next().expect("first child");
    frontier.process(std::iter::empty::<&str>());
    assert_eq!(frontier.active_seeds(), 1);

    frontier.next().expect("second child");
    frontier.process(std::iter::empty::<&str>());
    assert_eq!(frontier.active_seeds(), 0);
    assert!(frontier.exhausted());
}

#[test]
fn multiple_seeds_track_independently() {
    let mut frontier = Frontier::new();
    frontier.init([
        Seed::new("https://one.example/", CrawlMode::PageOnly, 1),
        Seed::new("https://two.example/", CrawlMode::PageOnly, 1),
    ]);
    assert_eq!(frontier.active_seeds(), 2);

    frontier.next().expect("first seed");
    frontier.process(std::iter::empty::<&str>());
    assert_eq!(frontier.active_seeds(), 1);

    frontier.next().expect("second seed");
    frontier.process(std::iter::empty::<&str>());
    assert_eq!(frontier.active_seeds(), 0);
}

#[test]
fn entries_dequeue_in_fifo_order() {
    let mut frontier = frontier_with(Seed::new("https://example.com/", CrawlMode::Site, 1));
    frontier.next().expect("seed entry");
    frontier.process([
        "https://example.com/first",
        "https://example.com/second",
        "https://example.com/third",
    ]);

    let order: Vec<String> = std::iter::from_fn(|| {
        let entry = frontier.next()?;
        frontier.process(std::iter::empty::<&str>());
        Some(entry.url)
    })
    .collect();
    assert_eq!(
        order,
        [
            "https://example.com/first",
            "https://example.com/second",
            "https://example.com/third",
        ]
    );
}
