//! The crawl loop.
//!
//! One navigation is driven through completion at a time: dequeue from the
//! frontier, navigate, pump network events into the capture buffer and the
//! idle watcher, collect links, feed the frontier, drain the buffer into a
//! WARC file. A new navigation's capture window never opens until the
//! previous watcher has terminated and capturing has stopped, so events
//! cannot leak across navigations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::network::{self, GetResponseBodyParams};
use chromiumoxide::Page;
use log::{debug, error, info, warn};

use crate::browser_setup::{launch_browser, shutdown_browser};
use crate::config::{CrawlConfig, WarcNaming};
use crate::frontier::{Frontier, FrontierEntry};
use crate::net_watch::{IdleOutcome, NetIdleWatcher};
use crate::request_monitor::{CapturedRequest, RequestMonitor};
use crate::warc::{request_head, response_head, warc_path_fixed, warc_path_for_url, WarcWriter};

use super::crawl_types::{CrawlError, CrawlSummary, PageStatus};
use super::link_extractor::{collect_links, CollectedLinks};
use super::page_events::PageEventPump;

/// Script injected before any document loads: neuters page APIs that can
/// stall an unattended crawl (modal dialogs, print, unload prompts).
const DISABLE_DISRUPTIONS_SCRIPT: &str = r"
    window.alert = () => {};
    window.confirm = () => true;
    window.prompt = () => null;
    window.print = () => {};
    window.onbeforeunload = null;
";

/// Run a complete crawl to frontier exhaustion.
pub async fn crawl_pages(config: CrawlConfig) -> Result<CrawlSummary> {
    let mut frontier = Frontier::new();
    frontier.init(config.seeds.clone());

    let (browser, handler_task, profile_dir) = launch_browser(&config.browser)
        .await
        .context("Failed to launch browser")?;

    let result = run_crawl_loop(&browser, &config, &mut frontier).await;

    shutdown_browser(browser, handler_task, profile_dir).await;

    result
}

async fn run_crawl_loop(
    browser: &chromiumoxide::Browser,
    config: &CrawlConfig,
    frontier: &mut Frontier,
) -> Result<CrawlSummary> {
    let page = browser
        .new_page("about:blank")
        .await
        .context("Failed to open crawl tab")?;

    prepare_page(&page).await?;

    let mut monitor = RequestMonitor::new();
    let mut summary = CrawlSummary::default();
    let mut first_archive = true;

    while let Some(entry) = frontier.next() {
        info!(
            target: "warcforge::crawl",
            "Crawling [depth {}] ({} queued): {}",
            entry.depth,
            frontier.size(),
            entry.url
        );

        match archive_one(&page, config, &entry, &mut monitor, first_archive).await {
            Ok(report) => {
                first_archive = false;
                summary.pages_archived += 1;
                summary.records_written += report.records_written;
                if report.status == PageStatus::TimedOut {
                    summary.pages_timed_out += 1;
                }
                frontier.process(report.links.links.iter().map(|l| l.href.as_str()));
            }
            Err(CrawlError::Disconnected(msg)) => {
                error!(target: "warcforge::crawl", "Browser disconnected, aborting crawl: {msg}");
                frontier.process(std::iter::empty::<&str>());
                return Err(CrawlError::Disconnected(msg).into());
            }
            Err(e) => {
                warn!(target: "warcforge::crawl", "Skipping {}: {e}", entry.url);
                summary.pages_skipped += 1;
                frontier.process(std::iter::empty::<&str>());
            }
        }
    }

    info!(
        target: "warcforge::crawl",
        "Crawl complete: {} archived, {} skipped, {} timed out, {} WARC record(s)",
        summary.pages_archived,
        summary.pages_skipped,
        summary.pages_timed_out,
        summary.records_written
    );
    Ok(summary)
}

async fn prepare_page(page: &Page) -> Result<()> {
    page.execute(network::EnableParams::default())
        .await
        .context("Failed to enable network events")?;
    let disable_script =
        chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(DISABLE_DISRUPTIONS_SCRIPT)
            .build()
            .map_err(anyhow::Error::msg)?;
    page.execute(disable_script)
        .await
        .context("Failed to install disruption-disabling script")?;
    Ok(())
}

struct PageReport {
    status: PageStatus,
    links: CollectedLinks,
    records_written: usize,
}

/// Drive one frontier entry through navigation, capture, link collection,
/// and archival.
async fn archive_one(
    page: &Page,
    config: &CrawlConfig,
    entry: &FrontierEntry,
    monitor: &mut RequestMonitor,
    first_archive: bool,
) -> Result<PageReport, CrawlError> {
    let params = config.crawl_control.idle_params();

    // Subscribe before navigating so no early event is missed.
    let pump = PageEventPump::subscribe(page)
        .await
        .map_err(|e| CrawlError::Protocol(e.to_string()))?;

    monitor.start_capturing(true);
    let watcher = NetIdleWatcher::new(params);

    match tokio::time::timeout(params.nav_timeout, page.goto(entry.url.clone())).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            monitor.stop_capturing();
            return Err(CrawlError::from_cdp(&e));
        }
        Err(_) => {
            // Slow navigation is not fatal; the watcher bounds the rest.
            debug!(
                target: "warcforge::crawl",
                "Navigation still pending after {:?}, watching network anyway",
                params.nav_timeout
            );
        }
    }

    let outcome = pump.drive(monitor, watcher).await;
    monitor.stop_capturing();

    let status = match outcome {
        IdleOutcome::NetworkIdle => PageStatus::Idle,
        IdleOutcome::GlobalTimeout => {
            warn!(
                target: "warcforge::crawl",
                "Gave up waiting for idle on {}, archiving what was captured",
                entry.url
            );
            PageStatus::TimedOut
        }
    };

    let links = match collect_links(page).await {
        Ok(collected) => collected,
        Err(e) => {
            warn!(
                target: "warcforge::crawl",
                "Link collection failed for {}: {e}",
                entry.url
            );
            CollectedLinks::empty(&entry.url)
        }
    };

    let records_written = match write_archive(page, config, entry, monitor, &links, first_archive)
        .await
    {
        Ok(count) => count,
        Err(e) => {
            // Fatal for this file only; the crawl moves on.
            error!(
                target: "warcforge::crawl",
                "WARC write failed for {}: {e:#}",
                entry.url
            );
            return Err(CrawlError::Warc(e));
        }
    };

    Ok(PageReport {
        status,
        links,
        records_written,
    })
}

/// Resolve the archive path and append flag for this page per the naming
/// policy.
fn archive_target(config: &CrawlConfig, entry: &FrontierEntry, first_archive: bool) -> (PathBuf, bool) {
    match config.warc.naming {
        WarcNaming::Url => (
            warc_path_for_url(&config.warc.output, &entry.url, chrono::Utc::now()),
            config.warc.append,
        ),
        WarcNaming::Fixed => (
            warc_path_fixed(&config.warc.output, &config.warc.file_name),
            if first_archive { config.warc.append } else { true },
        ),
    }
}

async fn write_archive(
    page: &Page,
    config: &CrawlConfig,
    entry: &FrontierEntry,
    monitor: &RequestMonitor,
    links: &CollectedLinks,
    first_archive: bool,
) -> Result<usize> {
    let (path, appending) = archive_target(config, entry, first_archive);
    let mut writer = WarcWriter::init(&path, appending).await?;

    writer
        .write_warcinfo(
            env!("CARGO_PKG_VERSION"),
            &config.warc.is_part_of,
            &config.warc.description,
            &config.browser.user_agent,
        )
        .await?;
    writer
        .write_metadata_outlinks(&entry.url, &links.outlinks)
        .await?;

    for record in monitor.iter() {
        write_transaction(page, &mut writer, record).await?;
    }

    let written = writer.records_written();
    writer.end().await?;
    Ok(written)
}

/// Serialize one captured transaction as request and response records.
async fn write_transaction(
    page: &Page,
    writer: &mut WarcWriter,
    record: &CapturedRequest,
) -> Result<()> {
    let Some(target_uri) = record.url.as_deref() else {
        debug!(
            target: "warcforge::crawl",
            "Dropping transaction {} with no usable URL",
            record.request_id
        );
        return Ok(());
    };

    if let Some(head) = request_head(record) {
        let body = record.post_data.as_ref().map(String::as_bytes);
        writer.write_request_record(target_uri, &head, body).await?;
    }

    if let Some(response) = record.latest_response() {
        let head = response_head(response);
        let body = fetch_response_body(page, &record.request_id).await;
        writer
            .write_response_record(target_uri, &head, body.as_deref())
            .await?;
    }
    Ok(())
}

/// Pull the response body out of the browser's network buffer. Best
/// effort: bodies are evicted on navigation and some resources never had
/// one, so failure degrades to a body-less record.
async fn fetch_response_body(page: &Page, request_id: &str) -> Option<Vec<u8>> {
    // Disambiguated duplicate keys carry a local suffix the protocol
    // does not know about.
    let protocol_id = request_id.split('#').next().unwrap_or(request_id);
    let params = GetResponseBodyParams::new(network::RequestId::new(protocol_id));
    match page.execute(params).await {
        Ok(result) => {
            if result.base64_encoded {
                match base64::engine::general_purpose::STANDARD.decode(&result.body) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        debug!(
                            target: "warcforge::crawl",
                            "Undecodable body for {request_id}: {e}"
                        );
                        None
                    }
                }
            } else {
                Some(result.body.clone().into_bytes())
            }
        }
        Err(e) => {
            debug!(
                target: "warcforge::crawl",
                "No response body for {request_id}: {e}"
            );
            None
        }
    }
}
