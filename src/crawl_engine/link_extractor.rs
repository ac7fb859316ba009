//! In-page link collection.
//!
//! After idle is reached the orchestrator evaluates a small script in the
//! page that gathers every anchor and area href, both as structured link
//! objects for the frontier and as pre-formatted outlinks text for the
//! archive's metadata record.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::Deserialize;

/// JavaScript evaluated in the page to collect outbound links.
pub const LINKS_SCRIPT: &str = r#"
    (() => {
        const links = [];
        const outlinks = [];
        const seen = new Set();
        document.querySelectorAll('a[href], area[href]').forEach(el => {
            const href = el.href;
            if (!href || seen.has(href)) {
                return;
            }
            seen.add(href);
            links.push({
                href: href,
                pathname: el.pathname || '',
                host: el.host || ''
            });
            outlinks.push(`outlink: ${href} L a/@href`);
        });
        return {
            links: links,
            outlinks: outlinks.join('\n'),
            location: window.location.href
        };
    })()
"#;

/// One discovered link.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlLink {
    pub href: String,
    #[serde(default)]
    pub pathname: String,
    #[serde(default)]
    pub host: String,
}

/// Everything the in-page collector returns for one page.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectedLinks {
    pub links: Vec<CrawlLink>,
    /// One CDX-style annotated line per discovered link.
    pub outlinks: String,
    /// The page's final location after any client-side redirects.
    pub location: String,
}

impl CollectedLinks {
    /// An empty collection attributed to the given location, used when
    /// extraction fails and the page is archived without outlinks.
    #[must_use]
    pub fn empty(location: &str) -> Self {
        Self {
            links: Vec::new(),
            outlinks: String::new(),
            location: location.to_string(),
        }
    }
}

/// Run the collector script in the page.
pub async fn collect_links(page: &Page) -> Result<CollectedLinks> {
    let js_result = page
        .evaluate(LINKS_SCRIPT)
        .await
        .context("Failed to execute link collection script")?;

    let collected: CollectedLinks = match js_result.into_value::<serde_json::Value>() {
        Ok(value) => {
            serde_json::from_value(value).context("Failed to parse links from JS result")?
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to get links value: {e}")),
    };

    log::debug!(
        target: "warcforge::links",
        "Collected {} link(s) from {}",
        collected.links.len(),
        collected.location
    );
    Ok(collected)
}
