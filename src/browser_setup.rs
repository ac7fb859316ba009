//! Browser discovery, launch, and teardown.
//!
//! Locates an installed Chrome/Chromium (or downloads a managed build as a
//! last resort), launches it with an isolated throwaway profile, and owns
//! the CDP handler task for the lifetime of the crawl.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use log::{error, info, trace, warn};
use tokio::task::{self, JoinHandle};

use crate::config::BrowserOptions;

/// Find a Chrome/Chromium executable with platform-specific search paths.
/// The `CHROMIUM_PATH` environment variable overrides everything else.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!(
                target: "warcforge::browser",
                "Using browser from CHROMIUM_PATH: {}",
                path.display()
            );
            return Ok(path);
        }
        warn!(
            target: "warcforge::browser",
            "CHROMIUM_PATH points to a non-existent file: {}",
            path.display()
        );
    }

    let paths = if cfg!(target_os = "windows") {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
            r"C:\Program Files (x86)\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for path_str in paths {
        let path = if let Some(rest) = path_str.strip_prefix("~/") {
            let Some(home) = dirs::home_dir() else {
                continue;
            };
            home.join(rest)
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            info!(target: "warcforge::browser", "Found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in &["chromium", "chromium-browser", "google-chrome", "chrome"] {
            let output = Command::new("which").arg(cmd).output();
            if let Ok(output) = output {
                if output.status.success() {
                    let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path_str.is_empty() {
                        let path = PathBuf::from(path_str);
                        info!(
                            target: "warcforge::browser",
                            "Found browser via 'which': {}",
                            path.display()
                        );
                        return Ok(path);
                    }
                }
            }
        }
    }

    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Download a managed Chromium build into the user cache directory and
/// return the executable path.
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!(target: "warcforge::browser", "Downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| {
            let fallback = std::env::temp_dir().join("warcforge_chrome_cache");
            warn!(
                target: "warcforge::browser",
                "No user cache directory, using temp fallback: {}",
                fallback.display()
            );
            fallback
        })
        .join("warcforge")
        .join("chromium");

    std::fs::create_dir_all(&cache_dir).context("Failed to create browser cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );

    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!(
        target: "warcforge::browser",
        "Downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );

    Ok(revision_info.executable_path)
}

/// Find-or-download the browser, then launch it with an isolated profile.
///
/// Returns the browser handle, the spawned CDP handler task, and the
/// throwaway profile directory (removed again at shutdown).
pub async fn launch_browser(
    options: &BrowserOptions,
) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    let chrome_path = match find_browser_executable().await {
        Ok(path) => path,
        Err(_) => {
            warn!(
                target: "warcforge::browser",
                "No local browser found, falling back to managed download"
            );
            download_managed_browser().await?
        }
    };

    let user_data_dir =
        std::env::temp_dir().join(format!("warcforge_chrome_{}", std::process::id()));
    std::fs::create_dir_all(&user_data_dir).context("Failed to create user data directory")?;

    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(1920, 1080)
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(chrome_path);

    config_builder = if options.headless {
        config_builder.headless_mode(HeadlessMode::default())
    } else {
        config_builder.with_head()
    };

    config_builder = config_builder
        .arg(format!("--user-agent={}", options.user_agent))
        .arg("--disable-notifications")
        .arg("--disable-print-preview")
        .arg("--disable-popup-blocking")
        .arg("--disable-background-networking")
        .arg("--disable-background-timer-throttling")
        .arg("--disable-backgrounding-occluded-windows")
        .arg("--disable-breakpad")
        .arg("--disable-hang-monitor")
        .arg("--disable-prompt-on-repost")
        .arg("--disable-extensions")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--no-sandbox")
        .arg("--ignore-certificate-errors")
        .arg("--metrics-recording-only")
        .arg("--password-store=basic")
        .arg("--use-mock-keychain")
        .arg("--hide-scrollbars")
        .arg("--mute-audio");

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    info!(target: "warcforge::browser", "Launching browser");
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let error_msg = e.to_string();

                // Chrome emits CDP events chromiumoxide has no variant for;
                // those deserialization failures are harmless noise.
                // See chromiumoxide issues #167 and #229.
                let is_benign_serialization_error = error_msg
                    .contains("data did not match any variant of untagged enum Message")
                    || error_msg.contains("Failed to deserialize WS response");

                if is_benign_serialization_error {
                    trace!(
                        target: "warcforge::browser",
                        "Suppressed benign CDP serialization error: {error_msg}"
                    );
                } else {
                    error!(target: "warcforge::browser", "Browser handler error: {e:?}");
                }
            }
        }
        info!(target: "warcforge::browser", "Browser handler task completed");
    });

    Ok((browser, handler_task, user_data_dir))
}

/// Tear the browser down in order: close the browser, wait for the child
/// process, stop the handler task, remove the throwaway profile. Each step
/// is best effort so one failure never leaks the others.
pub async fn shutdown_browser(
    mut browser: Browser,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
) {
    if let Err(e) = browser.close().await {
        warn!(target: "warcforge::browser", "Browser close failed: {e}");
    }
    if let Err(e) = browser.wait().await {
        warn!(target: "warcforge::browser", "Browser wait failed: {e}");
    }
    handler_task.abort();

    if profile_dir.exists() {
        if let Err(e) = tokio::fs::remove_dir_all(&profile_dir).await {
            warn!(
                target: "warcforge::browser",
                "Failed to remove profile dir {}: {e}",
                profile_dir.display()
            );
        }
    }
}
