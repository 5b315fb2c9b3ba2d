//! Render session: one headless Chromium process and browsing context per run.
//!
//! The session owns the browser, the spawned CDP handler task, and the
//! temporary user data directory, and releases all three on `close()`.
//! Launch failure is the only fatal condition in the pipeline.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::ops::Deref;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

use crate::config::ScraperConfig;

/// Find a Chrome/Chromium executable with platform-specific search paths.
pub async fn find_browser_executable() -> Result<PathBuf> {
    // Environment variable overrides all other methods.
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!(
            "CHROMIUM_PATH points to non-existent file: {}",
            path.display()
        );
    }

    let paths = if cfg!(target_os = "windows") {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for path_str in paths {
        let path = if let Some(rest) = path_str.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            }
        } else {
            PathBuf::from(path_str)
        };
        if path.exists() {
            info!("found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in &["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    let path = PathBuf::from(path_str);
                    info!("found browser via 'which': {}", path.display());
                    return Ok(path);
                }
            }
        }
    }

    warn!("no Chrome/Chromium executable found, will download a managed one");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Download a managed Chromium into the user cache directory and return the
/// executable path. Used when no local browser is found.
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("downloading managed Chromium browser");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("autoria-scraper")
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
        "downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );
    Ok(revision_info.executable_path)
}

/// A page that closes itself on every exit path.
///
/// `Drop` spawns the async `Page::close`, so callers get guaranteed release
/// of the navigable surface even when extraction bails out early.
pub struct PageGuard {
    page: Option<Page>,
    label: String,
}

impl PageGuard {
    #[must_use]
    pub fn new(page: Page, label: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            label: label.into(),
        }
    }
}

impl Deref for PageGuard {
    type Target = Page;

    fn deref(&self) -> &Page {
        self.page.as_ref().expect("page present until drop")
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let label = std::mem::take(&mut self.label);
            task::spawn(async move {
                if let Err(e) = page.close().await {
                    debug!("failed to close page ({label}): {e}");
                }
            });
        }
    }
}

/// Long-lived browsing context with a fixed identity for one crawl run.
pub struct RenderSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_data_dir: PathBuf,
    /// Set when the directory was created by us and should be removed.
    owns_data_dir: bool,
}

impl RenderSession {
    /// Find or download Chromium and launch it headless with the configured
    /// user agent and locale. This is the pipeline's only fatal failure.
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let chrome_path = match find_browser_executable().await {
            Ok(path) => path,
            Err(_) => download_managed_browser().await?,
        };

        let (user_data_dir, owns_data_dir) = match &config.chrome_data_dir {
            Some(dir) => (dir.clone(), false),
            None => (
                std::env::temp_dir().join(format!("autoria_chrome_{}", std::process::id())),
                true,
            ),
        };
        std::fs::create_dir_all(&user_data_dir)
            .context("Failed to create user data directory")?;

        let mut config_builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(config.page_load_timeout_secs))
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir.clone())
            .chrome_executable(chrome_path);

        if config.headless {
            config_builder = config_builder.headless_mode(HeadlessMode::default());
        } else {
            config_builder = config_builder.with_head();
        }

        config_builder = config_builder
            .arg(format!("--user-agent={}", config.user_agent))
            .arg(format!("--lang={}", config.locale))
            .arg(format!("--accept-lang={}", config.locale))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-background-networking")
            .arg("--disable-background-timer-throttling")
            .arg("--disable-hang-monitor")
            .arg("--disable-prompt-on-repost")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--metrics-recording-only")
            .arg("--password-store=basic")
            .arg("--use-mock-keychain")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        let browser_config = config_builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        info!("launching browser");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let msg = e.to_string();
                    // Chrome sends CDP events chromiumoxide cannot deserialize;
                    // those are noise, not failures.
                    let benign = msg
                        .contains("data did not match any variant of untagged enum Message")
                        || msg.contains("Failed to deserialize WS response");
                    if benign {
                        trace!("suppressed benign CDP serialization error: {msg}");
                    } else {
                        warn!("browser handler error: {msg}");
                    }
                }
            }
            debug!("browser event handler task completed");
        });

        Ok(Self {
            browser,
            handler_task,
            user_data_dir,
            owns_data_dir,
        })
    }

    /// Open a fresh navigable surface. Callers are expected to wrap the
    /// result in a [`PageGuard`] so it is released on every exit path.
    pub async fn new_page(&self) -> Result<Page> {
        self.browser
            .new_page("about:blank")
            .await
            .context("Failed to create page")
    }

    /// Release the context, the browser process, and the handler task.
    /// Invoked exactly once, at run end, from the orchestrator's cleanup path.
    pub async fn close(mut self) {
        debug!("closing browser");
        if let Err(e) = self.browser.close().await {
            warn!("failed to close browser: {e}");
        }
        // Wait for the process to fully exit before tearing down the handler.
        if let Err(e) = self.browser.wait().await {
            warn!("failed to wait for browser exit: {e}");
        }
        self.handler_task.abort();

        if self.owns_data_dir
            && let Err(e) = std::fs::remove_dir_all(&self.user_data_dir)
        {
            warn!(
                "failed to remove user data directory {}: {e}",
                self.user_data_dir.display()
            );
        }
        info!("browser session closed");
    }
}
