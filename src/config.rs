//! Scraper configuration.
//!
//! Plain struct with sensible defaults, fluent setters for the knobs callers
//! actually tune, and an environment loader for the deployment surface
//! (database path, schedule times, browser override).

use crate::pacing::PacingPolicy;
use crate::pagination::{EMPTY_PAGE_LIMIT, MAX_PAGES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// User agent presented by the browsing context for the whole run.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Listings index for used vehicles; `?page=N` is appended per fetch.
pub const BASE_URL: &str = "https://auto.ria.com/uk/car/used/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Paginated result index to walk.
    pub start_url: String,
    /// Substring that marks a listing-detail URL.
    pub listing_pattern: String,
    /// Substring that excludes new-vehicle listings from the candidate set.
    pub excluded_pattern: String,
    /// Hard cap on result pages per run.
    pub max_pages: u32,
    /// Consecutive empty pages treated as exhaustion.
    pub empty_page_limit: u32,
    pub headless: bool,
    pub user_agent: String,
    /// Browser locale, also sent as `--lang`.
    pub locale: String,
    /// Timeout for `goto` and the navigation response, per page.
    pub page_load_timeout_secs: u64,
    /// Bounded wait for the title element before extraction starts.
    pub title_wait_secs: u64,
    /// Fixed wait after clicking the phone-reveal control.
    pub phone_reveal_wait_ms: u64,
    /// Country prefix applied to 10-digit local phone numbers.
    pub phone_country_prefix: String,
    pub pacing: PacingPolicy,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory receiving snapshot dumps.
    pub dump_dir: PathBuf,
    /// Daily scrape time as (hour, minute).
    pub scrape_time: (u32, u32),
    /// Daily snapshot time as (hour, minute).
    pub dump_time: (u32, u32),
    /// Explicit Chrome user data directory; a per-process temp dir otherwise.
    pub chrome_data_dir: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            start_url: BASE_URL.to_string(),
            listing_pattern: "/auto_".to_string(),
            excluded_pattern: "/newauto/".to_string(),
            max_pages: MAX_PAGES,
            empty_page_limit: EMPTY_PAGE_LIMIT,
            headless: true,
            user_agent: USER_AGENT.to_string(),
            locale: "uk-UA".to_string(),
            page_load_timeout_secs: 30,
            title_wait_secs: 5,
            phone_reveal_wait_ms: 2000,
            phone_country_prefix: "38".to_string(),
            pacing: PacingPolicy::default(),
            database_path: PathBuf::from("autoria.sqlite"),
            dump_dir: PathBuf::from("dumps"),
            scrape_time: (12, 0),
            dump_time: (12, 0),
            chrome_data_dir: None,
        }
    }
}

impl ScraperConfig {
    /// Build a config from the process environment, falling back to defaults
    /// for anything unset or unparseable (with a warning, never a panic).
    ///
    /// Recognized variables: `DATABASE_PATH`, `DUMP_DIR`, `SCRAPE_TIME`,
    /// `DUMP_TIME` (both `HH:MM`), `MAX_PAGES`, `HEADLESS`.
    /// `CHROMIUM_PATH` is consumed separately by browser discovery.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("DUMP_DIR") {
            config.dump_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var("SCRAPE_TIME") {
            match crate::schedule::parse_hhmm(&raw) {
                Some(time) => config.scrape_time = time,
                None => warn!("ignoring malformed SCRAPE_TIME {raw:?}"),
            }
        }
        if let Ok(raw) = std::env::var("DUMP_TIME") {
            match crate::schedule::parse_hhmm(&raw) {
                Some(time) => config.dump_time = time,
                None => warn!("ignoring malformed DUMP_TIME {raw:?}"),
            }
        }
        if let Ok(raw) = std::env::var("MAX_PAGES") {
            match raw.parse::<u32>() {
                Ok(n) if n > 0 => config.max_pages = n,
                _ => warn!("ignoring malformed MAX_PAGES {raw:?}"),
            }
        }
        if let Ok(raw) = std::env::var("HEADLESS") {
            config.headless = raw != "0" && !raw.eq_ignore_ascii_case("false");
        }

        config
    }

    #[must_use]
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = url.into();
        self
    }

    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    #[must_use]
    pub fn with_chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chrome_data_dir = Some(dir.into());
        self
    }

    /// URL of one result page.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        format!("{}?page={page}", self.start_url)
    }

    /// CSS selector matching anchors that look like listing-detail links.
    #[must_use]
    pub fn listing_anchor_selector(&self) -> String {
        format!("a[href*=\"{}\"]", self.listing_pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_appends_page_query() {
        let config = ScraperConfig::default();
        assert_eq!(
            config.page_url(7),
            "https://auto.ria.com/uk/car/used/?page=7"
        );
    }

    #[test]
    fn anchor_selector_embeds_listing_pattern() {
        let config = ScraperConfig::default();
        assert_eq!(config.listing_anchor_selector(), "a[href*=\"/auto_\"]");
    }

    #[test]
    fn setters_override_defaults() {
        let config = ScraperConfig::default()
            .with_start_url("https://auto.ria.com/uk/car/used/audi/")
            .with_database_path("/var/lib/autoria/listings.sqlite")
            .with_max_pages(50)
            .with_pacing(PacingPolicy::zero())
            .with_chrome_data_dir("/tmp/profile");

        assert_eq!(
            config.page_url(2),
            "https://auto.ria.com/uk/car/used/audi/?page=2"
        );
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/autoria/listings.sqlite")
        );
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.pacing.cooldown_secs, 0);
        assert_eq!(config.chrome_data_dir, Some(PathBuf::from("/tmp/profile")));
    }
}
