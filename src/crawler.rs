//! Run orchestrator: walks result pages, extracts listings sequentially,
//! and persists each page's batch.
//!
//! One navigation is in flight at any time, by design: pacing and
//! extraction order stay deterministic and load on the target site stays
//! bounded. Every fault below browser launch is contained at the
//! granularity it occurs (field, listing, or page) and never aborts the
//! run.

use std::collections::HashSet;
use std::time::Duration;

use chromiumoxide::Page;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{PageGuard, RenderSession};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::extract;
use crate::extract::page_helpers::{collect_attribute, wait_for_element};
use crate::listing::ListingRecord;
use crate::pacing::PacingPolicy;
use crate::pagination::{PageWalker, WalkState};
use crate::store::ListingStore;

/// Totals reported after a run reaches a terminal condition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    pub pages_visited: u32,
    pub listings_seen: u64,
    pub records_saved: u64,
}

/// Deduplicate and filter discovered hrefs into the candidate set.
///
/// Keeps URLs containing the listing-detail pattern, drops the new-vehicle
/// sub-pattern, and preserves the order of first discovery.
#[must_use]
pub fn filter_listing_urls<I>(hrefs: I, listing_pattern: &str, excluded_pattern: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for href in hrefs {
        if href.contains(listing_pattern)
            && !href.contains(excluded_pattern)
            && seen.insert(href.clone())
        {
            candidates.push(href);
        }
    }
    candidates
}

/// What the crawl loop does with one listing's extraction outcome.
#[derive(Debug, PartialEq)]
enum ListingAction {
    /// Extraction succeeded; the record joins the page batch.
    Keep(ListingRecord),
    /// The listing is skipped; the crawl continues at normal pace.
    Skip,
    /// The listing is skipped and the extended cooldown must elapse
    /// before the next navigation of any kind.
    Cooldown,
}

/// Map one listing's extraction result onto the loop transition. A
/// rate-limit signal never yields a record; everything else that fails is
/// contained to the single listing.
fn handle_outcome(result: Result<ListingRecord, ScrapeError>, url: &str) -> ListingAction {
    match result {
        Ok(record) => ListingAction::Keep(record),
        Err(ScrapeError::RateLimited) => {
            warn!(%url, "rate limited, scheduling cooldown");
            ListingAction::Cooldown
        }
        Err(e) => {
            warn!(%url, error = %e, "listing skipped");
            ListingAction::Skip
        }
    }
}

/// Explicit orchestrator value constructed by the caller; no process-wide
/// scraper state exists anywhere.
pub struct Scraper {
    config: ScraperConfig,
    store: ListingStore,
    pacing: PacingPolicy,
}

impl Scraper {
    #[must_use]
    pub fn new(config: ScraperConfig, store: ListingStore) -> Self {
        let pacing = config.pacing.clone();
        Self {
            config,
            store,
            pacing,
        }
    }

    /// Execute one full crawl to completion or exhaustion.
    ///
    /// The render session is released through the cleanup path below on
    /// every exit, including a failed crawl loop. Cancellation is honored
    /// cooperatively between pages.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<CrawlSummary, ScrapeError> {
        info!(start_url = %self.config.start_url, "starting crawl");

        let session = RenderSession::launch(&self.config)
            .await
            .map_err(|e| ScrapeError::Launch(format!("{e:#}")))?;

        let result = self.crawl_loop(&session, cancel).await;
        session.close().await;

        if let Ok(summary) = &result {
            info!(
                pages = summary.pages_visited,
                seen = summary.listings_seen,
                saved = summary.records_saved,
                "crawl finished"
            );
        }
        result
    }

    async fn crawl_loop(
        &self,
        session: &RenderSession,
        cancel: &CancellationToken,
    ) -> Result<CrawlSummary, ScrapeError> {
        let mut walker = PageWalker::new(self.config.empty_page_limit, self.config.max_pages);
        let mut summary = CrawlSummary::default();
        // Set by a rate-limit signal; pays the extended cooldown before the
        // next navigation of any kind.
        let mut cooldown_pending = false;

        while !walker.is_exhausted() {
            if cancel.is_cancelled() {
                info!("cancellation requested, stopping before next page");
                break;
            }

            let page_number = walker.current_page();
            if cooldown_pending {
                tokio::time::sleep(self.pacing.cooldown()).await;
                cooldown_pending = false;
            }

            let urls = self.fetch_page_urls(session, page_number).await;
            summary.pages_visited += 1;

            if !urls.is_empty() {
                info!(page = page_number, listings = urls.len(), "processing result page");

                let mut batch = Vec::new();
                for (index, url) in urls.iter().enumerate() {
                    if cooldown_pending {
                        tokio::time::sleep(self.pacing.cooldown()).await;
                        cooldown_pending = false;
                    }
                    tokio::time::sleep(self.pacing.detail_delay()).await;

                    summary.listings_seen += 1;
                    match handle_outcome(self.scrape_listing(session, url).await, url) {
                        ListingAction::Keep(record) => batch.push(record),
                        ListingAction::Skip => {}
                        ListingAction::Cooldown => cooldown_pending = true,
                    }

                    if index + 1 < urls.len() {
                        tokio::time::sleep(self.pacing.listing_gap()).await;
                    }
                }

                match self.store.persist_batch(&batch).await {
                    Ok(saved) => {
                        summary.records_saved += saved;
                        info!(page = page_number, saved, "page batch committed");
                    }
                    Err(e) => {
                        // Whole batch rolled back; the crawl moves on.
                        warn!(page = page_number, error = %ScrapeError::Storage(e), "page batch failed");
                    }
                }
            } else {
                debug!(page = page_number, "empty result page");
            }

            if walker.advance(urls.len()) == WalkState::Exhausted {
                break;
            }
            tokio::time::sleep(self.pacing.page_delay()).await;
        }

        Ok(summary)
    }

    /// One result page's deduplicated, filtered candidate URLs.
    ///
    /// A failed fetch is absorbed into an empty set so the walker's
    /// empty-page heuristic can decide termination.
    pub async fn fetch_page_urls(&self, session: &RenderSession, page_number: u32) -> Vec<String> {
        match self.discover_urls(session, page_number).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(page = page_number, error = %e, "failed to fetch result page");
                Vec::new()
            }
        }
    }

    async fn discover_urls(
        &self,
        session: &RenderSession,
        page_number: u32,
    ) -> Result<Vec<String>, ScrapeError> {
        let url = self.config.page_url(page_number);
        let page = PageGuard::new(
            session.new_page().await.map_err(browser_error)?,
            format!("results:{page_number}"),
        );

        self.navigate(&page, &url).await?;

        let base = Url::parse(&url)
            .map_err(|e| ScrapeError::Browser(format!("invalid result page url {url}: {e}")))?;
        let hrefs = collect_attribute(&page, &self.config.listing_anchor_selector(), "href").await;
        // href attributes come back document-relative; resolve them first.
        let absolute = hrefs
            .into_iter()
            .filter_map(|href| base.join(&href).ok())
            .map(|resolved| resolved.to_string());
        Ok(filter_listing_urls(
            absolute,
            &self.config.listing_pattern,
            &self.config.excluded_pattern,
        ))
    }

    /// Extract one listing, or report why it was skipped.
    ///
    /// A 429 response becomes `RateLimited` without touching the page
    /// further; other non-success statuses become `Unavailable`. Both are
    /// discard conditions, not run failures.
    pub async fn scrape_listing(
        &self,
        session: &RenderSession,
        url: &str,
    ) -> Result<ListingRecord, ScrapeError> {
        let page = PageGuard::new(
            session.new_page().await.map_err(browser_error)?,
            url.to_string(),
        );

        let status = self.navigate(&page, url).await?;
        if status == 429 {
            return Err(ScrapeError::RateLimited);
        }
        if status != 200 {
            return Err(ScrapeError::Unavailable(status));
        }

        // The title block renders after the load event on some layouts;
        // a miss here is fine, extraction decides validity itself.
        wait_for_element(
            &page,
            "h1",
            Duration::from_secs(self.config.title_wait_secs),
        )
        .await;

        extract::extract_record(&page, url, &self.config).await
    }

    /// Navigate with the configured timeout and return the HTTP status of
    /// the navigation response (200 when the response carries none, e.g.
    /// served from cache).
    async fn navigate(&self, page: &Page, url: &str) -> Result<i64, ScrapeError> {
        let timeout = Duration::from_secs(self.config.page_load_timeout_secs);

        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ScrapeError::Browser(format!("navigation to {url}: {e}"))),
            Err(_) => {
                return Err(ScrapeError::Browser(format!(
                    "navigation to {url} timed out after {}s",
                    timeout.as_secs()
                )));
            }
        }

        let response = match tokio::time::timeout(timeout, page.wait_for_navigation_response()).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ScrapeError::Browser(format!("page load for {url}: {e}"))),
            Err(_) => {
                return Err(ScrapeError::Browser(format!(
                    "page load for {url} timed out after {}s",
                    timeout.as_secs()
                )));
            }
        };

        Ok(response
            .as_ref()
            .and_then(|request| request.response.as_ref())
            .map_or(200, |r| r.status))
    }
}

fn browser_error(e: anyhow::Error) -> ScrapeError {
    ScrapeError::Browser(format!("{e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn urls(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn record(url: &str) -> ListingRecord {
        ListingRecord {
            url: url.to_string(),
            title: "Audi A6 2014".to_string(),
            price_usd: 18_500.0,
            odometer_km: 120_000,
            seller_name: "Unknown".to_string(),
            phone_number: 0,
            primary_image_url: String::new(),
            image_count: 1,
            plate_number: None,
            vin: None,
            discovered_at: Utc::now(),
        }
    }

    #[test]
    fn rate_limit_yields_no_record_and_requests_cooldown() {
        let url = "https://auto.ria.com/uk/auto_audi_a6_1.html";
        let action = handle_outcome(Err(ScrapeError::RateLimited), url);
        assert_eq!(action, ListingAction::Cooldown);
    }

    #[test]
    fn other_listing_faults_skip_without_cooldown() {
        let url = "https://auto.ria.com/uk/auto_bmw_x5_2.html";
        assert_eq!(
            handle_outcome(Err(ScrapeError::InvalidListing), url),
            ListingAction::Skip
        );
        assert_eq!(
            handle_outcome(Err(ScrapeError::Unavailable(404)), url),
            ListingAction::Skip
        );
        assert_eq!(
            handle_outcome(Err(ScrapeError::Browser("lost connection".into())), url),
            ListingAction::Skip
        );
    }

    #[test]
    fn successful_extraction_joins_the_batch() {
        let url = "https://auto.ria.com/uk/auto_ford_focus_4.html";
        let extracted = record(url);
        assert_eq!(
            handle_outcome(Ok(extracted.clone()), url),
            ListingAction::Keep(extracted)
        );
    }

    #[test]
    fn candidate_set_has_no_duplicates() {
        let hrefs = urls(&[
            "https://auto.ria.com/uk/auto_audi_a6_1.html",
            "https://auto.ria.com/uk/auto_bmw_x5_2.html",
            "https://auto.ria.com/uk/auto_audi_a6_1.html",
        ]);
        let candidates = filter_listing_urls(hrefs, "/auto_", "/newauto/");
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn candidate_set_excludes_new_vehicle_urls() {
        let hrefs = urls(&[
            "https://auto.ria.com/uk/auto_audi_a6_1.html",
            "https://auto.ria.com/uk/newauto/auto_skoda_octavia_3.html",
            "https://auto.ria.com/uk/news/some-article.html",
        ]);
        let candidates = filter_listing_urls(hrefs, "/auto_", "/newauto/");
        assert_eq!(
            candidates,
            urls(&["https://auto.ria.com/uk/auto_audi_a6_1.html"])
        );
    }

    #[test]
    fn discovery_order_is_preserved() {
        let hrefs = urls(&[
            "https://auto.ria.com/uk/auto_c.html",
            "https://auto.ria.com/uk/auto_a.html",
            "https://auto.ria.com/uk/auto_c.html",
            "https://auto.ria.com/uk/auto_b.html",
        ]);
        let candidates = filter_listing_urls(hrefs, "/auto_", "/newauto/");
        assert_eq!(
            candidates,
            urls(&[
                "https://auto.ria.com/uk/auto_c.html",
                "https://auto.ria.com/uk/auto_a.html",
                "https://auto.ria.com/uk/auto_b.html",
            ])
        );
    }
}
