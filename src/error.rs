//! Error taxonomy for the crawl pipeline.
//!
//! Every variant below `Launch` is contained at the granularity it occurs:
//! a field miss is absorbed into a default, a listing-level error skips one
//! listing, a storage error rolls back one page batch. Only `Launch` aborts
//! a run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The browser process or context could not be acquired. Fatal.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// Navigation returned HTTP 429. The listing is skipped and an extended
    /// cooldown is scheduled before the next navigation of any kind.
    #[error("rate limited by target site")]
    RateLimited,

    /// Navigation returned a non-success status. The listing is skipped.
    #[error("listing unavailable (HTTP {0})")]
    Unavailable(i64),

    /// The title failed its length constraint; no partial record is kept.
    #[error("listing discarded: missing or too-short title")]
    InvalidListing,

    /// Browser/CDP fault while working on one listing or result page.
    #[error("browser error: {0}")]
    Browser(String),

    /// Storage fault during a page batch; the whole batch was rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
