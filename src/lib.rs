//! Scraper for AutoRia used-car listings.
//!
//! Walks the paginated result index with a single headless Chromium
//! context, extracts structured records from each listing-detail page via
//! ordered fallback selector strategies, and persists newly-seen records
//! into SQLite one page batch at a time.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod listing;
pub mod pacing;
pub mod pagination;
pub mod schedule;
pub mod store;

pub use browser::{PageGuard, RenderSession};
pub use config::ScraperConfig;
pub use crawler::{CrawlSummary, Scraper, filter_listing_urls};
pub use error::ScrapeError;
pub use listing::ListingRecord;
pub use pacing::PacingPolicy;
pub use pagination::{PageWalker, WalkState};
pub use store::ListingStore;
