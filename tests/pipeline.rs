//! End-to-end properties of the non-browser pipeline pieces: candidate
//! filtering, pagination termination, and deduplicating persistence.

use anyhow::Result;
use chrono::Utc;
use tempfile::TempDir;

use autoria_scraper::{
    ListingRecord, ListingStore, PageWalker, WalkState, filter_listing_urls,
};

fn record(url: &str, title: &str) -> ListingRecord {
    ListingRecord {
        url: url.to_string(),
        title: title.to_string(),
        price_usd: 9_500.0,
        odometer_km: 210_000,
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
fn one_result_page_yields_a_clean_candidate_set() {
    let hrefs = vec![
        "https://auto.ria.com/uk/auto_vw_passat_1.html".to_string(),
        "https://auto.ria.com/uk/auto_vw_passat_1.html".to_string(),
        "https://auto.ria.com/uk/newauto/auto_vw_tiguan_9.html".to_string(),
        "https://auto.ria.com/uk/auto_ford_focus_4.html".to_string(),
        "https://auto.ria.com/uk/dealers/some-dealer.html".to_string(),
    ];

    let candidates = filter_listing_urls(hrefs, "/auto_", "/newauto/");

    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|u| !u.contains("/newauto/")));
    let unique: std::collections::HashSet<_> = candidates.iter().collect();
    assert_eq!(unique.len(), candidates.len());
}

#[test]
fn walker_exhausts_on_empty_streak_before_hard_cap() {
    let mut walker = PageWalker::default();
    let page_counts = [40usize, 40, 0, 12, 0, 0, 0];

    let mut verdict = WalkState::Active;
    for count in page_counts {
        assert!(!walker.is_exhausted());
        verdict = walker.advance(count);
    }

    assert_eq!(verdict, WalkState::Exhausted);
    assert!(walker.current_page() < autoria_scraper::pagination::MAX_PAGES);
}

#[tokio::test]
async fn persistence_is_idempotent_across_runs() -> Result<()> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("listings.sqlite");

    // First run discovers two listings.
    let store = ListingStore::open(&db_path).await?;
    let batch = vec![
        record("https://auto.ria.com/uk/auto_vw_passat_1.html", "VW Passat B8"),
        record("https://auto.ria.com/uk/auto_ford_focus_4.html", "Ford Focus"),
    ];
    assert_eq!(store.persist_batch(&batch).await?, 2);
    store.close().await;

    // Second run re-discovers both plus one new listing.
    let store = ListingStore::open(&db_path).await?;
    let mut next_batch = batch.clone();
    next_batch.push(record(
        "https://auto.ria.com/uk/auto_skoda_superb_7.html",
        "Skoda Superb",
    ));
    assert_eq!(store.persist_batch(&next_batch).await?, 1);
    assert_eq!(store.record_count().await?, 3);

    store.close().await;
    Ok(())
}
