//! Daemon entry point: runs one crawl immediately, then repeats it daily at
//! the configured time, with a daily database snapshot on its own schedule.
//! Ctrl-C requests a cooperative stop between pages.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use autoria_scraper::{ListingStore, Scraper, ScraperConfig, schedule};

async fn run_once(scraper: &Scraper, store: &ListingStore, cancel: &CancellationToken) {
    match scraper.run(cancel).await {
        Ok(summary) => {
            info!(
                pages = summary.pages_visited,
                seen = summary.listings_seen,
                saved = summary.records_saved,
                "scrape run complete"
            );
            match store.recent(5).await {
                Ok(records) => {
                    for record in records {
                        info!(
                            url = %record.url,
                            title = %record.title,
                            price_usd = record.price_usd,
                            "recently stored"
                        );
                    }
                }
                Err(e) => warn!("failed to query recent records: {e}"),
            }
        }
        Err(e) => warn!("scrape run failed: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ScraperConfig::from_env();
    let store = ListingStore::open(&config.database_path).await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                cancel.cancel();
            }
        });
    }

    // Snapshot job on its own daily schedule.
    let snapshot_task = {
        let store = store.clone();
        let dump_dir = config.dump_dir.clone();
        let (hour, minute) = config.dump_time;
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = schedule::wait_until(hour, minute) => {
                        if let Err(e) = store.snapshot(&dump_dir).await {
                            warn!("snapshot failed: {e}");
                        }
                    }
                }
            }
        })
    };

    let scraper = Scraper::new(config.clone(), store.clone());
    let (hour, minute) = config.scrape_time;
    info!(
        scrape_at = format!("{hour:02}:{minute:02}"),
        dump_at = format!("{:02}:{:02}", config.dump_time.0, config.dump_time.1),
        "scheduler started"
    );

    // Initial run at startup, then daily.
    run_once(&scraper, &store, &cancel).await;
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = schedule::wait_until(hour, minute) => run_once(&scraper, &store, &cancel).await,
        }
    }

    snapshot_task.abort();
    store.close().await;
    info!("shut down cleanly");
    Ok(())
}
