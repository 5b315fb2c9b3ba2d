//! Deduplicating listing store over SQLite.
//!
//! Write-once-per-URL semantics: a record is inserted the first time its URL
//! is seen and never modified afterwards. Each page batch is one transaction;
//! a storage fault rolls the whole batch back and is reported to the caller
//! as a page-level failure.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::listing::ListingRecord;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS listings (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    price_usd REAL NOT NULL,
    odometer_km INTEGER NOT NULL,
    seller_name TEXT NOT NULL,
    phone_number INTEGER NOT NULL,
    primary_image_url TEXT NOT NULL,
    image_count INTEGER NOT NULL,
    plate_number TEXT,
    vin TEXT,
    discovered_at TEXT NOT NULL
);

-- Index for the recency diagnostics query
CREATE INDEX IF NOT EXISTS idx_listings_discovered_at ON listings(discovered_at);
"#;

/// SQLite-backed persistence gateway for extracted listings.
#[derive(Clone)]
pub struct ListingStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl ListingStore {
    /// Open (or create) the database and run the idempotent schema bootstrap.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        sqlx::query(SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("Failed to initialize database schema")?;

        info!("database ready at {}", db_path.display());
        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    /// Persist one page's worth of records atomically.
    ///
    /// Each record is checked by URL inside the transaction; absent rows are
    /// inserted and counted, present rows are skipped silently. Returns the
    /// number of newly inserted records. On any fault the transaction is
    /// dropped unfinished, which rolls back the entire batch.
    pub async fn persist_batch(&self, batch: &[ListingRecord]) -> Result<u64, sqlx::Error> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for record in batch {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM listings WHERE url = ?")
                .bind(&record.url)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_some() {
                debug!(url = %record.url, "already stored, skipping");
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO listings (
                    url, title, price_usd, odometer_km, seller_name,
                    phone_number, primary_image_url, image_count,
                    plate_number, vin, discovered_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.url)
            .bind(&record.title)
            .bind(record.price_usd)
            .bind(record.odometer_km)
            .bind(&record.seller_name)
            .bind(record.phone_number)
            .bind(&record.primary_image_url)
            .bind(record.image_count)
            .bind(&record.plate_number)
            .bind(&record.vin)
            .bind(record.discovered_at)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Whether a listing with this URL has already been stored.
    pub async fn contains(&self, url: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM listings WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Total stored listings.
    pub async fn record_count(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Most recently discovered listings, newest first. Diagnostics only.
    pub async fn recent(&self, limit: i64) -> Result<Vec<ListingRecord>, sqlx::Error> {
        sqlx::query_as::<_, ListingRecord>(
            "SELECT * FROM listings ORDER BY discovered_at DESC, url LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Write a timestamped snapshot of the database into `dump_dir`.
    ///
    /// Uses `VACUUM INTO`, which produces a consistent copy even while the
    /// WAL is live. Returns the snapshot path.
    pub async fn snapshot(&self, dump_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dump_dir)
            .await
            .context("Failed to create dump directory")?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let target = dump_dir.join(format!("dump_{stamp}.sqlite"));
        let target_str = target
            .to_str()
            .context("Dump path is not valid UTF-8")?
            .replace('\'', "''");

        sqlx::query(&format!("VACUUM INTO '{target_str}'"))
            .execute(&self.pool)
            .await
            .context("Failed to snapshot database")?;

        info!("snapshot written to {}", target.display());
        Ok(target)
    }

    /// Path of the backing database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
