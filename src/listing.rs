//! Listing record data model and validity rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel seller name used when no seller selector resolves.
pub const UNKNOWN_SELLER: &str = "Unknown";

/// Minimum trimmed title length for a listing to be considered valid.
pub const MIN_TITLE_LEN: usize = 3;

/// One extracted vehicle listing.
///
/// The `url` is the natural key: storage keeps at most one row per URL and
/// never updates it on re-discovery. Numeric fields use `0` as the
/// "could not be resolved" value rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListingRecord {
    pub url: String,
    pub title: String,
    pub price_usd: f64,
    pub odometer_km: i64,
    pub seller_name: String,
    /// Integer-encoded digits including the country prefix; 0 when the
    /// reveal flow did not produce a usable number.
    pub phone_number: i64,
    pub primary_image_url: String,
    pub image_count: i64,
    pub plate_number: Option<String>,
    pub vin: Option<String>,
    pub discovered_at: DateTime<Utc>,
}

/// A title qualifies only when its trimmed form is at least [`MIN_TITLE_LEN`]
/// characters. Anything shorter invalidates the whole listing.
#[must_use]
pub fn is_valid_title(title: &str) -> bool {
    title.trim().chars().count() >= MIN_TITLE_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_are_rejected() {
        assert!(!is_valid_title(""));
        assert!(!is_valid_title("  "));
        assert!(!is_valid_title("ab"));
        assert!(!is_valid_title(" a "));
    }

    #[test]
    fn real_titles_pass() {
        assert!(is_valid_title("BMW"));
        assert!(is_valid_title("Audi A6 2014"));
        assert!(is_valid_title("  ВАЗ 2101  "));
    }
}
