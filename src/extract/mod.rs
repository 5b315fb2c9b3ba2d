//! Field extraction against a rendered listing-detail page.
//!
//! The page structure is only partially consistent, so every attribute is
//! resolved through an ordered list of fallback strategies: the first
//! qualifying hit wins, and strategy exhaustion falls back to the field's
//! documented default. Only the title can invalidate the whole listing.

pub mod fields;
pub mod page_helpers;

use chromiumoxide::Page;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::listing::{self, ListingRecord, UNKNOWN_SELLER};
use page_helpers::{first_text_matching, safe_attribute, safe_text};

const TITLE_SELECTORS: &[&str] = &["h1.head", "h1"];

const PRICE_SELECTORS: &[&str] = &[
    ".price_value strong",
    ".price_value",
    "[data-currency=\"USD\"]",
];

// Odometer rows share their selectors with unrelated technical-data rows, so the
// strategy is selector + unit-marker filter rather than selector alone.
const ODOMETER_SELECTORS: &[&str] = &[
    ".base-information span",
    ".base-information__item",
    "dd",
    ".technical-info dd",
];

const SELLER_SELECTORS: &[&str] = &[
    ".seller_info_name",
    ".seller_info_title",
    "h4.name",
    ".seller-name",
    "[data-qa-id=\"seller_name\"]",
];

const IMAGE_SELECTORS: &[&str] = &[
    "img.outline",
    ".photo-620x465 img",
    ".gallery-order img",
    "picture img",
];

const IMAGE_COUNT_SELECTOR: &str = ".show-all.link-dotted";

const PLATE_SELECTOR: &str = ".state-num";

const VIN_SELECTORS: &[&str] = &[".label-vin", ".vin-code", "span.vin-code", "[class*=\"vin\"]"];

const PHONE_REVEAL_SELECTOR: &str = ".phone-show, .show-phone, [data-phone]";
const PHONE_VALUE_SELECTOR: &str = ".phone-number, .seller-phone";

/// First non-empty text among the ordered selector strategies.
async fn first_text(page: &Page, selectors: &[&str]) -> Option<String> {
    for selector in selectors {
        if let Some(text) = safe_text(page, selector).await {
            return Some(text);
        }
    }
    None
}

/// First non-empty attribute among the ordered selector strategies.
async fn first_attribute(page: &Page, selectors: &[&str], attribute: &str) -> Option<String> {
    for selector in selectors {
        if let Some(value) = safe_attribute(page, selector, attribute).await {
            return Some(value);
        }
    }
    None
}

async fn extract_odometer(page: &Page) -> i64 {
    for selector in ODOMETER_SELECTORS {
        if let Some(text) = first_text_matching(page, selector, |t| {
            t.contains("км") || t.contains("тис")
        })
        .await
            && let Some(km) = fields::parse_odometer(&text)
        {
            return km;
        }
    }
    0
}

async fn extract_vin(page: &Page) -> Option<String> {
    for selector in VIN_SELECTORS {
        if let Some(text) = safe_text(page, selector).await {
            match fields::vin_from_candidate(&text) {
                Some(vin) => return Some(vin),
                None => trace!("VIN candidate from {selector:?} has wrong length"),
            }
        }
    }
    // Last resort: the VIN is often present only in embedded page data.
    let content = page.content().await.ok()?;
    fields::scan_vin(&content)
}

/// Two-phase phone extraction: activate the reveal control, wait a fixed
/// interval for the number to render, then read and normalize it. Any
/// failure anywhere in the sequence yields 0 and touches nothing else.
async fn reveal_phone(page: &Page, config: &ScraperConfig) -> i64 {
    let Ok(button) = page.find_element(PHONE_REVEAL_SELECTOR).await else {
        return 0;
    };
    if let Err(e) = button.click().await {
        trace!("phone reveal click failed: {e}");
        return 0;
    }
    tokio::time::sleep(Duration::from_millis(config.phone_reveal_wait_ms)).await;
    match safe_text(page, PHONE_VALUE_SELECTOR).await {
        Some(text) => fields::normalize_phone(&text, &config.phone_country_prefix),
        None => 0,
    }
}

/// Resolve every listing attribute from an already-navigated page.
///
/// The title is extracted first and gates the whole record; every later
/// field absorbs its own failures via the documented default.
pub async fn extract_record(
    page: &Page,
    url: &str,
    config: &ScraperConfig,
) -> Result<ListingRecord, ScrapeError> {
    let title = first_text(page, TITLE_SELECTORS)
        .await
        .filter(|t| listing::is_valid_title(t))
        .ok_or(ScrapeError::InvalidListing)?;

    let price_usd = match first_text(page, PRICE_SELECTORS).await {
        Some(text) => fields::parse_price(&text).unwrap_or(0.0),
        None => 0.0,
    };

    let odometer_km = extract_odometer(page).await;

    let seller_name = first_text(page, SELLER_SELECTORS)
        .await
        .unwrap_or_else(|| UNKNOWN_SELLER.to_string());

    let primary_image_url = first_attribute(page, IMAGE_SELECTORS, "src")
        .await
        .unwrap_or_default();

    let image_count = safe_text(page, IMAGE_COUNT_SELECTOR)
        .await
        .and_then(|text| fields::first_integer(&text))
        .unwrap_or(1);

    let plate_number = safe_text(page, PLATE_SELECTOR)
        .await
        .and_then(|text| fields::first_token(&text));

    let vin = extract_vin(page).await;

    let phone_number = reveal_phone(page, config).await;

    debug!(%url, title = %title, "listing extracted");

    Ok(ListingRecord {
        url: url.to_string(),
        title,
        price_usd,
        odometer_km,
        seller_name,
        phone_number,
        primary_image_url,
        image_count,
        plate_number,
        vin,
        discovered_at: Utc::now(),
    })
}
