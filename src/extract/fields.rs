//! Pure per-field parsers.
//!
//! Each function takes text in and yields an optional value out, so every
//! fallback strategy can be tested without a browser. Defaults live with the
//! callers in `extract::extract_record`.

use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// 17-character token from the restricted VIN alphabet (no I, O, Q).
static VIN_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-HJ-NPR-Z0-9]{17})\b").expect("valid regex"));

/// Keep only ASCII digits.
#[must_use]
pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Digit-filter and parse a price string. `"25 500 $"` becomes `25500.0`.
/// Unresolvable text yields `None`; the caller defaults to 0.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let digits = digits_only(text);
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Parse odometer text carrying a distance-unit marker.
///
/// Only text containing `км` or `тис` qualifies; digits are extracted and a
/// `тис` ("thousands") marker multiplies the result by 1000, so
/// `"120 тис. км"` yields `120_000`.
#[must_use]
pub fn parse_odometer(text: &str) -> Option<i64> {
    if !text.contains("км") && !text.contains("тис") {
        return None;
    }
    let digits = digits_only(text);
    if digits.is_empty() {
        return None;
    }
    let mut value: i64 = digits.parse().ok()?;
    if text.contains("тис") {
        value = value.saturating_mul(1000);
    }
    Some(value)
}

/// Normalize a revealed phone number to integer-encoded digits.
///
/// A 10-digit local number gets the country prefix; anything shorter than
/// 10 digits after filtering is treated as unresolved (0).
#[must_use]
pub fn normalize_phone(text: &str, country_prefix: &str) -> i64 {
    let mut digits = digits_only(text);
    if digits.len() == 10 {
        digits = format!("{country_prefix}{digits}");
    }
    if digits.len() < 10 {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// First integer literal anywhere in the text, e.g. photo counters like
/// `"Дивитися всі 47 фотографій"`.
#[must_use]
pub fn first_integer(text: &str) -> Option<i64> {
    FIRST_INTEGER.find(text)?.as_str().parse().ok()
}

/// First whitespace-delimited token, used for plate numbers.
#[must_use]
pub fn first_token(text: &str) -> Option<String> {
    text.split_whitespace().next().map(str::to_string)
}

/// Accept a selector-provided VIN candidate only at exactly 17 characters.
/// No alphabet check here; that is the site's own rendering.
#[must_use]
pub fn vin_from_candidate(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (trimmed.chars().count() == 17).then(|| trimmed.to_string())
}

/// Fallback: scan raw page content for the first token that matches the
/// restricted VIN alphabet.
#[must_use]
pub fn scan_vin(content: &str) -> Option<String> {
    VIN_TOKEN
        .captures(content)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_digit_filtered() {
        assert_eq!(parse_price("25 500 $"), Some(25500.0));
        assert_eq!(parse_price("$7.999"), Some(7999.0));
        assert_eq!(parse_price("договірна"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn odometer_thousands_marker_multiplies() {
        assert_eq!(parse_odometer("120 тис. км"), Some(120_000));
        assert_eq!(parse_odometer("Пробіг 98 тис"), Some(98_000));
        assert_eq!(parse_odometer("145000 км"), Some(145_000));
    }

    #[test]
    fn odometer_requires_a_unit_marker() {
        assert_eq!(parse_odometer("2014 рік"), None);
        assert_eq!(parse_odometer("тис. км"), None);
        assert_eq!(parse_odometer(""), None);
    }

    #[test]
    fn local_phone_gets_country_prefix() {
        assert_eq!(normalize_phone("(067) 123-45-67", "38"), 380_671_234_567);
        // Already prefixed numbers pass through unchanged.
        assert_eq!(normalize_phone("+38 067 123 45 67", "38"), 380_671_234_567);
        assert_eq!(normalize_phone("067 123", "38"), 0);
        assert_eq!(normalize_phone("показати", "38"), 0);
    }

    #[test]
    fn image_count_takes_first_integer() {
        assert_eq!(first_integer("Дивитися всі 47 фотографій"), Some(47));
        assert_eq!(first_integer("без фото"), None);
    }

    #[test]
    fn plate_is_first_token() {
        assert_eq!(first_token("AA 1234 BB"), Some("AA".to_string()));
        assert_eq!(first_token("  АХ1234ВК  "), Some("АХ1234ВК".to_string()));
        assert_eq!(first_token("   "), None);
    }

    #[test]
    fn vin_candidate_accepted_only_at_seventeen_chars() {
        assert_eq!(
            vin_from_candidate("WVWZZZ1KZAW123456"),
            Some("WVWZZZ1KZAW123456".to_string())
        );
        // 16 and 18 character candidates are rejected outright.
        assert_eq!(vin_from_candidate("WVWZZZ1KZAW12345"), None);
        assert_eq!(vin_from_candidate("WVWZZZ1KZAW1234567"), None);
    }

    #[test]
    fn vin_scan_respects_restricted_alphabet() {
        let content = "<span>VIN: WAUZZZ4G1BN123456</span>";
        assert_eq!(scan_vin(content), Some("WAUZZZ4G1BN123456".to_string()));
        // I, O and Q never appear in a VIN; a lookalike token is skipped.
        assert_eq!(scan_vin("IIIIIIIIIIIIIIIII and nothing else"), None);
        assert_eq!(
            scan_vin("bad OOOOO0000OOOO0000 then WAUZZZ4G1BN123456"),
            Some("WAUZZZ4G1BN123456".to_string())
        );
    }
}
