//! Fallible element helpers over chromiumoxide pages.
//!
//! Selector misses and CDP hiccups both collapse to `None`; per-field
//! defaults are decided by the extraction pipeline, never here.

use chromiumoxide::Page;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::trace;

/// Trimmed inner text of the first element matching `selector`, or `None`
/// when the element is absent, empty, or the query fails.
pub async fn safe_text(page: &Page, selector: &str) -> Option<String> {
    let element = match page.find_element(selector).await {
        Ok(element) => element,
        Err(e) => {
            trace!("selector {selector:?} not found: {e}");
            return None;
        }
    };
    let text = element.inner_text().await.ok().flatten()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Attribute value of the first element matching `selector`.
pub async fn safe_attribute(page: &Page, selector: &str, attribute: &str) -> Option<String> {
    let element = page.find_element(selector).await.ok()?;
    let value = element.attribute(attribute).await.ok().flatten()?;
    (!value.is_empty()).then_some(value)
}

/// Inner text of the first element under `selector` whose text satisfies
/// `predicate`. Used for fields that share a selector with unrelated rows.
pub async fn first_text_matching<F>(page: &Page, selector: &str, predicate: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let elements = page.find_elements(selector).await.ok()?;
    for element in elements {
        if let Ok(Some(text)) = element.inner_text().await {
            let trimmed = text.trim();
            if !trimmed.is_empty() && predicate(trimmed) {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Collect an attribute from every element matching `selector`.
pub async fn collect_attribute(page: &Page, selector: &str, attribute: &str) -> Vec<String> {
    let Ok(elements) = page.find_elements(selector).await else {
        return Vec::new();
    };
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        if let Ok(Some(value)) = element.attribute(attribute).await
            && !value.is_empty()
        {
            values.push(value);
        }
    }
    values
}

/// Poll for an element until it appears or the timeout elapses.
///
/// `wait_for_navigation` resolves when the response arrives, but parts of
/// the listing page render afterwards via JavaScript; extraction polls the
/// DOM rather than trusting the load event. Timeout is a normal "not there"
/// outcome, not an error.
pub async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> bool {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(200);
    loop {
        if page.find_element(selector).await.is_ok() {
            return true;
        }
        if start.elapsed() >= timeout {
            trace!("timed out waiting for {selector:?}");
            return false;
        }
        sleep(poll_interval).await;
    }
}
