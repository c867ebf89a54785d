//! Poll-based waits. CDP has no built-in "wait for selector", so these loop
//! on `find_element` against a deadline, the same strategy a scripted
//! `wait_for_selector` uses under the hood.

use std::time::{Duration, Instant};

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use tokio::time::sleep;

use crate::core::{ScrapeError, ScrapeResult};

pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Polls until `selector` resolves to an element, or fails with a timeout.
pub async fn for_selector(page: &Page, selector: &str, timeout: Duration) -> ScrapeResult<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::Timeout {
                waiting_for: format!("selector {selector}"),
                timeout,
            });
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Polls until `selector` no longer resolves, or fails with a timeout. Used
/// for overlays that must disappear before the page behind them is usable.
pub async fn until_gone(page: &Page, selector: &str, timeout: Duration) -> ScrapeResult<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if page.find_element(selector).await.is_err() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::Timeout {
                waiting_for: format!("removal of {selector}"),
                timeout,
            });
        }
        sleep(POLL_INTERVAL).await;
    }
}
