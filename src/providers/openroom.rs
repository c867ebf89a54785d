//! OpenRoom (Ontario Landlord and Tenant Board) provider. The document
//! search renders client-side with no load signal and no stable selectors on
//! the profile metadata, so this flow leans on settle pauses and rendered
//! text where the CanLII flow can use plain markup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::page::Page;
use log::{debug, warn};
use scraper::{Html, Selector};
use serde::Deserialize;
use tokio::time::sleep;
use url::Url;

use crate::browser::{dom, wait, BrowserSession};
use crate::config::ServiceConfig;
use crate::core::{Provider, Province, ScrapeError, ScrapeResult};
use crate::images::ImageUploader;
use crate::records::{CaseRecord, OpenRoomRecord};
use crate::stats::StatsTracker;

const PROVIDER_TAG: &str = "OPENROOM";
const OPENROOM_BASE: &str = "https://openroom.ca";
const SEARCH_URL: &str = "https://openroom.ca/documents";
const SEARCH_INPUT: &str = "#search-dropdown";
const PROFILE_LINK: &str = "a.w-full";
const ORDER_IMAGES: &str = "div.mt-2.flex.flex-col.gap-y-2 img";

/// Clicks the "View court order" toggle. The clickable is the styled parent
/// of the span carrying the text and has no selector of its own.
const REVEAL_ORDERS_JS: &str = r#"
(() => {
    const span = Array.from(document.querySelectorAll('span'))
        .find(el => el.textContent.includes('View court order'));
    if (span && span.parentElement) span.parentElement.click();
})()
"#;

/// Reads the labeled metadata blocks. The profile keys values by visible
/// label only, so extraction goes through rendered text: everything after
/// the label up to the next newline, or null when the label is absent.
const EXTRACT_METADATA_JS: &str = r#"
(() => {
    const extract = (label) => {
        const block = Array.from(document.querySelectorAll('div'))
            .find(el => el.innerText.includes(label));
        if (!block) return null;
        const text = block.innerText;
        return text.split(label)[1]?.trim().split('\n')[0] || null;
    };
    return {
        tenant: extract('Tenant'),
        landlord: extract('Landlord'),
        fileNumber: extract('File Number'),
        address: extract('Property Address'),
        topic: extract('Topics'),
        amountOwed: extract('Amount owed'),
    };
})()
"#;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileMetadata {
    tenant: Option<String>,
    landlord: Option<String>,
    file_number: Option<String>,
    address: Option<String>,
    topic: Option<String>,
    amount_owed: Option<String>,
}

pub struct OpenRoomProvider {
    config: Arc<ServiceConfig>,
    uploader: ImageUploader,
    stats: StatsTracker,
}

impl OpenRoomProvider {
    pub fn new(config: Arc<ServiceConfig>, stats: StatsTracker) -> ScrapeResult<Self> {
        let uploader = ImageUploader::new(&config)?;
        Ok(Self {
            config,
            uploader,
            stats,
        })
    }

    async fn run(&self, session: &BrowserSession, name: &str) -> ScrapeResult<Vec<OpenRoomRecord>> {
        let search_url = Url::parse(SEARCH_URL)?;
        let page = session.open(&search_url).await?;
        self.stats.record_page();

        wait::for_selector(&page, SEARCH_INPUT, self.config.step_timeout).await?;
        dom::fill_and_submit(&page, SEARCH_INPUT, name).await?;
        sleep(self.config.search_settle).await;

        let html = page.content().await?;
        let links = extract_profile_links(&html);
        debug!(
            "[{PROVIDER_TAG}] search for '{name}' surfaced {} profiles",
            links.len()
        );

        let mut records = Vec::new();
        for link in links {
            match self.scrape_profile(session, &link).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("[{PROVIDER_TAG}] profile {link} failed: {e}"),
            }
        }
        Ok(records)
    }

    async fn scrape_profile(
        &self,
        session: &BrowserSession,
        link: &str,
    ) -> ScrapeResult<OpenRoomRecord> {
        let url = Url::parse(link)?;
        let page = session.open(&url).await?;
        self.stats.record_page();

        let outcome = self.extract_profile(&page, link).await;
        if let Err(e) = page.close().await {
            debug!("[{PROVIDER_TAG}] profile page close failed: {e}");
        }
        outcome
    }

    async fn extract_profile(&self, page: &Page, link: &str) -> ScrapeResult<OpenRoomRecord> {
        sleep(Duration::from_secs(1)).await;

        page.evaluate(REVEAL_ORDERS_JS).await?;
        sleep(self.config.page_settle).await;

        // The image gallery mounts lazily as it scrolls into view.
        dom::scroll_by(page, 2000).await?;
        sleep(Duration::from_secs(2)).await;

        let metadata: ProfileMetadata = page.evaluate(EXTRACT_METADATA_JS).await?.into_value()?;
        let images = self.collect_order_images(page).await;

        Ok(OpenRoomRecord {
            provider: PROVIDER_TAG.to_string(),
            links: vec![link.to_string()],
            tenant_name: metadata.tenant,
            landlord: metadata.landlord,
            case_id: metadata.file_number,
            address: metadata.address,
            topic: metadata.topic,
            amount_owed: metadata.amount_owed,
            court_order_images: images,
        })
    }

    /// Mirrors every court-order image to the upload host, skipping the ones
    /// that fail. With uploading disabled the raw sources pass through.
    async fn collect_order_images(&self, page: &Page) -> Vec<String> {
        let elements = match page.find_elements(ORDER_IMAGES).await {
            Ok(elements) => elements,
            Err(_) => return Vec::new(),
        };

        let mut images = Vec::new();
        for element in elements {
            let src = match element.attribute("src").await {
                Ok(Some(src)) if !src.is_empty() => src,
                _ => continue,
            };
            if !self.config.upload_enabled {
                images.push(src);
                continue;
            }
            match self.uploader.mirror(&src).await {
                Ok(hosted) => {
                    self.stats.record_upload(true);
                    images.push(hosted);
                }
                Err(e) => {
                    // A failed download never reached the upload endpoint.
                    if !matches!(e, ScrapeError::DownloadError(_)) {
                        self.stats.record_upload(false);
                    }
                    warn!("[{PROVIDER_TAG}] image mirror failed for {src}: {e}");
                }
            }
        }
        images
    }
}

#[async_trait]
impl Provider for OpenRoomProvider {
    fn tag(&self) -> &'static str {
        PROVIDER_TAG
    }

    fn province(&self) -> Province {
        Province::Ontario
    }

    async fn search(&self, name: &str) -> ScrapeResult<Vec<CaseRecord>> {
        let session = BrowserSession::launch(&self.config, &[]).await?;
        let outcome = self.run(&session, name).await;
        if let Err(e) = session.close().await {
            warn!("[{PROVIDER_TAG}] browser teardown failed: {e}");
        }
        Ok(outcome?.into_iter().map(CaseRecord::from).collect())
    }
}

/// Finds result entries pointing at document profiles. `a.w-full` also
/// matches unrelated chrome, so the href filter does the real work.
fn extract_profile_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_sel = Selector::parse(PROFILE_LINK).unwrap();

    let mut links = Vec::new();
    for anchor in document.select(&link_sel) {
        if let Some(href) = anchor.value().attr("href") {
            if href.contains("/documents/profile") {
                let absolute = if href.starts_with("http") {
                    href.to_string()
                } else {
                    format!("{OPENROOM_BASE}{href}")
                };
                links.push(absolute);
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SEARCH_PAGE: &str = r#"
        <html><body>
        <a class="w-full" href="/documents/profile/abc-123">Jane Roe</a>
        <a class="w-full" href="https://openroom.ca/documents/profile/def-456">Jane Roe</a>
        <a class="w-full" href="/about">About us</a>
        <a href="/documents/profile/not-w-full">Skipped</a>
        </body></html>
    "#;

    #[test]
    fn test_extracts_profile_links_and_absolutizes() {
        let links = extract_profile_links(SEARCH_PAGE);
        assert_eq!(
            links,
            vec![
                "https://openroom.ca/documents/profile/abc-123".to_string(),
                "https://openroom.ca/documents/profile/def-456".to_string(),
            ]
        );
    }

    #[test]
    fn test_ignores_pages_without_profiles() {
        assert!(extract_profile_links("<html><body><a class='w-full' href='/faq'>FAQ</a></body></html>").is_empty());
    }

    #[test]
    fn test_metadata_deserializes_from_page_shape() {
        let metadata: ProfileMetadata = serde_json::from_value(json!({
            "tenant": "Jane Roe",
            "landlord": null,
            "fileNumber": "TSL-12345-21",
            "address": "1 Main St, Toronto",
            "topic": "Arrears",
            "amountOwed": "$4,200.00"
        }))
        .unwrap();

        assert_eq!(metadata.tenant.as_deref(), Some("Jane Roe"));
        assert_eq!(metadata.landlord, None);
        assert_eq!(metadata.file_number.as_deref(), Some("TSL-12345-21"));
        assert_eq!(metadata.amount_owed.as_deref(), Some("$4,200.00"));
    }
}
