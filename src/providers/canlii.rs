//! CanLII search flow, shared by the Quebec, Alberta and British Columbia
//! providers. The three portals render the same result markup; they differ
//! only in entry URL, pagination and how a result timeout is treated.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::page::Page;
use log::{debug, info, warn};
use regex::Regex;
use scraper::{Html, Selector};
use tokio::time::sleep;
use url::Url;

use crate::browser::{dom, wait, BrowserSession};
use crate::config::ServiceConfig;
use crate::core::{Provider, Province, ScrapeError, ScrapeResult};
use crate::records::{CanliiRecord, CaseRecord};
use crate::stats::StatsTracker;

const CANLII_BASE: &str = "https://www.canlii.org";
const COOKIE_CONTAINER: &str = "#cookieConsentContainer";
const COOKIE_ACCEPT: &str = "#cookieConsentContainer button.btn";
const SEARCH_INPUT: &str = "#idInput";
const RESULT_ITEM: &str = "li.result";
const DECISION_FACET: &str = "#typeFacetItem-decision a";
const NEXT_PAGE: &str = "a.next";
const FULL_TEXT: &str = "#originalDocument";

/// Portal-specific behavior. BC's result list sometimes never renders for
/// obscure names, so it treats the wait timeout as an empty result set; the
/// other two surface it.
struct CanliiPortal {
    province: Province,
    tag: &'static str,
    portal_url: &'static str,
    paginate: bool,
    empty_on_timeout: bool,
    extra_args: &'static [&'static str],
}

pub struct CanliiProvider {
    portal: CanliiPortal,
    config: Arc<ServiceConfig>,
    stats: StatsTracker,
}

impl CanliiProvider {
    pub fn quebec(config: Arc<ServiceConfig>, stats: StatsTracker) -> Self {
        Self {
            portal: CanliiPortal {
                province: Province::Quebec,
                tag: "CANLII-QUEBEC",
                portal_url: "https://www.canlii.org/qc",
                paginate: false,
                empty_on_timeout: false,
                extra_args: &[],
            },
            config,
            stats,
        }
    }

    pub fn alberta(config: Arc<ServiceConfig>, stats: StatsTracker) -> Self {
        Self {
            portal: CanliiPortal {
                province: Province::Alberta,
                tag: "CANLII-ALBERTA",
                portal_url: "https://www.canlii.org/en/ab/",
                paginate: true,
                empty_on_timeout: false,
                extra_args: &[],
            },
            config,
            stats,
        }
    }

    pub fn british_columbia(config: Arc<ServiceConfig>, stats: StatsTracker) -> Self {
        Self {
            portal: CanliiPortal {
                province: Province::BritishColumbia,
                tag: "CANLII-BC",
                portal_url: "https://www.canlii.org/en/bc/",
                paginate: true,
                empty_on_timeout: true,
                extra_args: &["--no-sandbox", "--disable-dev-shm-usage"],
            },
            config,
            stats,
        }
    }

    async fn run(&self, session: &BrowserSession, name: &str) -> ScrapeResult<Vec<CanliiRecord>> {
        let portal_url = Url::parse(self.portal.portal_url)?;
        let page = session.open(&portal_url).await?;
        self.stats.record_page();

        self.dismiss_cookie_banner(&page).await;

        wait::for_selector(&page, SEARCH_INPUT, self.config.step_timeout).await?;
        dom::fill_and_submit(&page, SEARCH_INPUT, name).await?;

        if let Err(e) = wait::for_selector(&page, RESULT_ITEM, self.config.step_timeout).await {
            let html = page.content().await.unwrap_or_default();
            return match resolve_result_wait(e, &html, self.portal.empty_on_timeout) {
                Ok(empty) => {
                    info!(
                        "[{}] no results rendered for '{name}', returning empty set",
                        self.portal.tag
                    );
                    Ok(empty)
                }
                Err(e) => Err(e),
            };
        }

        self.click_decisions_facet(&page).await;

        let mut records = Vec::new();
        let mut pages_followed = 0;
        loop {
            wait::for_selector(&page, RESULT_ITEM, self.config.step_timeout).await?;
            let html = page.content().await?;
            let summaries = parse_result_summaries(&html, self.portal.tag);
            debug!(
                "[{}] result page {} carried {} summaries",
                self.portal.tag,
                pages_followed + 1,
                summaries.len()
            );

            for mut record in summaries {
                if let Some(case_url) = record.case_url.clone() {
                    match self.fetch_full_text(session, &case_url).await {
                        Ok(text) => record.full_text_snippet = Some(text),
                        Err(e) => warn!(
                            "[{}] full text unavailable for {case_url}: {e}",
                            self.portal.tag
                        ),
                    }
                }
                records.push(record);
            }

            pages_followed += 1;
            if !wants_next_page(
                self.portal.paginate,
                pages_followed,
                self.config.max_result_pages,
            ) {
                break;
            }
            if !self.advance_page(&page).await {
                break;
            }
        }

        Ok(records)
    }

    /// The consent overlay intercepts every click underneath it, so it has
    /// to go first. Absence or failure is not fatal.
    async fn dismiss_cookie_banner(&self, page: &Page) {
        if page.find_element(COOKIE_CONTAINER).await.is_err() {
            return;
        }
        let accepted: ScrapeResult<()> = async {
            page.find_element(COOKIE_ACCEPT).await?.click().await?;
            wait::until_gone(page, COOKIE_CONTAINER, Duration::from_secs(5)).await
        }
        .await;
        match accepted {
            Ok(()) => debug!("[{}] cookie consent accepted", self.portal.tag),
            Err(e) => warn!("[{}] cookie consent not dismissed: {e}", self.portal.tag),
        }
    }

    /// Narrows the mixed result list to decisions. The facet intermittently
    /// swallows synthetic clicks, hence the JS fallback; either way the flow
    /// continues with whatever list is showing.
    async fn click_decisions_facet(&self, page: &Page) {
        let clicked: ScrapeResult<()> = async {
            wait::for_selector(page, DECISION_FACET, Duration::from_secs(5))
                .await?
                .click()
                .await?;
            Ok(())
        }
        .await;
        if let Err(e) = clicked {
            warn!(
                "[{}] facet click failed ({e}), retrying via JS",
                self.portal.tag
            );
            if let Err(e) = dom::js_click(page, DECISION_FACET).await {
                warn!("[{}] JS facet click failed too: {e}", self.portal.tag);
            }
        }
        sleep(self.config.facet_settle).await;
    }

    async fn fetch_full_text(
        &self,
        session: &BrowserSession,
        case_url: &str,
    ) -> ScrapeResult<String> {
        let url = Url::parse(case_url)?;
        let page = session.open(&url).await?;
        self.stats.record_page();

        let text: ScrapeResult<String> = async {
            let element =
                wait::for_selector(&page, FULL_TEXT, self.config.full_text_timeout).await?;
            element.inner_text().await?.ok_or_else(|| {
                ScrapeError::ExtractionError(format!("{FULL_TEXT} rendered empty on {case_url}"))
            })
        }
        .await;

        if let Err(e) = page.close().await {
            debug!("[{}] case page close failed: {e}", self.portal.tag);
        }
        text
    }

    /// Follows `a.next` when present. False means the last page was reached
    /// or the click failed; either ends the loop.
    async fn advance_page(&self, page: &Page) -> bool {
        let next = match page.find_element(NEXT_PAGE).await {
            Ok(element) => element,
            Err(_) => return false,
        };
        if let Err(e) = next.click().await {
            warn!("[{}] pagination click failed: {e}", self.portal.tag);
            return false;
        }
        sleep(self.config.page_settle).await;
        true
    }
}

#[async_trait]
impl Provider for CanliiProvider {
    fn tag(&self) -> &'static str {
        self.portal.tag
    }

    fn province(&self) -> Province {
        self.portal.province
    }

    async fn search(&self, name: &str) -> ScrapeResult<Vec<CaseRecord>> {
        let session = BrowserSession::launch(&self.config, self.portal.extra_args).await?;
        let outcome = self.run(&session, name).await;
        if let Err(e) = session.close().await {
            warn!("[{}] browser teardown failed: {e}", self.portal.tag);
        }
        Ok(outcome?.into_iter().map(CaseRecord::from).collect())
    }
}

/// Pulls the per-case summaries out of a rendered result page. Every field
/// is optional; a sparse `li.result` still yields a record.
fn parse_result_summaries(html: &str, tag: &str) -> Vec<CanliiRecord> {
    let document = Html::parse_document(html);
    let result_sel = Selector::parse(RESULT_ITEM).unwrap();
    let name_sel = Selector::parse(".name a").unwrap();
    let citation_sel = Selector::parse(".reference").unwrap();
    let context_sel = Selector::parse(".context").unwrap();
    let keywords_sel = Selector::parse(".keywords").unwrap();

    let mut records = Vec::new();
    for result in document.select(&result_sel) {
        let name_anchor = result.select(&name_sel).next();
        let case_name = name_anchor.map(flat_text);
        let case_url = name_anchor
            .and_then(|a| a.value().attr("href"))
            .map(|href| {
                if href.starts_with("http") {
                    href.to_string()
                } else {
                    format!("{CANLII_BASE}{href}")
                }
            });

        let mut contexts = result.select(&context_sel);
        let tribunal = contexts.next().map(flat_text);
        let date = contexts.next().map(flat_text);

        records.push(CanliiRecord {
            provider: tag.to_string(),
            case_name,
            citation: result.select(&citation_sel).next().map(flat_text),
            tribunal,
            date,
            keywords: result.select(&keywords_sel).next().map(flat_text),
            case_url,
            full_text_snippet: None,
        });
    }
    records
}

/// Text content with whitespace runs collapsed, close to what innerText
/// renders. The summary markup splits fields over nested, indented nodes.
fn flat_text(element: scraper::ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Markers CanLII's edge serves when it rate-limits a client. A timeout on a
/// page carrying one of these is a block, not an empty result list.
fn looks_blocked(html: &str) -> Option<String> {
    Regex::new(r"(?i)captcha|too many requests|rate limit|unusual traffic")
        .ok()
        .and_then(|re| re.find(html).map(|m| m.as_str().to_string()))
}

/// Decides what a failed result-list wait means for a portal. A block marker
/// in the served page is reported over the bare timeout. Portals flagged
/// `empty_on_timeout` map a plain timeout to no results; any other failure
/// propagates.
fn resolve_result_wait(
    error: ScrapeError,
    html: &str,
    empty_on_timeout: bool,
) -> ScrapeResult<Vec<CanliiRecord>> {
    if error.is_timeout() {
        if let Some(marker) = looks_blocked(html) {
            return Err(ScrapeError::Blocked(format!(
                "result page carried '{marker}'"
            )));
        }
        if empty_on_timeout {
            return Ok(Vec::new());
        }
    }
    Err(error)
}

/// True while the portal paginates and the page cap still has room.
fn wants_next_page(paginate: bool, pages_followed: usize, cap: usize) -> bool {
    paginate && pages_followed < cap
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT_PAGE: &str = r#"
        <html><body>
        <ul>
        <li class="result">
            <div class="name"><a href="/fr/qc/qctal/doc/2023/2023qctal12345/2023qctal12345.html">Doe c. Roe</a></div>
            <div class="reference">2023 QCTAL 12345</div>
            <div class="context">Tribunal administratif du logement</div>
            <div class="context">2023-04-18</div>
            <div class="keywords">arrears — non-payment</div>
        </li>
        <li class="result">
            <div class="name"><a href="https://www.canlii.org/en/ab/abrtdrs/doc/2024/x/x.html">Re Smith</a></div>
            <div class="reference">2024 ABRTDRS 77</div>
        </li>
        <li class="result">
            <div class="name">Unlinked entry</div>
        </li>
        </ul>
        </body></html>
    "#;

    #[test]
    fn test_parses_complete_summary() {
        let records = parse_result_summaries(RESULT_PAGE, "CANLII-QUEBEC");
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.provider, "CANLII-QUEBEC");
        assert_eq!(first.case_name.as_deref(), Some("Doe c. Roe"));
        assert_eq!(
            first.case_url.as_deref(),
            Some("https://www.canlii.org/fr/qc/qctal/doc/2023/2023qctal12345/2023qctal12345.html")
        );
        assert_eq!(first.citation.as_deref(), Some("2023 QCTAL 12345"));
        assert_eq!(
            first.tribunal.as_deref(),
            Some("Tribunal administratif du logement")
        );
        assert_eq!(first.date.as_deref(), Some("2023-04-18"));
        assert_eq!(first.keywords.as_deref(), Some("arrears — non-payment"));
        assert_eq!(first.full_text_snippet, None);
    }

    #[test]
    fn test_keeps_absolute_hrefs_untouched() {
        let records = parse_result_summaries(RESULT_PAGE, "CANLII-ALBERTA");
        assert_eq!(
            records[1].case_url.as_deref(),
            Some("https://www.canlii.org/en/ab/abrtdrs/doc/2024/x/x.html")
        );
    }

    #[test]
    fn test_sparse_result_yields_nulls() {
        let records = parse_result_summaries(RESULT_PAGE, "CANLII-BC");
        let sparse = &records[2];
        assert_eq!(sparse.case_name, None);
        assert_eq!(sparse.case_url, None);
        assert_eq!(sparse.citation, None);
        assert_eq!(sparse.tribunal, None);
        assert_eq!(sparse.date, None);
        assert_eq!(sparse.keywords, None);
    }

    #[test]
    fn test_empty_page_yields_no_records() {
        assert!(parse_result_summaries("<html><body></body></html>", "CANLII-BC").is_empty());
    }

    #[test]
    fn test_flattens_multiline_markup() {
        let html = r#"
            <li class="result">
                <div class="name"><a href="/x">
                    Doe
                    c. Roe
                </a></div>
            </li>"#;
        let records = parse_result_summaries(html, "CANLII-QUEBEC");
        assert_eq!(records[0].case_name.as_deref(), Some("Doe c. Roe"));
        assert_eq!(
            records[0].case_url.as_deref(),
            Some("https://www.canlii.org/x")
        );
    }

    #[test]
    fn test_detects_block_interstitials() {
        assert_eq!(
            looks_blocked("<h1>Too Many Requests</h1>").as_deref(),
            Some("Too Many Requests")
        );
        assert!(looks_blocked("<p>Please solve this CAPTCHA</p>").is_some());
        assert!(looks_blocked("<ul><li class='result'>ok</li></ul>").is_none());
    }

    fn wait_timeout() -> ScrapeError {
        ScrapeError::Timeout {
            waiting_for: RESULT_ITEM.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    #[test]
    fn test_portal_table_per_province() {
        let config = Arc::new(ServiceConfig::default());

        let quebec = CanliiProvider::quebec(config.clone(), StatsTracker::new());
        assert_eq!(quebec.portal.province, Province::Quebec);
        assert_eq!(quebec.portal.tag, "CANLII-QUEBEC");
        assert_eq!(quebec.portal.portal_url, "https://www.canlii.org/qc");
        assert!(!quebec.portal.paginate);
        assert!(!quebec.portal.empty_on_timeout);
        assert!(quebec.portal.extra_args.is_empty());

        let alberta = CanliiProvider::alberta(config.clone(), StatsTracker::new());
        assert_eq!(alberta.portal.province, Province::Alberta);
        assert_eq!(alberta.portal.tag, "CANLII-ALBERTA");
        assert_eq!(alberta.portal.portal_url, "https://www.canlii.org/en/ab/");
        assert!(alberta.portal.paginate);
        assert!(!alberta.portal.empty_on_timeout);
        assert!(alberta.portal.extra_args.is_empty());

        let bc = CanliiProvider::british_columbia(config, StatsTracker::new());
        assert_eq!(bc.portal.province, Province::BritishColumbia);
        assert_eq!(bc.portal.tag, "CANLII-BC");
        assert_eq!(bc.portal.portal_url, "https://www.canlii.org/en/bc/");
        assert!(bc.portal.paginate);
        assert!(bc.portal.empty_on_timeout);
        assert_eq!(
            bc.portal.extra_args,
            &["--no-sandbox", "--disable-dev-shm-usage"]
        );
    }

    #[test]
    fn test_result_timeout_propagates_for_quebec_and_alberta() {
        let config = Arc::new(ServiceConfig::default());
        let quiet_page = "<html><body><p>Nothing yet</p></body></html>";

        for provider in [
            CanliiProvider::quebec(config.clone(), StatsTracker::new()),
            CanliiProvider::alberta(config.clone(), StatsTracker::new()),
        ] {
            let outcome =
                resolve_result_wait(wait_timeout(), quiet_page, provider.portal.empty_on_timeout);
            assert!(matches!(outcome, Err(ScrapeError::Timeout { .. })));
        }
    }

    #[test]
    fn test_result_timeout_yields_empty_set_for_bc() {
        let config = Arc::new(ServiceConfig::default());
        let bc = CanliiProvider::british_columbia(config, StatsTracker::new());
        let quiet_page = "<html><body><p>Nothing yet</p></body></html>";

        let outcome = resolve_result_wait(wait_timeout(), quiet_page, bc.portal.empty_on_timeout);
        assert!(outcome.unwrap().is_empty());
    }

    #[test]
    fn test_blocked_page_beats_empty_timeout_mapping() {
        let outcome = resolve_result_wait(wait_timeout(), "<h1>Too Many Requests</h1>", true);
        assert!(matches!(outcome, Err(ScrapeError::Blocked(_))));
    }

    #[test]
    fn test_non_timeout_failures_propagate_for_every_portal() {
        let outcome = resolve_result_wait(
            ScrapeError::ExtractionError("tab crashed".to_string()),
            "",
            true,
        );
        assert!(matches!(outcome, Err(ScrapeError::ExtractionError(_))));
    }

    #[test]
    fn test_pagination_respects_portal_and_page_cap() {
        let config = Arc::new(ServiceConfig::default());
        let quebec = CanliiProvider::quebec(config.clone(), StatsTracker::new());
        let alberta = CanliiProvider::alberta(config.clone(), StatsTracker::new());

        assert!(!wants_next_page(
            quebec.portal.paginate,
            1,
            config.max_result_pages
        ));

        assert!(wants_next_page(
            alberta.portal.paginate,
            1,
            config.max_result_pages
        ));
        assert!(wants_next_page(alberta.portal.paginate, 19, 20));
        assert!(!wants_next_page(alberta.portal.paginate, 20, 20));
    }
}
