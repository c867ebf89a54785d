use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use log::{debug, warn};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use url::Url;

use crate::config::ServiceConfig;
use crate::core::{ScrapeError, ScrapeResult};

/// One headless Chrome process plus the task pumping its CDP event stream.
/// Sessions are per scrape job: launched at the start, torn down at the end,
/// never shared between requests.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    nav_timeout: Duration,
}

impl BrowserSession {
    /// Launches headless Chrome. `extra_args` carries provider-specific
    /// Chrome flags on top of the service-wide sandbox setting.
    pub async fn launch(config: &ServiceConfig, extra_args: &[&str]) -> ScrapeResult<Self> {
        let mut builder = BrowserConfig::builder().window_size(1280, 1024);
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        for arg in extra_args {
            builder = builder.arg(*arg);
        }
        let browser_config = builder.build().map_err(ScrapeError::LaunchError)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        debug!("launched headless chrome");

        Ok(Self {
            browser,
            handler_task,
            nav_timeout: config.nav_timeout,
        })
    }

    /// Opens `url` in a new tab and waits for the navigation to finish.
    pub async fn open(&self, url: &Url) -> ScrapeResult<Page> {
        let page = self.browser.new_page(url.as_str()).await?;
        self.await_load(&page, url).await?;
        Ok(page)
    }

    async fn await_load(&self, page: &Page, url: &Url) -> ScrapeResult<()> {
        match timeout(self.nav_timeout, page.wait_for_navigation()).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(ScrapeError::Timeout {
                waiting_for: format!("navigation to {url}"),
                timeout: self.nav_timeout,
            }),
        }
    }

    /// Closes every tab and waits for the Chrome process to exit.
    pub async fn close(mut self) -> ScrapeResult<()> {
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}
