//! HTTP front end. One request per connection, request-line routing, JSON
//! bodies, allow-all CORS. Scrape routes block on the full browser flow, so
//! every connection runs on its own task.

pub(crate) mod request;
pub(crate) mod response;

pub use request::HttpRequest;

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::core::{ProviderRegistry, Province};
use crate::stats::StatsTracker;

pub struct ApiServer {
    config: Arc<ServiceConfig>,
    registry: Arc<ProviderRegistry>,
    stats: StatsTracker,
}

impl ApiServer {
    pub fn new(
        config: Arc<ServiceConfig>,
        registry: Arc<ProviderRegistry>,
        stats: StatsTracker,
    ) -> Self {
        Self {
            config,
            registry,
            stats,
        }
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn serve(self) -> crate::core::ScrapeResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("listening on http://{}", listener.local_addr()?);
        self.run(listener).await
    }

    /// Accept loop over an already-bound listener.
    pub async fn run(self, listener: TcpListener) -> crate::core::ScrapeResult<()> {
        let server = Arc::new(self);
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!("connection from {peer}");
                            let server = server.clone();
                            tokio::spawn(async move { server.handle(stream).await });
                        }
                        Err(e) => error!("accept failed: {e}"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down");
                    server.stats.log_summary();
                    break;
                }
            }
        }
        Ok(())
    }

    async fn handle(&self, stream: TcpStream) {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        let request_line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => return,
        };
        // Drain the headers so the peer gets a clean close.
        while let Ok(Some(line)) = lines.next_line().await {
            if line.is_empty() {
                break;
            }
        }

        let request = match HttpRequest::parse(&request_line) {
            Some(request) => request,
            None => {
                let body = json!({"error": "Malformed request line"});
                let _ = response::write_json(&mut writer, 400, &body).await;
                return;
            }
        };

        if request.method == "OPTIONS" {
            let _ = response::write_preflight(&mut writer).await;
            return;
        }

        let (status, body) = self.dispatch(&request).await;
        if let Err(e) = response::write_json(&mut writer, status, &body).await {
            debug!("response write failed: {e}");
        }
    }

    async fn dispatch(&self, request: &HttpRequest) -> (u16, Value) {
        if request.method != "GET" {
            return (
                405,
                json!({"error": format!("{} is not supported here", request.method)}),
            );
        }

        match request.path.as_str() {
            "/" => (200, welcome_body()),
            "/stats" => {
                let snapshot = self.stats.snapshot();
                let body = serde_json::to_value(snapshot).unwrap_or_else(|_| json!({}));
                (200, body)
            }
            "/scrape" => self.scrape_route(request, Province::Ontario, false).await,
            "/scrape-quebec" => self.scrape_route(request, Province::Quebec, false).await,
            "/scrape-alberta" => self.scrape_route(request, Province::Alberta, false).await,
            "/scrape-bc" => {
                self.scrape_route(request, Province::BritishColumbia, false)
                    .await
            }
            "/scrape-all" => {
                let province = match request.param("province") {
                    Some(value) => match Province::parse(value) {
                        Some(province) => province,
                        None => {
                            return (
                                400,
                                json!({"error": format!("Unknown province '{value}'")}),
                            )
                        }
                    },
                    None => Province::Ontario,
                };
                self.scrape_route(request, province, true).await
            }
            _ => (404, json!({"error": "No such route"})),
        }
    }

    /// Runs one scrape job end to end and shapes the success/error body
    /// for the route.
    async fn scrape_route(
        &self,
        request: &HttpRequest,
        province: Province,
        combined: bool,
    ) -> (u16, Value) {
        let name = match request.param("name") {
            Some(name) => name.to_string(),
            None => {
                return (400, json!({"error": "Query parameter 'name' is required"}));
            }
        };

        let provider = match self.registry.get(province) {
            Some(provider) => provider,
            None => {
                return (
                    404,
                    json!({"error": format!("No provider registered for {}", province.label())}),
                );
            }
        };

        let job = Uuid::now_v7();
        let started = Instant::now();
        info!("[{job}] {} search for '{name}'", provider.tag());

        match provider.search(&name).await {
            Ok(records) => {
                let elapsed = started.elapsed();
                self.stats
                    .record_job(provider.tag(), records.len(), elapsed, true);
                info!(
                    "[{job}] {} returned {} records in {:.1}s",
                    provider.tag(),
                    records.len(),
                    elapsed.as_secs_f64()
                );
                (200, json!({"results": records}))
            }
            Err(e) => {
                let elapsed = started.elapsed();
                self.stats.record_job(provider.tag(), 0, elapsed, false);
                error!(
                    "[{job}] {} failed after {:.1}s: {e}",
                    provider.tag(),
                    elapsed.as_secs_f64()
                );
                let message = if combined {
                    format!("Failed to scrape data for {}", province.label())
                } else {
                    format!("Failed to scrape {} data", province.label())
                };
                (500, json!({"error": message, "details": e.to_string()}))
            }
        }
    }
}

fn welcome_body() -> Value {
    json!({
        "message": "Welcome to the casetrawl API. Use /scrape, /scrape-all, or a province-specific route to get started.",
        "endpoints": [
            "/scrape?name=",
            "/scrape-all?name=&province=",
            "/scrape-quebec?name=",
            "/scrape-alberta?name=",
            "/scrape-bc?name=",
            "/stats",
        ],
    })
}
