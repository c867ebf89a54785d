use std::sync::Arc;

use casetrawl::providers::default_registry;
use casetrawl::{ApiServer, ScrapeResult, ServiceConfig, StatsTracker};
use log::info;

#[tokio::main]
async fn main() -> ScrapeResult<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("selectors", log::LevelFilter::Warn)
        .filter_module("html5ever", log::LevelFilter::Error)
        .init();

    let config = Arc::new(ServiceConfig::from_env());
    let stats = StatsTracker::new();
    let registry = Arc::new(default_registry(config.clone(), stats.clone())?);
    info!("registered {} providers", registry.len());

    ApiServer::new(config, registry, stats).serve().await
}
