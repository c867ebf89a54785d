pub mod browser;
pub mod config;
pub mod core;
pub mod images;
pub mod providers;
pub mod records;
pub mod server;
pub mod stats;

pub use config::ServiceConfig;
pub use core::{Provider, ProviderRegistry, Province, ScrapeError, ScrapeResult};
pub use records::{CanliiRecord, CaseRecord, OpenRoomRecord};
pub use server::ApiServer;
pub use stats::StatsTracker;
