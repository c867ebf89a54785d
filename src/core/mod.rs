mod errors;
mod provider;

pub use errors::{ScrapeError, ScrapeResult};
pub use provider::{Provider, ProviderRegistry, Province};
