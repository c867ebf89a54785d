use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::ScrapeResult;
use crate::records::CaseRecord;

/// Jurisdictions the service can search. Each maps to exactly one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Province {
    Ontario,
    Quebec,
    Alberta,
    BritishColumbia,
}

impl Province {
    /// Parses the values the `province` query parameter accepts.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ontario" => Some(Province::Ontario),
            "quebec" => Some(Province::Quebec),
            "alberta" => Some(Province::Alberta),
            "bc" => Some(Province::BritishColumbia),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Province::Ontario => "Ontario",
            Province::Quebec => "Quebec",
            Province::Alberta => "Alberta",
            Province::BritishColumbia => "British Columbia",
        }
    }
}

/// One search backend. Implementations own their selectors and URLs and run a
/// complete browser session per call.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider tag stamped on every record, e.g. `OPENROOM`.
    fn tag(&self) -> &'static str;

    fn province(&self) -> Province;

    /// Runs the full search flow for `name` in a fresh browser and returns
    /// whatever records survived extraction.
    async fn search(&self, name: &str) -> ScrapeResult<Vec<CaseRecord>>;
}

/// Province-keyed lookup of the registered providers.
pub struct ProviderRegistry {
    providers: HashMap<Province, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.insert(provider.province(), provider);
        self
    }

    pub fn get(&self, province: Province) -> Option<Arc<dyn Provider>> {
        self.providers.get(&province).cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
