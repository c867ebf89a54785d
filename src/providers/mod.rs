mod canlii;
mod openroom;

pub use canlii::CanliiProvider;
pub use openroom::OpenRoomProvider;

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::core::{ProviderRegistry, ScrapeResult};
use crate::stats::StatsTracker;

/// Builds the registry with all four jurisdictions wired in.
pub fn default_registry(
    config: Arc<ServiceConfig>,
    stats: StatsTracker,
) -> ScrapeResult<ProviderRegistry> {
    Ok(ProviderRegistry::new()
        .register(Arc::new(OpenRoomProvider::new(
            config.clone(),
            stats.clone(),
        )?))
        .register(Arc::new(CanliiProvider::quebec(
            config.clone(),
            stats.clone(),
        )))
        .register(Arc::new(CanliiProvider::alberta(
            config.clone(),
            stats.clone(),
        )))
        .register(Arc::new(CanliiProvider::british_columbia(config, stats))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Province;

    #[test]
    fn test_registry_covers_all_provinces() {
        let config = Arc::new(ServiceConfig::default());
        let registry = default_registry(config, StatsTracker::new()).unwrap();

        assert_eq!(registry.len(), 4);
        for province in [
            Province::Ontario,
            Province::Quebec,
            Province::Alberta,
            Province::BritishColumbia,
        ] {
            let provider = registry.get(province).unwrap();
            assert_eq!(provider.province(), province);
        }
    }

    #[test]
    fn test_tags_match_wire_values() {
        let config = Arc::new(ServiceConfig::default());
        let registry = default_registry(config, StatsTracker::new()).unwrap();

        assert_eq!(registry.get(Province::Ontario).unwrap().tag(), "OPENROOM");
        assert_eq!(
            registry.get(Province::Quebec).unwrap().tag(),
            "CANLII-QUEBEC"
        );
        assert_eq!(
            registry.get(Province::Alberta).unwrap().tag(),
            "CANLII-ALBERTA"
        );
        assert_eq!(
            registry.get(Province::BritishColumbia).unwrap().tag(),
            "CANLII-BC"
        );
    }
}
