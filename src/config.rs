use std::env;
use std::time::Duration;

/// Runtime configuration, read once at startup. Every knob can be overridden
/// with a `CASETRAWL_*` environment variable; a `.env` file is honored when
/// present. Defaults reproduce the timings the target sites are known to
/// tolerate.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listen address for the HTTP API.
    pub bind_addr: String,
    /// Cap on a single page navigation.
    pub nav_timeout: Duration,
    /// Default cap when waiting for a selector to appear.
    pub step_timeout: Duration,
    /// Cap when waiting for a decision's full-text container.
    pub full_text_timeout: Duration,
    /// Pause after submitting the OpenRoom search, which renders results
    /// without any reliable load signal.
    pub search_settle: Duration,
    /// Pause after clicking the CanLII Decisions facet.
    pub facet_settle: Duration,
    /// Pause after pagination clicks and the court-order reveal.
    pub page_settle: Duration,
    /// Upper bound on CanLII result pages followed per search.
    pub max_result_pages: usize,
    /// Unsigned-upload endpoint for court-order images.
    pub upload_url: String,
    pub upload_preset: String,
    /// When false, records carry the raw image source URLs instead of
    /// hosted copies.
    pub upload_enabled: bool,
    pub upload_timeout: Duration,
    /// Passes --no-sandbox to every Chrome launch (required in most
    /// containers).
    pub no_sandbox: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            nav_timeout: Duration::from_secs(30),
            step_timeout: Duration::from_secs(15),
            full_text_timeout: Duration::from_secs(20),
            search_settle: Duration::from_secs(5),
            facet_settle: Duration::from_secs(2),
            page_settle: Duration::from_secs(3),
            max_result_pages: 20,
            upload_url: "https://api.cloudinary.com/v1_1/dwvhna4j2/image/upload".to_string(),
            upload_preset: "unsigned_auto".to_string(),
            upload_enabled: true,
            upload_timeout: Duration::from_secs(20),
            no_sandbox: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            bind_addr: env_or("CASETRAWL_BIND", &defaults.bind_addr),
            nav_timeout: env_secs("CASETRAWL_NAV_TIMEOUT_SECS", defaults.nav_timeout),
            step_timeout: env_secs("CASETRAWL_STEP_TIMEOUT_SECS", defaults.step_timeout),
            full_text_timeout: env_secs(
                "CASETRAWL_FULL_TEXT_TIMEOUT_SECS",
                defaults.full_text_timeout,
            ),
            search_settle: env_secs("CASETRAWL_SEARCH_SETTLE_SECS", defaults.search_settle),
            facet_settle: env_secs("CASETRAWL_FACET_SETTLE_SECS", defaults.facet_settle),
            page_settle: env_secs("CASETRAWL_PAGE_SETTLE_SECS", defaults.page_settle),
            max_result_pages: env_usize("CASETRAWL_MAX_RESULT_PAGES", defaults.max_result_pages),
            upload_url: env_or("CASETRAWL_UPLOAD_URL", &defaults.upload_url),
            upload_preset: env_or("CASETRAWL_UPLOAD_PRESET", &defaults.upload_preset),
            upload_enabled: env_bool("CASETRAWL_UPLOAD_ENABLED", defaults.upload_enabled),
            upload_timeout: env_secs("CASETRAWL_UPLOAD_TIMEOUT_SECS", defaults.upload_timeout),
            no_sandbox: env_bool("CASETRAWL_NO_SANDBOX", defaults.no_sandbox),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
