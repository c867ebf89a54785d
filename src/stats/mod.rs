use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::info;
use parking_lot::RwLock;
use serde::Serialize;

/// Counters accumulated since startup, served verbatim on `/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeStats {
    pub started_at: DateTime<Utc>,
    pub last_job_at: Option<DateTime<Utc>>,
    pub jobs_total: usize,
    pub jobs_failed: usize,
    pub records_returned: usize,
    pub pages_visited: usize,
    pub images_uploaded: usize,
    pub upload_failures: usize,
    pub jobs_by_provider: HashMap<String, usize>,
    pub records_by_provider: HashMap<String, usize>,
    pub average_job_ms: f64,
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<ScrapeStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapeStats {
                started_at: Utc::now(),
                last_job_at: None,
                jobs_total: 0,
                jobs_failed: 0,
                records_returned: 0,
                pages_visited: 0,
                images_uploaded: 0,
                upload_failures: 0,
                jobs_by_provider: HashMap::new(),
                records_by_provider: HashMap::new(),
                average_job_ms: 0.0,
            })),
        }
    }

    /// Records one finished scrape job, successful or not.
    pub fn record_job(&self, provider: &str, records: usize, duration: Duration, ok: bool) {
        let mut stats = self.stats.write();
        stats.jobs_total += 1;
        if !ok {
            stats.jobs_failed += 1;
        }
        stats.records_returned += records;
        stats.last_job_at = Some(Utc::now());

        *stats
            .jobs_by_provider
            .entry(provider.to_string())
            .or_insert(0) += 1;
        *stats
            .records_by_provider
            .entry(provider.to_string())
            .or_insert(0) += records;

        // Incremental mean over all jobs.
        let previous_total = stats.average_job_ms * (stats.jobs_total - 1) as f64;
        stats.average_job_ms =
            (previous_total + duration.as_millis() as f64) / stats.jobs_total as f64;
    }

    /// Records one page opened in a browser session.
    pub fn record_page(&self) {
        self.stats.write().pages_visited += 1;
    }

    pub fn record_upload(&self, ok: bool) {
        let mut stats = self.stats.write();
        if ok {
            stats.images_uploaded += 1;
        } else {
            stats.upload_failures += 1;
        }
    }

    pub fn snapshot(&self) -> ScrapeStats {
        self.stats.read().clone()
    }

    pub fn log_summary(&self) {
        let stats = self.stats.read();
        info!(
            "stats: {} jobs ({} failed), {} records, {} pages, avg {:.0}ms/job",
            stats.jobs_total,
            stats.jobs_failed,
            stats.records_returned,
            stats.pages_visited,
            stats.average_job_ms
        );
        for (provider, jobs) in &stats.jobs_by_provider {
            info!(
                "stats: {}: {} jobs, {} records",
                provider,
                jobs,
                stats.records_by_provider.get(provider).unwrap_or(&0)
            );
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
