//! Prometheus-compatible metrics for the Flowdex server.
//!
//! Tracks request counts, downloads, and catalog rebuilds.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global metrics registry.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Total HTTP requests served.
    pub http_requests_total: AtomicU64,
    /// Total HTTP errors (4xx + 5xx).
    pub http_errors_total: AtomicU64,
    /// Total files downloaded.
    pub downloads_total: AtomicU64,
    /// Total explicit refresh requests.
    pub refreshes_total: AtomicU64,
    /// Total catalog scans, including first-access builds.
    pub scans_total: AtomicU64,
    /// Total files skipped across all scans.
    pub skipped_files_total: AtomicU64,
    /// Server start time for uptime calculation.
    pub started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                http_requests_total: AtomicU64::new(0),
                http_errors_total: AtomicU64::new(0),
                downloads_total: AtomicU64::new(0),
                refreshes_total: AtomicU64::new(0),
                scans_total: AtomicU64::new(0),
                skipped_files_total: AtomicU64::new(0),
                started_at: Instant::now(),
            }),
        }
    }

    pub fn inc_http_requests(&self) {
        self.inner
            .http_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_http_errors(&self) {
        self.inner.http_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_downloads(&self) {
        self.inner.downloads_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_refreshes(&self) {
        self.inner.refreshes_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one completed scan and the files it skipped.
    pub fn record_scan(&self, skipped: usize) {
        self.inner.scans_total.fetch_add(1, Ordering::Relaxed);
        self.inner
            .skipped_files_total
            .fetch_add(skipped as u64, Ordering::Relaxed);
    }

    /// Render metrics in Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let m = &self.inner;
        let uptime = m.started_at.elapsed().as_secs();

        format!(
            r#"# HELP flowdex_uptime_seconds Time since the server started.
# TYPE flowdex_uptime_seconds gauge
flowdex_uptime_seconds {}

# HELP flowdex_http_requests_total Total HTTP requests served.
# TYPE flowdex_http_requests_total counter
flowdex_http_requests_total {}

# HELP flowdex_http_errors_total Total HTTP errors (4xx/5xx).
# TYPE flowdex_http_errors_total counter
flowdex_http_errors_total {}

# HELP flowdex_downloads_total Total workflow files downloaded.
# TYPE flowdex_downloads_total counter
flowdex_downloads_total {}

# HELP flowdex_refreshes_total Total refresh requests.
# TYPE flowdex_refreshes_total counter
flowdex_refreshes_total {}

# HELP flowdex_scans_total Total catalog scans.
# TYPE flowdex_scans_total counter
flowdex_scans_total {}

# HELP flowdex_skipped_files_total Total files skipped during scans.
# TYPE flowdex_skipped_files_total counter
flowdex_skipped_files_total {}
"#,
            uptime,
            m.http_requests_total.load(Ordering::Relaxed),
            m.http_errors_total.load(Ordering::Relaxed),
            m.downloads_total.load(Ordering::Relaxed),
            m.refreshes_total.load(Ordering::Relaxed),
            m.scans_total.load(Ordering::Relaxed),
            m.skipped_files_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
