//! Observability: in-process counters for donation and tree activity

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Metrics collector for tracking service activity
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<RwLock<MetricsInner>>,
}

struct MetricsInner {
    counters: HashMap<String, u64>,
    gauges: HashMap<String, f64>,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsInner {
                counters: HashMap::new(),
                gauges: HashMap::new(),
                start_time: Instant::now(),
            })),
        }
    }

    /// Increment a counter
    pub async fn increment(&self, name: &str, value: u64) {
        let mut inner = self.inner.write().await;
        let counter = inner.counters.entry(name.to_string()).or_insert(0);
        *counter += value;
    }

    /// Set a gauge value
    pub async fn gauge(&self, name: &str, value: f64) {
        let mut inner = self.inner.write().await;
        inner.gauges.insert(name.to_string(), value);
    }

    /// Get all metrics as JSON-serializable format
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.read().await;
        MetricsSnapshot {
            counters: inner.counters.clone(),
            gauges: inner.gauges.clone(),
            uptime_secs: inner.start_time.elapsed().as_secs(),
        }
    }

    /// Get specific counter
    pub async fn get_counter(&self, name: &str) -> u64 {
        let inner = self.inner.read().await;
        inner.counters.get(name).copied().unwrap_or(0)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub gauges: HashMap<String, f64>,
    pub uptime_secs: u64,
}

/// Predefined metric names
pub mod metrics {
    // Ledger
    pub const DONATIONS_CREATED: &str = "donations_created_total";
    pub const SESSIONS_RECONCILED: &str = "sessions_reconciled_total";

    // Forest
    pub const TREES_PLANTED: &str = "trees_planted_total";
    pub const TREES_INELIGIBLE: &str = "trees_ineligible_total";

    // Payment provider
    pub const PROVIDER_ERRORS: &str = "provider_errors_total";
    pub const FALLBACKS_ENGAGED: &str = "fallbacks_engaged_total";

    // 1.0 when simulated fallbacks are allowed
    pub const TEST_MODE: &str = "test_mode";
}
