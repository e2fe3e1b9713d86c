use prometheus::{IntCounter, Opts, Registry};
use serde::Serialize;
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<Arc<ResolutionMetrics>> =
    LazyLock::new(|| Arc::new(ResolutionMetrics::default()));

/// Resolution counters.
///
/// Resolvers record into the process-wide collector unless given their own,
/// which keeps tests isolated from each other.
#[derive(Clone)]
pub struct ResolutionMetrics {
    /// Resolution chains that started computing
    pub resolutions_started: IntCounter,

    /// `resolve` calls answered by an existing or in-flight resolution
    pub resolutions_served_from_cache: IntCounter,

    /// Organization store reads issued
    pub org_queries: IntCounter,

    /// Membership store reads issued
    pub membership_queries: IntCounter,

    /// Store reads that hit the timeout bound
    pub store_timeouts: IntCounter,

    registry: Arc<Registry>,
}

/// Point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionMetricsSnapshot {
    pub resolutions_started: u64,
    pub resolutions_served_from_cache: u64,
    pub org_queries: u64,
    pub membership_queries: u64,
    pub store_timeouts: u64,
}

impl ResolutionMetricsSnapshot {
    /// Total `resolve` calls observed.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.resolutions_started + self.resolutions_served_from_cache
    }

    /// Fraction of calls served from cache (0.0 when nothing was called).
    #[must_use]
    pub fn cache_hit_ratio(&self) -> f64 {
        match self.total_calls() {
            0 => 0.0,
            total => self.resolutions_served_from_cache as f64 / total as f64,
        }
    }

    /// Counter deltas since an earlier snapshot.
    #[must_use]
    pub fn since(&self, earlier: &Self) -> Self {
        Self {
            resolutions_started: self
                .resolutions_started
                .saturating_sub(earlier.resolutions_started),
            resolutions_served_from_cache: self
                .resolutions_served_from_cache
                .saturating_sub(earlier.resolutions_served_from_cache),
            org_queries: self.org_queries.saturating_sub(earlier.org_queries),
            membership_queries: self.membership_queries.saturating_sub(earlier.membership_queries),
            store_timeouts: self.store_timeouts.saturating_sub(earlier.store_timeouts),
        }
    }
}

impl ResolutionMetrics {
    /// Create a collector with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let resolutions_started = counter(
            "resolutions_started_total",
            "Auth context resolutions that started computing",
        )?;
        let resolutions_served_from_cache = counter(
            "resolutions_served_from_cache_total",
            "Auth context lookups served from the request cache",
        )?;
        let org_queries = counter("org_queries_total", "Organization store reads")?;
        let membership_queries = counter("membership_queries_total", "Membership store reads")?;
        let store_timeouts = counter("store_timeouts_total", "Store reads that timed out")?;

        registry.register(Box::new(resolutions_started.clone()))?;
        registry.register(Box::new(resolutions_served_from_cache.clone()))?;
        registry.register(Box::new(org_queries.clone()))?;
        registry.register(Box::new(membership_queries.clone()))?;
        registry.register(Box::new(store_timeouts.clone()))?;

        Ok(Self {
            resolutions_started,
            resolutions_served_from_cache,
            org_queries,
            membership_queries,
            store_timeouts,
            registry: Arc::new(registry),
        })
    }

    /// The process-wide collector.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Read all counters.
    pub fn snapshot(&self) -> ResolutionMetricsSnapshot {
        ResolutionMetricsSnapshot {
            resolutions_started: self.resolutions_started.get(),
            resolutions_served_from_cache: self.resolutions_served_from_cache.get(),
            org_queries: self.org_queries.get(),
            membership_queries: self.membership_queries.get(),
            store_timeouts: self.store_timeouts.get(),
        }
    }

    /// Zero all counters, starting a new measurement window.
    pub fn reset(&self) {
        self.resolutions_started.reset();
        self.resolutions_served_from_cache.reset();
        self.org_queries.reset();
        self.membership_queries.reset();
        self.store_timeouts.reset();
    }
}

impl Default for ResolutionMetrics {
    fn default() -> Self {
        Self::new().expect("Failed to create resolution metrics")
    }
}

fn counter(name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    IntCounter::with_opts(Opts::new(name, help).namespace("pinpoint_auth"))
}

/// Snapshot of the process-wide counters.
pub fn get_resolution_metrics() -> ResolutionMetricsSnapshot {
    GLOBAL.snapshot()
}
