//! Resolution instrumentation.
//!
//! Counters that verify the single-resolution invariant: how many
//! resolutions actually ran, how many calls were served from a request's
//! cache, and how many store reads were issued. Backed by Prometheus
//! counters so they can be scraped as well as asserted on in tests.

mod collector;
mod handler;

pub use collector::{ResolutionMetrics, ResolutionMetricsSnapshot, get_resolution_metrics};
pub use handler::metrics_handler;
