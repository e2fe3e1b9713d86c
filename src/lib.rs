//! pinpoint-auth - request-scoped authentication and organization context
//!
//! Resolves, once per request, who the caller is, which organization they are
//! acting in, and what role they hold there, no matter how many call sites
//! ask during that request.
//!
//! # Features
//!
//! - **Resolution**: [`AuthResolver`] with per-request single-flight memoization
//! - **Results**: one tagged [`AuthContext`] instead of ad hoc shapes
//! - **Axum**: [`RequestScopeLayer`] middleware plus `CurrentAuth` / `Authorized` extractors
//! - **Migration**: deprecated [`legacy`] adapters with once-per-adapter warnings
//! - **Metrics**: Prometheus counters for resolutions and store reads
//! - **Testing**: in-memory stores and request scenarios
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pinpoint_auth::context::{AuthResolver, RequestHandle};
//! use pinpoint_auth::testing::{InMemoryOrgStore, StaticSessionProvider, sample};
//! use pinpoint_auth::ConfigBuilder;
//!
//! #[tokio::main]
//! async fn main() -> pinpoint_auth::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     pinpoint_auth::init_tracing_with_config(&config);
//!
//!     let resolver = AuthResolver::builder()
//!         .session_provider(StaticSessionProvider::new(sample::session("u1")))
//!         .stores(InMemoryOrgStore::new())
//!         .config(config.resolver)
//!         .build()?;
//!
//!     let request = RequestHandle::builder().host("acme.pinpoint.app").build();
//!     let ctx = resolver.resolve(&request).await;
//!     println!("{}", ctx.kind());
//!     Ok(())
//! }
//! ```

mod config;
pub mod context;
mod error;
pub mod legacy;
pub mod metrics;
pub mod testing;
pub mod utils;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, LoggingConfig};
pub use context::{
    AuthContext, AuthResolver, Authorized, AuthorizationError, AuthorizedContext, CurrentAuth,
    RequestHandle, RequestScopeLayer, ResolverConfig,
};
pub use error::{ErrorResponse, PinpointError, Result};
pub use legacy::{LegacyAdapters, LegacyConfig, LegacyError};
pub use metrics::{ResolutionMetrics, ResolutionMetricsSnapshot, get_resolution_metrics};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "pinpoint_auth=debug")
/// - `PINPOINT_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// # Example
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() {
///     pinpoint_auth::init_tracing();
///     // ... rest of your app
/// }
/// ```
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("PINPOINT_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
///
/// `RUST_LOG` still wins over the configured level when set.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
