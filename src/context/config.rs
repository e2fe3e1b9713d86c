//! Resolver configuration.

use crate::utils::get_env_with_prefix;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`AuthResolver`](crate::context::AuthResolver).
///
/// # Example
///
/// ```rust
/// use pinpoint_auth::context::ResolverConfig;
/// use std::time::Duration;
///
/// let config = ResolverConfig::builder()
///     .store_timeout(Duration::from_millis(500))
///     .base_domain("pinpoint.app")
///     .build();
///
/// assert_eq!(config.store_timeout(), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Bound on each organization / membership store read, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Domain under which tenant subdomains live (None = no subdomain hints).
    #[serde(default)]
    pub base_domain: Option<String>,

    /// Header carrying an explicit organization hint (slug).
    #[serde(default = "default_org_hint_header")]
    pub org_hint_header: String,

    /// Header carrying an explicit organization ID override.
    #[serde(default = "default_org_override_header")]
    pub org_override_header: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            base_domain: None,
            org_hint_header: default_org_hint_header(),
            org_override_header: default_org_override_header(),
        }
    }
}

impl ResolverConfig {
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::new()
    }

    /// Store read bound as a duration.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Load resolver configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = get_env_with_prefix("STORE_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                config.store_timeout_ms = ms;
            }
        }

        if let Some(domain) = get_env_with_prefix("BASE_DOMAIN") {
            let domain = domain.trim();
            if !domain.is_empty() {
                config.base_domain = Some(domain.to_string());
            }
        }

        if let Some(header) = get_env_with_prefix("ORG_HINT_HEADER") {
            config.org_hint_header = header;
        }

        if let Some(header) = get_env_with_prefix("ORG_OVERRIDE_HEADER") {
            config.org_override_header = header;
        }

        config
    }
}

/// Builder for ResolverConfig
#[must_use = "builder does nothing until you call build()"]
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ResolverConfig::default(),
        }
    }

    pub fn store_timeout_ms(mut self, ms: u64) -> Self {
        self.config.store_timeout_ms = ms;
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.config.store_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn base_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.base_domain = Some(domain.into());
        self
    }

    pub fn org_hint_header(mut self, header: impl Into<String>) -> Self {
        self.config.org_hint_header = header.into();
        self
    }

    pub fn org_override_header(mut self, header: impl Into<String>) -> Self {
        self.config.org_override_header = header.into();
        self
    }

    pub fn build(self) -> ResolverConfig {
        self.config
    }
}

impl Default for ResolverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_store_timeout_ms() -> u64 {
    2000
}

fn default_org_hint_header() -> String {
    "x-org-hint".to_string()
}

fn default_org_override_header() -> String {
    "x-organization-id".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.store_timeout_ms, 2000);
        assert_eq!(config.store_timeout(), Duration::from_secs(2));
        assert_eq!(config.base_domain, None);
        assert_eq!(config.org_hint_header, "x-org-hint");
        assert_eq!(config.org_override_header, "x-organization-id");
    }

    #[test]
    fn test_builder() {
        let config = ResolverConfig::builder()
            .store_timeout(Duration::from_millis(250))
            .base_domain("pinpoint.app")
            .org_override_header("x-org")
            .build();

        assert_eq!(config.store_timeout_ms, 250);
        assert_eq!(config.base_domain.as_deref(), Some("pinpoint.app"));
        assert_eq!(config.org_override_header, "x-org");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"base_domain": "pinpoint.app"}"#).unwrap();
        assert_eq!(config.store_timeout_ms, 2000);
        assert_eq!(config.base_domain.as_deref(), Some("pinpoint.app"));
    }
}
