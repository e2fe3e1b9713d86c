use axum::http::HeaderName;
use serde::{Deserialize, Serialize};

use crate::context::ResolverConfig;
use crate::error::PinpointError;
use crate::legacy::LegacyConfig;
use crate::utils::get_env_with_prefix;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub legacy: LegacyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.config.resolver = resolver;
        self
    }

    pub fn with_legacy(mut self, legacy: LegacyConfig) -> Self {
        self.config.legacy = legacy;
        self
    }

    pub fn with_legacy_strict(mut self, strict: bool) -> Self {
        self.config.legacy.strict = strict;
        self
    }

    /// Load configuration from environment variables with PINPOINT_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self.config.resolver = ResolverConfig::from_env();
        self.config.legacy = LegacyConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Invalid log level
    /// - Zero store timeout
    /// - Hint or override header that is not a valid header name
    pub fn build(self) -> crate::error::Result<Config> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(PinpointError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.resolver.store_timeout_ms == 0 {
            return Err(PinpointError::bad_request(
                "Store timeout must be greater than 0",
            ));
        }

        for (label, header) in [
            ("org hint", &self.config.resolver.org_hint_header),
            ("org override", &self.config.resolver.org_override_header),
        ] {
            if HeaderName::from_bytes(header.as_bytes()).is_err() {
                return Err(PinpointError::bad_request(format!(
                    "Invalid {label} header name: {header:?}"
                )));
            }
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.resolver.store_timeout_ms, 2000);
        assert!(!config.legacy.strict);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let result = ConfigBuilder::new().with_log_level("verbose").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = ConfigBuilder::new()
            .with_resolver(ResolverConfig::builder().store_timeout_ms(0).build())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_invalid_header_name() {
        let result = ConfigBuilder::new()
            .with_resolver(ResolverConfig::builder().org_hint_header("x org").build())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_sets_sections() {
        let config = ConfigBuilder::new()
            .with_log_level("debug")
            .with_json_logging(true)
            .with_legacy_strict(true)
            .build()
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert!(config.legacy.strict);
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("PINPOINT_STORE_TIMEOUT_MS", "750");
            std::env::set_var("PINPOINT_LEGACY_STRICT", "true");
        }

        let config = ConfigBuilder::new().from_env().build().unwrap();
        assert_eq!(config.resolver.store_timeout_ms, 750);
        assert!(config.legacy.strict);

        unsafe {
            std::env::remove_var("PINPOINT_STORE_TIMEOUT_MS");
            std::env::remove_var("PINPOINT_LEGACY_STRICT");
        }
    }
}
