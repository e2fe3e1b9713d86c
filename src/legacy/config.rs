use crate::utils::get_env_with_prefix;
use serde::{Deserialize, Serialize};

/// Legacy adapter configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LegacyConfig {
    /// Turn every deprecated adapter call into an error.
    #[serde(default)]
    pub strict: bool,
}

impl LegacyConfig {
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load legacy configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(strict) = get_env_with_prefix("LEGACY_STRICT") {
            config.strict = parse_flag(&strict);
        }

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lenient() {
        assert!(!LegacyConfig::default().strict);
        assert!(LegacyConfig::default().with_strict(true).strict);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("ON"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
