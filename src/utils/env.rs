/// Read a setting from `PINPOINT_{key}`, or from plain `{key}` when the
/// prefixed variable is unset.
///
/// The prefixed name wins when both are set, so a deployment can scope
/// settings to this crate without touching shared variables.
///
/// # Examples
///
/// ```rust
/// use pinpoint_auth::utils::get_env_with_prefix;
///
/// // PINPOINT_STORE_TIMEOUT_MS, then STORE_TIMEOUT_MS
/// let timeout_ms: Option<u64> =
///     get_env_with_prefix("STORE_TIMEOUT_MS").and_then(|ms| ms.parse().ok());
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("PINPOINT_{key}"))
        .or_else(|_| std::env::var(key))
        .ok()
}
