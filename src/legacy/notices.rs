use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock};
use tracing::warn;

static GLOBAL: LazyLock<Arc<DeprecationNotices>> =
    LazyLock::new(|| Arc::new(DeprecationNotices::new()));

/// Tracks which deprecated adapters have already warned.
///
/// Each adapter name warns once for the lifetime of the registry; later calls
/// are only counted. The process-wide registry is used unless an adapter set
/// is given its own.
#[derive(Debug, Default)]
pub struct DeprecationNotices {
    calls: DashMap<&'static str, u32>,
    emitted: AtomicU32,
}

impl DeprecationNotices {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Record a call to `adapter`. Returns `true` if this call emitted the warning.
    pub fn notify(&self, adapter: &'static str, replacement: &'static str) -> bool {
        let first = match self.calls.entry(adapter) {
            Entry::Occupied(mut entry) => {
                let count = entry.get_mut();
                *count = count.saturating_add(1);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(1);
                true
            }
        };

        if first {
            self.emitted.fetch_add(1, Ordering::Relaxed);
            warn!(
                adapter,
                replacement,
                "Deprecated auth adapter called; migrate to the replacement"
            );
        }
        first
    }

    /// Warnings emitted so far, across all adapters.
    pub fn emitted(&self) -> u32 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Calls recorded for `adapter`.
    pub fn calls(&self, adapter: &str) -> u32 {
        self.calls.get(adapter).map(|count| *count).unwrap_or(0)
    }

    /// Adapters that have been called at least once.
    pub fn called_adapters(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.calls.iter().map(|entry| *entry.key()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warns_once_per_adapter() {
        let notices = DeprecationNotices::new();

        assert!(notices.notify("get_current_user", "AuthResolver::resolve"));
        for _ in 0..4 {
            assert!(!notices.notify("get_current_user", "AuthResolver::resolve"));
        }

        assert_eq!(notices.emitted(), 1);
        assert_eq!(notices.calls("get_current_user"), 5);
    }

    #[test]
    fn test_call_count_saturates() {
        let notices = DeprecationNotices::new();
        notices.calls.insert("get_current_user", u32::MAX);

        assert!(!notices.notify("get_current_user", "AuthResolver::resolve"));
        assert_eq!(notices.calls("get_current_user"), u32::MAX);
        assert_eq!(notices.emitted(), 0);
    }

    #[test]
    fn test_adapters_tracked_independently() {
        let notices = DeprecationNotices::new();

        notices.notify("get_current_user", "AuthResolver::resolve");
        notices.notify("check_permission", "AuthResolver::require_authorized");
        notices.notify("get_current_user", "AuthResolver::resolve");

        assert_eq!(notices.emitted(), 2);
        assert_eq!(notices.calls("check_permission"), 1);
        assert_eq!(notices.calls("get_user_role"), 0);
        assert_eq!(
            notices.called_adapters(),
            vec!["check_permission", "get_current_user"]
        );
    }
}
