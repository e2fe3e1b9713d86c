//! Session provider seam and identity normalization.
//!
//! Session transport (cookies, tokens, renewal) belongs to the session
//! provider. This module only turns whatever the provider returns into a
//! [`BaseUser`], failing closed on anything suspicious.

use super::request::RequestHandle;
use super::types::BaseUser;
use crate::error::Result;
use crate::utils::is_valid_email;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// Metadata keys checked, in order, for the user's default organization.
const DEFAULT_ORG_KEYS: [&str; 2] = ["default_organization_id", "organization_id"];

/// Session data as handed over by the session provider.
///
/// Fields are optional because providers are not trusted to return
/// well-formed data; the normalizer decides what is usable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSession {
    pub id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// When the session stops being valid.
    pub expires_at: Option<SystemTime>,
    /// Provider-specific fields.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RawSession {
    /// Session for a user ID with no other fields set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_expires_at(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set the user's stored default organization.
    #[must_use]
    pub fn with_default_org(self, org_id: impl Into<String>) -> Self {
        self.with_metadata(DEFAULT_ORG_KEYS[0], serde_json::Value::String(org_id.into()))
    }
}

/// Supplies the raw session for the current request.
///
/// Implement this over your session transport. Returning `Ok(None)` means no
/// session. An error or a read past the store timeout makes the request
/// unauthenticated with a fault recorded, so callers can tell an outage from a
/// missing login.
///
/// # Example
///
/// ```rust,ignore
/// use pinpoint_auth::context::{RawSession, RequestHandle, SessionProvider};
/// use async_trait::async_trait;
///
/// struct CookieSessions { store: MySessionStore }
///
/// #[async_trait]
/// impl SessionProvider for CookieSessions {
///     async fn current_session(&self, request: &RequestHandle) -> Result<Option<RawSession>> {
///         let Some(cookie) = request.header("cookie") else {
///             return Ok(None);
///         };
///         self.store.load_from_cookie(cookie).await
///     }
/// }
/// ```
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Load the session for `request`.
    async fn current_session(&self, request: &RequestHandle) -> Result<Option<RawSession>>;
}

/// Normalized identity: the user plus the routing data the resolver needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user: BaseUser,
    /// The identity's stored default organization ID.
    pub default_org_id: Option<String>,
}

/// Converts raw sessions into [`Identity`] values.
///
/// # Example
///
/// ```rust
/// use pinpoint_auth::context::{IdentityNormalizer, RawSession};
///
/// let session = RawSession::new("u1").with_email("Ada@Example.com");
/// let identity = IdentityNormalizer::normalize(&session).unwrap();
///
/// assert_eq!(identity.user.email.as_deref(), Some("ada@example.com"));
/// assert_eq!(identity.user.display_name, "Ada");
///
/// let id_only = IdentityNormalizer::normalize(&RawSession::new("u1")).unwrap();
/// assert_eq!(id_only.user.email, None);
///
/// assert!(IdentityNormalizer::normalize(&RawSession::default()).is_none());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityNormalizer;

impl IdentityNormalizer {
    /// Normalize against the current time.
    #[must_use]
    pub fn normalize(raw: &RawSession) -> Option<Identity> {
        Self::normalize_at(raw, SystemTime::now())
    }

    /// Normalize against a fixed point in time.
    ///
    /// Returns `None` when the ID is missing or blank, an email is present but
    /// malformed, or the session expired at or before `now`. A session without
    /// an email is valid.
    #[must_use]
    pub fn normalize_at(raw: &RawSession, now: SystemTime) -> Option<Identity> {
        if raw.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return None;
        }

        let id = non_blank(raw.id.as_deref())?.to_string();

        let email = match non_blank(raw.email.as_deref()) {
            Some(email) if is_valid_email(email) => Some(email.to_lowercase()),
            Some(_) => return None,
            None => None,
        };

        let display_name = match (non_blank(raw.display_name.as_deref()), &email) {
            (Some(name), _) => name.to_string(),
            (None, Some(email)) => fallback_display_name(email),
            (None, None) => id.clone(),
        };

        let default_org_id = DEFAULT_ORG_KEYS.iter().find_map(|key| {
            raw.metadata
                .get(*key)
                .and_then(serde_json::Value::as_str)
                .and_then(|v| non_blank(Some(v)))
                .map(str::to_string)
        });

        Some(Identity {
            user: BaseUser {
                id,
                email,
                display_name,
            },
            default_org_id,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Capitalized local part of the email, e.g. `ada.lovelace@x.io` -> `Ada.lovelace`.
fn fallback_display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session() -> RawSession {
        RawSession::new("u1")
            .with_email("u1@example.com")
            .with_display_name("User One")
    }

    #[test]
    fn test_normalizes_valid_session() {
        let identity = IdentityNormalizer::normalize(&session()).unwrap();

        assert_eq!(identity.user.id, "u1");
        assert_eq!(identity.user.email.as_deref(), Some("u1@example.com"));
        assert_eq!(identity.user.display_name, "User One");
        assert_eq!(identity.default_org_id, None);
    }

    #[test]
    fn test_strips_provider_metadata() {
        let raw = session()
            .with_metadata("provider", serde_json::json!("supabase"))
            .with_metadata("aal", serde_json::json!("aal2"));

        let identity = IdentityNormalizer::normalize(&raw).unwrap();
        assert_eq!(
            identity.user,
            BaseUser {
                id: "u1".to_string(),
                email: Some("u1@example.com".to_string()),
                display_name: "User One".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_or_blank_id_fails_closed() {
        let mut raw = session();
        raw.id = None;
        assert!(IdentityNormalizer::normalize(&raw).is_none());

        raw.id = Some("   ".to_string());
        assert!(IdentityNormalizer::normalize(&raw).is_none());
    }

    #[test]
    fn test_malformed_email_fails_closed() {
        let mut raw = session();
        raw.email = Some("not-an-email".to_string());
        assert!(IdentityNormalizer::normalize(&raw).is_none());
    }

    #[test]
    fn test_id_only_session_is_valid() {
        let identity = IdentityNormalizer::normalize(&RawSession::new("u1")).unwrap();
        assert_eq!(identity.user.id, "u1");
        assert_eq!(identity.user.email, None);
        assert_eq!(identity.user.display_name, "u1");

        let mut raw = RawSession::new("u1");
        raw.email = Some("  ".to_string());
        let identity = IdentityNormalizer::normalize(&raw).unwrap();
        assert_eq!(identity.user.email, None);
    }

    #[test]
    fn test_expired_session_fails_closed() {
        let now = SystemTime::now();

        let expired = session().with_expires_at(now - Duration::from_secs(1));
        assert!(IdentityNormalizer::normalize_at(&expired, now).is_none());

        let expiring_now = session().with_expires_at(now);
        assert!(IdentityNormalizer::normalize_at(&expiring_now, now).is_none());

        let valid = session().with_expires_at(now + Duration::from_secs(60));
        assert!(IdentityNormalizer::normalize_at(&valid, now).is_some());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let raw = RawSession::new("u2").with_email("grace.hopper@example.com");
        let identity = IdentityNormalizer::normalize(&raw).unwrap();
        assert_eq!(identity.user.display_name, "Grace.hopper");
    }

    #[test]
    fn test_default_org_from_metadata() {
        let raw = session().with_default_org("org_1");
        let identity = IdentityNormalizer::normalize(&raw).unwrap();
        assert_eq!(identity.default_org_id.as_deref(), Some("org_1"));

        let raw = session().with_metadata("organization_id", serde_json::json!("org_2"));
        let identity = IdentityNormalizer::normalize(&raw).unwrap();
        assert_eq!(identity.default_org_id.as_deref(), Some("org_2"));

        let raw = session().with_metadata("organization_id", serde_json::json!(42));
        let identity = IdentityNormalizer::normalize(&raw).unwrap();
        assert_eq!(identity.default_org_id, None);
    }
}
