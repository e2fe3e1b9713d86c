//! Deprecated adapters for call sites written against the old auth helpers.
//!
//! Every adapter goes through [`AuthResolver::resolve`], so mixing legacy and
//! new call sites within one request still resolves once. Each adapter logs a
//! deprecation warning the first time it is called. With
//! [`LegacyConfig::strict`] set, every call returns
//! [`LegacyError::StrictMode`] instead, which makes remaining call sites easy
//! to find during a migration.
//!
//! # Example
//!
//! ```rust,ignore
//! #![allow(deprecated)]
//! use pinpoint_auth::legacy::LegacyAdapters;
//!
//! let legacy = LegacyAdapters::new(resolver.clone());
//! if legacy.check_permission(&request, "issues:write").await? {
//!     // ...
//! }
//! ```

mod config;
mod notices;

pub use config::LegacyConfig;
pub use notices::DeprecationNotices;

use crate::context::{
    AuthContext, AuthResolver, AuthorizationError, BaseUser, Organization, RequestHandle,
};
use crate::error::PinpointError;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by the legacy adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegacyError {
    /// Strict mode is on and a deprecated adapter was called.
    #[error("{adapter} is deprecated; use {replacement}")]
    StrictMode {
        adapter: &'static str,
        replacement: &'static str,
    },

    /// The caller is not authorized.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
}

impl From<LegacyError> for PinpointError {
    fn from(err: LegacyError) -> Self {
        match err {
            LegacyError::StrictMode { .. } => PinpointError::internal(err.to_string()),
            LegacyError::Authorization(e) => e.into(),
        }
    }
}

impl IntoResponse for LegacyError {
    fn into_response(self) -> Response {
        PinpointError::from(self).into_response()
    }
}

/// Flat auth state, as returned by the old `getAuthState`-style helper.
///
/// Org and membership misses are indistinguishable here: both leave
/// `organization` empty and `has_access` false.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LegacyAuthState {
    pub is_authenticated: bool,
    pub user: Option<BaseUser>,
    pub organization: Option<Organization>,
    pub role: Option<String>,
    pub has_access: bool,
}

/// Membership context returned by [`LegacyAdapters::require_org_membership`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LegacyMembershipContext {
    pub user: BaseUser,
    pub organization: Organization,
    pub role: String,
    pub permissions: Vec<String>,
}

/// The legacy adapter set, bound to one resolver.
#[derive(Clone)]
pub struct LegacyAdapters {
    resolver: Arc<AuthResolver>,
    notices: Arc<DeprecationNotices>,
    config: LegacyConfig,
}

impl LegacyAdapters {
    /// Adapters using the process-wide notice registry and default config.
    pub fn new(resolver: Arc<AuthResolver>) -> Self {
        Self {
            resolver,
            notices: DeprecationNotices::global(),
            config: LegacyConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: LegacyConfig) -> Self {
        self.config = config;
        self
    }

    /// Record notices into a dedicated registry.
    #[must_use]
    pub fn with_notices(mut self, notices: Arc<DeprecationNotices>) -> Self {
        self.notices = notices;
        self
    }

    pub fn notices(&self) -> &Arc<DeprecationNotices> {
        &self.notices
    }

    async fn resolve(
        &self,
        request: &RequestHandle,
        adapter: &'static str,
        replacement: &'static str,
    ) -> Result<Arc<AuthContext>, LegacyError> {
        self.notices.notify(adapter, replacement);
        if self.config.strict {
            return Err(LegacyError::StrictMode {
                adapter,
                replacement,
            });
        }
        Ok(self.resolver.resolve(request).await)
    }

    /// The authenticated user, whatever the organization state.
    #[deprecated(note = "use `AuthResolver::resolve(..).user()`")]
    pub async fn get_current_user(
        &self,
        request: &RequestHandle,
    ) -> Result<Option<BaseUser>, LegacyError> {
        let ctx = self
            .resolve(request, "get_current_user", "AuthResolver::resolve(..).user()")
            .await?;
        Ok(ctx.user().cloned())
    }

    /// The current organization, only when the caller is a member of it.
    #[deprecated(note = "use `AuthResolver::resolve(..).organization()`")]
    pub async fn get_current_organization(
        &self,
        request: &RequestHandle,
    ) -> Result<Option<Organization>, LegacyError> {
        let ctx = self
            .resolve(
                request,
                "get_current_organization",
                "AuthResolver::resolve(..).organization()",
            )
            .await?;
        Ok(ctx.organization().cloned())
    }

    /// Role name in the current organization.
    #[deprecated(note = "use `AuthResolver::require_authorized(..)` and read `role.name`")]
    pub async fn get_user_role(
        &self,
        request: &RequestHandle,
    ) -> Result<Option<String>, LegacyError> {
        let ctx = self
            .resolve(
                request,
                "get_user_role",
                "AuthResolver::require_authorized(..).role.name",
            )
            .await?;
        Ok(ctx.authorized().map(|a| a.role.name.clone()))
    }

    #[deprecated(note = "use `AuthResolver::resolve(..)` and match on `AuthContext`")]
    pub async fn get_auth_state(
        &self,
        request: &RequestHandle,
    ) -> Result<LegacyAuthState, LegacyError> {
        let ctx = self
            .resolve(request, "get_auth_state", "AuthResolver::resolve(..) + match")
            .await?;

        Ok(match ctx.authorized() {
            Some(authorized) => LegacyAuthState {
                is_authenticated: true,
                user: Some(authorized.user.clone()),
                organization: Some(authorized.org.clone()),
                role: Some(authorized.role.name.clone()),
                has_access: true,
            },
            None => LegacyAuthState {
                is_authenticated: ctx.is_authenticated(),
                user: ctx.user().cloned(),
                ..LegacyAuthState::default()
            },
        })
    }

    /// Fails unless the caller is authorized in the current organization.
    #[deprecated(note = "use `AuthResolver::require_authorized(..)`")]
    pub async fn require_org_membership(
        &self,
        request: &RequestHandle,
    ) -> Result<LegacyMembershipContext, LegacyError> {
        let ctx = self
            .resolve(
                request,
                "require_org_membership",
                "AuthResolver::require_authorized(..)",
            )
            .await?;
        let authorized = ctx.to_authorization_result()?;

        Ok(LegacyMembershipContext {
            permissions: authorized.role.permissions.iter().cloned().collect(),
            role: authorized.role.name,
            user: authorized.user,
            organization: authorized.org,
        })
    }

    /// Whether the caller's role grants `permission`. Non-authorized callers
    /// have no permissions.
    #[deprecated(note = "use `AuthResolver::require_authorized(..).role.has_permission(..)`")]
    pub async fn check_permission(
        &self,
        request: &RequestHandle,
        permission: &str,
    ) -> Result<bool, LegacyError> {
        let ctx = self
            .resolve(
                request,
                "check_permission",
                "AuthResolver::require_authorized(..).role.has_permission(..)",
            )
            .await?;
        Ok(ctx
            .authorized()
            .is_some_and(|a| a.role.has_permission(permission)))
    }
}
