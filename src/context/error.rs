//! Authorization error types.

use super::types::StoreFault;
use crate::error::PinpointError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use thiserror::Error;

/// Resolution step that reads from a store or the session provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionStep {
    Session,
    Organization,
    Membership,
}

impl fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Organization => write!(f, "organization"),
            Self::Membership => write!(f, "membership"),
        }
    }
}

/// Errors returned when a caller requires a fully authorized context.
///
/// The resolver never produces these on its own. They come from
/// [`AuthResolver::require_authorized`](crate::context::AuthResolver::require_authorized)
/// and the [`Authorized`](crate::context::Authorized) extractor.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// Session absent, expired or malformed.
    #[error("No valid session")]
    SessionInvalid,

    /// No organization hint, or the hint matched no organization.
    #[error("Organization could not be resolved")]
    OrganizationNotResolvable,

    /// Authenticated and organization resolved, but no membership.
    #[error("User {user_id} is not a member of organization {org_id}")]
    MembershipNotFound {
        /// The authenticated user.
        user_id: String,
        /// The resolved organization.
        org_id: String,
    },

    /// A store read exceeded its bound.
    #[error("Storage timed out while resolving {step}")]
    StorageTimeout {
        /// The step whose read timed out.
        step: ResolutionStep,
    },

    /// A store read failed.
    #[error("Storage unavailable while resolving {step}")]
    StorageUnavailable {
        /// The step whose read failed.
        step: ResolutionStep,
    },
}

impl AuthorizationError {
    pub(crate) fn from_fault(fault: StoreFault, step: ResolutionStep) -> Self {
        match fault {
            StoreFault::Timeout => Self::StorageTimeout { step },
            StoreFault::Unavailable => Self::StorageUnavailable { step },
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionInvalid => StatusCode::UNAUTHORIZED,
            Self::OrganizationNotResolvable => StatusCode::NOT_FOUND,
            Self::MembershipNotFound { .. } => StatusCode::FORBIDDEN,
            Self::StorageTimeout { .. } | Self::StorageUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Infrastructure faults are retryable; authorization decisions are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StorageTimeout { .. } | Self::StorageUnavailable { .. }
        )
    }

    /// Whether the caller should be sent to the login page.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionInvalid)
    }
}

impl From<AuthorizationError> for PinpointError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::SessionInvalid => PinpointError::unauthorized("Login required"),
            AuthorizationError::OrganizationNotResolvable => {
                PinpointError::not_found("Organization not found")
            }
            AuthorizationError::MembershipNotFound { .. } => {
                PinpointError::forbidden("Access denied: you are not a member of this organization")
            }
            AuthorizationError::StorageTimeout { step } => {
                PinpointError::service_unavailable(format!("Timed out loading {step}"))
            }
            AuthorizationError::StorageUnavailable { step } => {
                PinpointError::service_unavailable(format!("Failed to load {step}"))
            }
        }
    }
}

impl IntoResponse for AuthorizationError {
    fn into_response(self) -> Response {
        PinpointError::from(self).into_response()
    }
}
