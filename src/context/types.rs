//! Identity, tenant and resolution result types.
//!
//! Everything here is read-only for the lifetime of a request. Nothing in this
//! module is persisted by the resolver.

use super::error::{AuthorizationError, ResolutionStep};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Minimal, provider-independent user record derived from the session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseUser {
    /// Stable user identifier.
    pub id: String,
    /// Normalized email address, when the session carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Name shown in the UI.
    pub display_name: String,
}

/// A tenant organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier.
    pub id: String,
    /// Organization name.
    pub name: String,
    /// Subdomain / request hint that selects this organization.
    pub slug: String,
}

/// Association between a user and one organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Unique identifier.
    pub id: String,
    /// Member user ID.
    pub user_id: String,
    /// Organization ID.
    pub organization_id: String,
    /// Role granted by this membership.
    pub role_id: String,
}

/// A named set of permissions, loaded alongside the membership.
///
/// # Example
///
/// ```rust
/// use pinpoint_auth::context::Role;
///
/// let role = Role::new("role_admin", "Admin")
///     .with_permission("issues:write")
///     .with_permission("members:manage");
///
/// assert!(role.has_permission("issues:write"));
/// assert!(!role.has_permission("org:delete"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier.
    pub id: String,
    /// Display name, e.g. `"Admin"`.
    pub name: String,
    /// Permission strings granted by the role.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Role {
    /// Create a role without permissions.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions: BTreeSet::new(),
        }
    }

    /// Add a permission.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Check whether the role grants `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Membership plus its role, as returned by the single joined membership read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipGrant {
    /// The membership row.
    pub membership: Membership,
    /// The role referenced by `membership.role_id`.
    pub role: Role,
}

/// Infrastructure failure that forced a step to fail closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFault {
    /// The read exceeded the configured bound.
    Timeout,
    /// The store returned an error.
    Unavailable,
}

impl fmt::Display for StoreFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Fully resolved caller: authenticated, inside a known organization, with a role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthorizedContext {
    pub user: BaseUser,
    pub org: Organization,
    pub membership: Membership,
    pub role: Role,
}

/// Discriminant of an [`AuthContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthContextKind {
    Unauthenticated,
    OrgMissing,
    NoMembership,
    Authorized,
}

impl AuthContextKind {
    /// Tag used in serialized output and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::OrgMissing => "org-missing",
            Self::NoMembership => "no-membership",
            Self::Authorized => "authorized",
        }
    }
}

impl fmt::Display for AuthContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of resolving one request.
///
/// Each variant carries exactly the data that is known at that point of the
/// resolution chain, so a partially populated context cannot be built.
///
/// `fault` is `None` when the step genuinely found nothing and set when the
/// step failed because its store timed out or errored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AuthContext {
    /// No valid session.
    Unauthenticated {
        #[serde(skip_serializing_if = "Option::is_none")]
        fault: Option<StoreFault>,
    },

    /// Authenticated, but no organization could be resolved.
    OrgMissing {
        user: BaseUser,
        #[serde(skip_serializing_if = "Option::is_none")]
        fault: Option<StoreFault>,
    },

    /// Authenticated and organization resolved, but the user has no membership in it.
    NoMembership {
        user: BaseUser,
        org_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        fault: Option<StoreFault>,
    },

    /// Fully authorized.
    Authorized(AuthorizedContext),
}

impl AuthContext {
    /// Variant discriminant.
    #[must_use]
    pub fn kind(&self) -> AuthContextKind {
        match self {
            Self::Unauthenticated { .. } => AuthContextKind::Unauthenticated,
            Self::OrgMissing { .. } => AuthContextKind::OrgMissing,
            Self::NoMembership { .. } => AuthContextKind::NoMembership,
            Self::Authorized(_) => AuthContextKind::Authorized,
        }
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&BaseUser> {
        match self {
            Self::Unauthenticated { .. } => None,
            Self::OrgMissing { user, .. } | Self::NoMembership { user, .. } => Some(user),
            Self::Authorized(ctx) => Some(&ctx.user),
        }
    }

    /// The resolved organization ID, if resolution got that far.
    #[must_use]
    pub fn org_id(&self) -> Option<&str> {
        match self {
            Self::NoMembership { org_id, .. } => Some(org_id),
            Self::Authorized(ctx) => Some(&ctx.org.id),
            _ => None,
        }
    }

    /// The full organization record. Only authorized contexts carry it.
    #[must_use]
    pub fn organization(&self) -> Option<&Organization> {
        self.authorized().map(|ctx| &ctx.org)
    }

    /// The authorized context, if this is one.
    #[must_use]
    pub fn authorized(&self) -> Option<&AuthorizedContext> {
        match self {
            Self::Authorized(ctx) => Some(ctx),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Unauthenticated { .. })
    }

    /// Store fault that caused this outcome, if any.
    #[must_use]
    pub fn fault(&self) -> Option<StoreFault> {
        match self {
            Self::Unauthenticated { fault }
            | Self::OrgMissing { fault, .. }
            | Self::NoMembership { fault, .. } => *fault,
            _ => None,
        }
    }

    /// Map a non-authorized outcome onto the error taxonomy.
    ///
    /// Store faults win over the variant so that an infrastructure failure is
    /// never reported as an authorization decision.
    pub(crate) fn to_authorization_result(
        &self,
    ) -> Result<AuthorizedContext, AuthorizationError> {
        match self {
            Self::Authorized(ctx) => Ok(ctx.clone()),
            Self::Unauthenticated { fault: Some(fault) } => {
                Err(AuthorizationError::from_fault(*fault, ResolutionStep::Session))
            }
            Self::Unauthenticated { fault: None } => Err(AuthorizationError::SessionInvalid),
            Self::OrgMissing { fault: Some(fault), .. } => {
                Err(AuthorizationError::from_fault(*fault, ResolutionStep::Organization))
            }
            Self::OrgMissing { fault: None, .. } => {
                Err(AuthorizationError::OrganizationNotResolvable)
            }
            Self::NoMembership { fault: Some(fault), .. } => {
                Err(AuthorizationError::from_fault(*fault, ResolutionStep::Membership))
            }
            Self::NoMembership { user, org_id, fault: None } => {
                Err(AuthorizationError::MembershipNotFound {
                    user_id: user.id.clone(),
                    org_id: org_id.clone(),
                })
            }
        }
    }
}
