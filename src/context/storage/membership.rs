//! Membership storage trait.

use crate::context::types::MembershipGrant;
use crate::error::Result;
use async_trait::async_trait;

/// Read access to memberships and their roles.
///
/// `find_membership` must load the membership and its role in one read
/// (a join, or a single document fetch). The resolver counts it as one
/// membership query.
///
/// # Example
///
/// ```rust,ignore
/// use pinpoint_auth::context::{MembershipGrant, MembershipStore};
/// use async_trait::async_trait;
///
/// #[async_trait]
/// impl MembershipStore for PgMembershipStore {
///     async fn find_membership(
///         &self,
///         user_id: &str,
///         org_id: &str,
///     ) -> Result<Option<MembershipGrant>> {
///         // SELECT m.*, r.* FROM memberships m
///         //   JOIN roles r ON r.id = m.role_id
///         //  WHERE m.user_id = $1 AND m.organization_id = $2
///         self.query_grant(user_id, org_id).await
///     }
/// }
/// ```
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Load the membership of `user_id` in `org_id` together with its role.
    async fn find_membership(&self, user_id: &str, org_id: &str)
        -> Result<Option<MembershipGrant>>;
}
