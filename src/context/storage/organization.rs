//! Organization storage trait.

use crate::context::types::Organization;
use crate::error::Result;
use async_trait::async_trait;

/// Read access to organizations.
///
/// The resolver issues at most one of these calls per request: `find_by_id`
/// for explicit overrides and stored defaults, `find_by_slug` for request
/// hints.
///
/// # Important: Slug Uniqueness
///
/// Your database **must** enforce a unique constraint on the slug column.
/// A slug that matches more than one organization would make tenant selection
/// ambiguous.
///
/// # Example
///
/// ```rust,ignore
/// use pinpoint_auth::context::{Organization, OrganizationStore};
/// use async_trait::async_trait;
///
/// struct PgOrgStore { pool: PgPool }
///
/// #[async_trait]
/// impl OrganizationStore for PgOrgStore {
///     async fn find_by_id(&self, id: &str) -> Result<Option<Organization>> {
///         self.query_one("SELECT id, name, slug FROM organizations WHERE id = $1", id).await
///     }
///
///     async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
///         self.query_one("SELECT id, name, slug FROM organizations WHERE slug = $1", slug).await
///     }
/// }
/// ```
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Find an organization by its ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>>;

    /// Find an organization by its slug (subdomain / request hint).
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>>;
}
