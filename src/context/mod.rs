//! Request-scoped authentication and organization context.
//!
//! For every request this module answers, at most once:
//! *who is the caller, which organization are they acting in, and what role
//! do they hold there?*
//!
//! The answer is an [`AuthContext`]:
//!
//! | Variant | Meaning |
//! |---|---|
//! | `Unauthenticated` | No valid session, or the session read failed (`fault`) |
//! | `OrgMissing` | Authenticated, no organization resolved |
//! | `NoMembership` | Organization resolved, caller is not a member |
//! | `Authorized` | User, organization, membership and role all known |
//!
//! # Resolution order
//!
//! 1. Session, via the [`SessionProvider`]. Errors fail closed.
//! 2. Identity normalization ([`IdentityNormalizer`]).
//! 3. Organization: explicit override ID, then request hint (slug), then the
//!    identity's default organization. Only the winning candidate is looked up.
//! 4. Membership and role, in one read.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use axum::{Router, extract::Request, middleware::{self, Next}, routing::get};
//! use pinpoint_auth::context::{AuthResolver, Authorized, RequestScopeLayer, ResolverConfig};
//! use std::sync::Arc;
//!
//! let resolver = Arc::new(
//!     AuthResolver::builder()
//!         .session_provider(my_sessions)
//!         .stores(my_db.clone())
//!         .config(ResolverConfig::from_env())
//!         .build()?,
//! );
//! let scope = RequestScopeLayer::new(resolver);
//!
//! async fn issues(Authorized(ctx): Authorized) -> String {
//!     format!("{} in {}", ctx.user.display_name, ctx.org.name)
//! }
//!
//! let app = Router::new()
//!     .route("/issues", get(issues))
//!     .layer(middleware::from_fn(move |req: Request, next: Next| {
//!         let scope = scope.clone();
//!         async move { scope.middleware(req, next).await }
//!     }));
//! ```

mod config;
mod error;
mod extractors;
mod hint;
mod request;
mod resolver;
mod resolvers;
mod session;
pub mod storage;
mod types;

pub use config::{ResolverConfig, ResolverConfigBuilder};
pub use error::{AuthorizationError, ResolutionStep};
pub use extractors::{Authorized, CurrentAuth, RequestScopeLayer};
pub use hint::{OrgHintExtractor, SubdomainHintExtractor};
pub use request::{RequestHandle, RequestHandleBuilder, RequestQueryCounts};
pub use resolver::{AuthResolver, AuthResolverBuilder};
pub use session::{Identity, IdentityNormalizer, RawSession, SessionProvider};
pub use storage::{MembershipStore, OrganizationStore};
pub use types::{
    AuthContext, AuthContextKind, AuthorizedContext, BaseUser, Membership, MembershipGrant,
    Organization, Role, StoreFault,
};
