//! Testing utilities for applications built on pinpoint-auth
//!
//! - [`InMemoryOrgStore`]: organization and membership store with read
//!   counting, latency and failure injection
//! - [`StaticSessionProvider`]: fixed session for every request
//! - [`sample`]: ready-made users, organizations and roles
//! - [`Scenario`]: drive an Axum router without starting a server
//!
//! # Example
//!
//! ```rust
//! use pinpoint_auth::context::{AuthResolver, RequestHandle};
//! use pinpoint_auth::testing::{InMemoryOrgStore, StaticSessionProvider, sample};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryOrgStore::new();
//! store.insert_org(sample::org("org_acme", "acme"));
//! store.insert_grant(sample::grant("m1", "u1", "org_acme", sample::admin_role()));
//!
//! let session = sample::session("u1").with_default_org("org_acme");
//! let resolver = AuthResolver::builder()
//!     .session_provider(StaticSessionProvider::new(session))
//!     .stores(store.clone())
//!     .build()
//!     .unwrap();
//!
//! let ctx = resolver.resolve(&RequestHandle::new()).await;
//! assert!(ctx.is_authorized());
//! # }
//! ```

pub mod sample;
mod scenario;
mod stores;

pub use scenario::{Scenario, ScenarioAssert, get, post};
pub use stores::{InMemoryOrgStore, StaticSessionProvider};
