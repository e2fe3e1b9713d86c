//! Storage traits consumed by the resolver.
//!
//! Users implement these traits for their database layer. The resolver only
//! reads; nothing here writes.

mod membership;
mod organization;

pub use membership::MembershipStore;
pub use organization::OrganizationStore;
