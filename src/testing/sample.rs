//! Sample identities, organizations and roles for tests.

use crate::context::{BaseUser, Membership, MembershipGrant, Organization, RawSession, Role};

/// A user with email `<id>@example.com`.
pub fn user(id: &str) -> BaseUser {
    BaseUser {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        display_name: display_name(id),
    }
}

/// A valid session for [`user`]`(id)`.
pub fn session(id: &str) -> RawSession {
    RawSession::new(id)
        .with_email(format!("{id}@example.com"))
        .with_display_name(display_name(id))
}

pub fn org(id: &str, slug: &str) -> Organization {
    Organization {
        id: id.to_string(),
        name: format!("{} Inc", display_name(slug)),
        slug: slug.to_string(),
    }
}

pub fn admin_role() -> Role {
    Role::new("role_admin", "Admin")
        .with_permission("issues:read")
        .with_permission("issues:write")
        .with_permission("members:manage")
}

pub fn member_role() -> Role {
    Role::new("role_member", "Member").with_permission("issues:read")
}

pub fn grant(membership_id: &str, user_id: &str, org_id: &str, role: Role) -> MembershipGrant {
    MembershipGrant {
        membership: Membership {
            id: membership_id.to_string(),
            user_id: user_id.to_string(),
            organization_id: org_id.to_string(),
            role_id: role.id.clone(),
        },
        role,
    }
}

fn display_name(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
