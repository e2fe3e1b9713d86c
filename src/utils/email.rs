//! Email shape check used when normalizing session identities.

/// Basic email format validation.
///
/// Checks that the email:
/// - Contains exactly one `@` symbol
/// - Has at least one character before `@`
/// - Has at least one `.` after `@`, not at either end of the domain
///
/// Not RFC 5322 compliant. A session whose email fails this check is treated
/// as malformed.
#[inline]
pub(crate) fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }

    !email.chars().any(char::is_whitespace)
}
