//! Identity validator
//!
//! Checks that an asserted identity is well formed and that it stays the same
//! for the whole session.

use super::identity::User;
use crate::error::AuthError;

/// Performs basic input sanitation on a user or group name.
fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.is_empty()
        && input.len() <= max_length
        && !input.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Validates the shape of an asserted identity.
pub fn validate_identity(user: &User, max_length: usize) -> Result<(), AuthError> {
    if !is_valid_input(&user.name, max_length) {
        return Err(AuthError::InvalidIdentity(format!(
            "bad user name {:?}",
            user.name
        )));
    }

    if !is_valid_input(&user.group, max_length) {
        return Err(AuthError::InvalidIdentity(format!(
            "bad group name {:?}",
            user.group
        )));
    }

    Ok(())
}

/// Validates that a request carries the identity the session was bound to.
pub fn validate_same_identity(bound: &User, asserted: &User) -> Result<(), AuthError> {
    if bound == asserted {
        Ok(())
    } else {
        Err(AuthError::IdentityMismatch {
            expected: bound.to_string(),
            provided: asserted.to_string(),
        })
    }
}
