//! Client identity
//!
//! Handles the self-asserted user/group identity and its validation.

pub mod identity;
pub mod validator;

pub use identity::User;
pub use validator::{validate_identity, validate_same_identity};
