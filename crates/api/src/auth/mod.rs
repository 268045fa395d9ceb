//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access, runner and account-activation tokens.

pub mod jwt;
pub mod password;
