//! Authentication flow.
//!
//! ## Module Organization
//!
//! - `depot`: Helpers for extracting the authenticated account from Salvo requests
//! - `password`: Password hashing and verification with Argon2
//! - `session`: Bearer session issuance, validation, and revocation
//! - `token`: HS256 token signing and verification

pub mod depot;
pub mod password;
pub mod session;
pub mod token;
