//! Business logic for the Gavel legal services backend.
//!
//! ## Module Organization
//!
//! - `account`: Account lifecycle (registration, login, profile, attorney administration)
//! - `auth`: Password hashing, bearer token codec, and session management
//! - `billing`: Conversions between billable points and currency amounts
//! - `clio`: Clio practice-management API client and linkage workflows
//! - `error`: Service layer error taxonomy
//! - `mail`: Transactional email delivery
//! - `otp`: One-time passcode issuance and verification

pub mod account;
pub mod auth;
pub mod billing;
pub mod clio;
pub mod error;
pub mod mail;
pub mod otp;
