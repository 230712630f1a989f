//! Account lifecycle and administration.
//!
//! ## Module Organization
//!
//! - `lifecycle`: registration, OTP verification, login, social login,
//!   password change, logout
//! - `profile`: client-facing account projection and profile updates
//! - `roster`: admin-side attorney provisioning, account listings, dashboard

pub mod lifecycle;
pub mod profile;
pub mod roster;

use crate::error::{ServiceError, ServiceResult};

/// Lowercases and trims an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Rejects blank required fields with a uniform validation message.
pub(crate) fn require(field: &'static str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "{field} is required"
        )));
    }
    Ok(())
}

/// Minimal shape check for submitted email addresses. Anything stricter is
/// the mail provider's problem.
pub(crate) fn require_email(email: &str) -> ServiceResult<()> {
    require("email", email)?;
    if !email.contains('@') {
        return Err(ServiceError::ValidationError(
            "email is not a valid address".to_string(),
        ));
    }
    Ok(())
}
