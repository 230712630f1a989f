//! Depot helpers for extracting the authenticated account from Salvo requests.
//!
//! The authentication middleware stores the account it resolved in the depot;
//! handlers read it back through these helpers.

use gavel_db::model::account::{Account, AccountRole};

use crate::error::{ServiceError, ServiceResult};

pub mod depot_keys {
    pub const AUTHENTICATED_ACCOUNT: &str = "__authenticated_account";
}

/// Get the authenticated account from the depot.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if no account is present in the depot.
pub fn get_account_from_depot(depot: &salvo::Depot) -> ServiceResult<&Account> {
    depot
        .get::<Account>(depot_keys::AUTHENTICATED_ACCOUNT)
        .map_err(|_e| ServiceError::NotAuthenticated)
}

/// Check if the request carries an authenticated account.
#[must_use]
pub fn is_authenticated(depot: &salvo::Depot) -> bool {
    depot
        .get::<Account>(depot_keys::AUTHENTICATED_ACCOUNT)
        .is_ok()
}

/// Get the authenticated account and require the admin role.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if no account is present, and
/// `AuthorizationError` if the account is not an admin.
pub fn get_admin_from_depot(depot: &salvo::Depot) -> ServiceResult<&Account> {
    let account = get_account_from_depot(depot)?;
    if account.role == AccountRole::Admin {
        Ok(account)
    } else {
        tracing::warn!(
            account_id = %account.id,
            role = %account.role,
            "Account attempted an admin-only operation"
        );
        Err(ServiceError::AuthorizationError(
            "Admin access required".to_string(),
        ))
    }
}
