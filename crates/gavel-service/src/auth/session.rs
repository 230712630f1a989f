//! Bearer session lifecycle.
//!
//! Each account has at most one active session row. Issuing a token upserts
//! the row with a fresh `jti`, so older tokens for the same account stop
//! validating as soon as a new one is issued.

use chrono::{Duration, Utc};
use gavel_core::config::AuthConfig;
use gavel_db::db::connection::DbConnection;
use gavel_db::db::query::{account, session};
use gavel_db::model::account::Account;
use rand::RngCore;
use uuid::Uuid;

use crate::auth::token::{self, SessionClaims};
use crate::error::{ServiceError, ServiceResult};

/// A bearer token paired with the session identifier embedded in it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Compact signed token handed to the client.
    pub token: String,
    /// The `jti` recorded on the account's session row.
    pub token_id: String,
}

fn generate_token_id() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// ## Summary
/// Issues a bearer token for the account and records its `jti` on the
/// account's session row.
///
/// The session row keeps a single current `jti` and a version that increases
/// on every reissue, so previously issued tokens stop validating immediately.
///
/// ## Errors
/// Returns a database error if the session row cannot be written, or
/// `InvalidConfiguration` if token signing fails.
pub async fn issue(
    conn: &mut DbConnection<'_>,
    auth: &AuthConfig,
    account_id: Uuid,
) -> ServiceResult<IssuedSession> {
    let token_id = generate_token_id();
    let row = session::upsert(conn, account_id, &token_id).await?;

    let now = Utc::now();
    let claims = SessionClaims {
        sub: account_id,
        jti: token_id.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(auth.ttl)).timestamp(),
    };
    let token = token::sign(&claims, &auth.secret)?;

    tracing::debug!(account_id = %account_id, version = row.version, "Issued session token");

    Ok(IssuedSession { token, token_id })
}

/// ## Summary
/// Validates a bearer token and loads the account it belongs to.
///
/// The token must verify against the signing secret, the account must be
/// live, and the token's `jti` must match the account's current session row.
///
/// ## Errors
/// Returns `NotAuthenticated` for invalid, expired, or superseded tokens and
/// for accounts that no longer exist; `AuthorizationError` if the account is
/// deactivated.
pub async fn authenticate(
    conn: &mut DbConnection<'_>,
    auth: &AuthConfig,
    bearer: &str,
) -> ServiceResult<Account> {
    let claims = token::verify(bearer, &auth.secret, Utc::now())?;

    let Some(account) = account::find_live_by_id(conn, claims.sub).await? else {
        return Err(ServiceError::NotAuthenticated);
    };

    if account.is_deactivated {
        return Err(ServiceError::AuthorizationError(
            "Account is deactivated".to_string(),
        ));
    }

    let Some(active) = session::find(conn, account.id).await? else {
        return Err(ServiceError::NotAuthenticated);
    };
    if active.token_id != claims.jti {
        tracing::debug!(account_id = %account.id, "Token superseded by a newer session");
        return Err(ServiceError::NotAuthenticated);
    }

    Ok(account)
}

/// ## Summary
/// Ends the account's session and clears its device binding.
///
/// Succeeds even when no session row exists.
///
/// ## Errors
/// Returns a database error if either write fails.
pub async fn revoke(conn: &mut DbConnection<'_>, account_id: Uuid) -> ServiceResult<()> {
    session::delete(conn, account_id).await?;
    account::clear_device(conn, account_id).await?;
    Ok(())
}
