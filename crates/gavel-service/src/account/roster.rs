//! Admin-facing attorney provisioning and account listings.

use diesel_async::scoped_futures::ScopedFutureExt;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gavel_core::config::MailTemplatesConfig;
use gavel_db::db::connection::DbConnection;
use gavel_db::db::query::account::{self, DashboardCounts};
use gavel_db::db::transaction::with_transaction;
use gavel_db::model::account::{AccountPatch, AccountRole, NewAccount};

use crate::account::profile::Profile;
use crate::account::{normalize_email, require_email};
use crate::auth::password::hash_password;
use crate::auth::session;
use crate::error::{ServiceError, ServiceResult, unique_violation_to_conflict};
use crate::mail::Mailer;

#[derive(Debug, Deserialize)]
pub struct CreateAttorneyRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub country_code: Option<String>,
    pub phone: Option<String>,
}

/// Identifiers for a freshly provisioned attorney.
#[derive(Debug, Serialize)]
pub struct CreatedAttorney {
    pub account_id: Uuid,
    pub email: String,
}

fn generate_temp_password() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// ## Summary
/// Provisions an attorney account with a generated password and mails the
/// credentials.
///
/// Attorneys skip code verification; the account is created already
/// verified. A soft-deleted row under the same email is revived instead of
/// inserting, which keeps the unique index happy without exposing the old
/// account state.
///
/// ## Errors
/// Returns `Conflict` when a live account already holds the email; mail
/// failures propagate because the credentials only exist in that message.
pub async fn create_attorney(
    conn: &mut DbConnection<'_>,
    mailer: &dyn Mailer,
    templates: &MailTemplatesConfig,
    request: &CreateAttorneyRequest,
) -> ServiceResult<CreatedAttorney> {
    let email = normalize_email(&request.email);
    require_email(&email)?;

    if account::find_live_by_email(conn, &email).await?.is_some() {
        return Err(ServiceError::Conflict(
            "Email is already registered".to_string(),
        ));
    }

    let temp_password = generate_temp_password();
    let password_hash = hash_password(&temp_password)?;
    let new_account = NewAccount {
        id: Uuid::now_v7(),
        role: AccountRole::Attorney,
        email: &email,
        country_code: request.country_code.as_deref(),
        phone: request.phone.as_deref(),
        password_hash: Some(&password_hash),
        social_provider: None,
        social_id: None,
        is_verified: true,
        device_token: None,
        device_kind: None,
        first_name: request.first_name.as_deref(),
        last_name: request.last_name.as_deref(),
        latitude: None,
        longitude: None,
    };

    let attorney = match account::find_deleted_by_email(conn, &email).await? {
        Some(removed) => {
            tracing::debug!(account_id = %removed.id, "Reviving soft-deleted account as attorney");
            account::revive(conn, removed.id, &new_account).await?
        }
        None => account::create(conn, &new_account)
            .await
            .map_err(|e| unique_violation_to_conflict(e, "Email is already registered"))?,
    };

    let name = attorney.full_name();
    let params = serde_json::json!({
        "email": attorney.email,
        "password": temp_password,
        "name": name,
    });
    mailer
        .send_template(&attorney.email, &name, templates.welcome, params)
        .await?;

    tracing::info!(account_id = %attorney.id, "Attorney account provisioned");
    Ok(CreatedAttorney {
        account_id: attorney.id,
        email: attorney.email,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAttorneyRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub physical_address: Option<String>,
    pub mailing_address: Option<String>,
}

/// ## Summary
/// Updates an attorney's profile fields.
///
/// ## Errors
/// Returns `NotFound` when the id does not belong to a live attorney.
pub async fn update_attorney(
    conn: &mut DbConnection<'_>,
    origin: &str,
    attorney_id: Uuid,
    request: &UpdateAttorneyRequest,
) -> ServiceResult<Profile> {
    require_attorney(conn, attorney_id).await?;

    let patch = AccountPatch {
        first_name: request.first_name.as_deref(),
        last_name: request.last_name.as_deref(),
        country_code: request.country_code.as_deref(),
        phone: request.phone.as_deref(),
        physical_address: request.physical_address.as_deref(),
        mailing_address: request.mailing_address.as_deref(),
        ..AccountPatch::default()
    };
    let Some(updated) = account::apply_patch(conn, attorney_id, &patch).await? else {
        return Err(ServiceError::NotFound("Attorney not found".to_string()));
    };
    Ok(Profile::from_account(&updated, origin))
}

/// ## Summary
/// Soft-deletes an attorney and revokes their session in one transaction.
///
/// The row survives for audit and revival; only the `is_deleted` flag takes
/// it out of every live query.
///
/// ## Errors
/// Returns `NotFound` when the id does not belong to a live attorney.
pub async fn delete_attorney(conn: &mut DbConnection<'_>, attorney_id: Uuid) -> ServiceResult<()> {
    require_attorney(conn, attorney_id).await?;

    with_transaction(conn, |tx| {
        async move {
            account::soft_delete(tx, attorney_id).await?;
            session::revoke(tx, attorney_id).await
        }
        .scope_boxed()
    })
    .await?;

    tracing::info!(account_id = %attorney_id, "Attorney removed");
    Ok(())
}

async fn require_attorney(conn: &mut DbConnection<'_>, attorney_id: Uuid) -> ServiceResult<()> {
    match account::find_live_by_id(conn, attorney_id).await? {
        Some(found) if found.role == AccountRole::Attorney => Ok(()),
        _ => Err(ServiceError::NotFound("Attorney not found".to_string())),
    }
}

/// Paging controls shared by the admin listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
}

impl PageQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(10).clamp(1, 100)
    }
}

/// One page of accounts plus the total row count for the filter.
#[derive(Debug, Serialize)]
pub struct AccountPage {
    pub items: Vec<Profile>,
    pub total: i64,
}

/// ## Errors
/// Returns a database error if the listing query fails.
pub async fn list_attorneys(
    conn: &mut DbConnection<'_>,
    origin: &str,
    query: &PageQuery,
) -> ServiceResult<AccountPage> {
    list_role_page(conn, origin, AccountRole::Attorney, query).await
}

/// ## Errors
/// Returns a database error if the listing query fails.
pub async fn list_users(
    conn: &mut DbConnection<'_>,
    origin: &str,
    query: &PageQuery,
) -> ServiceResult<AccountPage> {
    list_role_page(conn, origin, AccountRole::User, query).await
}

async fn list_role_page(
    conn: &mut DbConnection<'_>,
    origin: &str,
    role: AccountRole,
    query: &PageQuery,
) -> ServiceResult<AccountPage> {
    let (accounts, total) = account::list_by_role(
        conn,
        role,
        query.search.as_deref(),
        query.page(),
        query.per_page(),
    )
    .await?;

    let items = accounts
        .iter()
        .map(|found| Profile::from_account(found, origin))
        .collect();
    Ok(AccountPage { items, total })
}

/// ## Errors
/// Returns a database error if any counter query fails.
pub async fn dashboard(conn: &mut DbConnection<'_>) -> ServiceResult<DashboardCounts> {
    Ok(account::dashboard_counts(conn).await?)
}
