//! Queries against the account table.
//!
//! Uniqueness is enforced by partial unique indexes (live email, live
//! external contact id); callers map unique violations onto conflict
//! responses. The linkage writes are compare-and-set updates so two racing
//! requests cannot both claim the same slot.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::enums::{AccountRole, DeviceKind, OtpPurpose, SocialProvider};
use crate::db::schema::account;
use crate::model::account::{Account, AccountPatch, NewAccount};

/// ## Summary
/// Inserts a new account row.
///
/// ## Errors
/// Returns a unique violation if a live account already holds the email.
pub async fn create(
    conn: &mut DbConnection<'_>,
    new_account: &NewAccount<'_>,
) -> diesel::QueryResult<Account> {
    diesel::insert_into(account::table)
        .values(new_account)
        .returning(Account::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Looks up a live (not soft-deleted) account by id.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_live_by_id(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> diesel::QueryResult<Option<Account>> {
    account::table
        .find(id)
        .filter(account::is_deleted.eq(false))
        .select(Account::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Looks up a live account by normalized email.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_live_by_email(
    conn: &mut DbConnection<'_>,
    email: &str,
) -> diesel::QueryResult<Option<Account>> {
    account::table
        .filter(account::email.eq(email))
        .filter(account::is_deleted.eq(false))
        .select(Account::as_select())
        .first(conn)
        .await
        .optional()
}

/// Looks up the most recently touched soft-deleted account for an email,
/// used to revive attorney rows instead of inserting a duplicate.
pub async fn find_deleted_by_email(
    conn: &mut DbConnection<'_>,
    email: &str,
) -> diesel::QueryResult<Option<Account>> {
    account::table
        .filter(account::email.eq(email))
        .filter(account::is_deleted.eq(true))
        .order(account::updated_at.desc())
        .select(Account::as_select())
        .first(conn)
        .await
        .optional()
}

/// Looks up a live account by its social identity.
pub async fn find_by_social(
    conn: &mut DbConnection<'_>,
    provider: SocialProvider,
    social_id: &str,
) -> diesel::QueryResult<Option<Account>> {
    account::table
        .filter(account::social_provider.eq(provider))
        .filter(account::social_id.eq(social_id))
        .filter(account::is_deleted.eq(false))
        .select(Account::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Overwrites an existing unverified row with a fresh registration payload.
/// Fields absent from the payload keep their previous values; the caller
/// issues a new code immediately afterwards, which resets the OTP slot.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn overwrite_unverified(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    new_account: &NewAccount<'_>,
) -> diesel::QueryResult<Account> {
    diesel::update(account::table.find(id))
        .set(new_account)
        .returning(Account::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Stores a freshly issued code into the OTP slot, overwriting any pending
/// code for any purpose, and clears the `otp_verified` freshness proof.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn set_otp_slot(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    code: i32,
    expires_at: chrono::DateTime<chrono::Utc>,
    purpose: OtpPurpose,
) -> diesel::QueryResult<usize> {
    diesel::update(account::table.find(id))
        .set((
            account::otp_code.eq(code),
            account::otp_expires_at.eq(expires_at),
            account::otp_purpose.eq(purpose),
            account::otp_verified.eq(false),
        ))
        .execute(conn)
        .await
}

/// Clears the OTP slot without touching `otp_verified`. Used when a stale
/// code is rejected so it cannot be replayed.
pub async fn clear_otp_slot(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::update(account::table.find(id))
        .set((
            account::otp_code.eq(None::<i32>),
            account::otp_expires_at.eq(None::<chrono::DateTime<chrono::Utc>>),
            account::otp_purpose.eq(None::<OtpPurpose>),
        ))
        .execute(conn)
        .await
}

/// ## Summary
/// Consumes a matching code: clears the slot and records the freshness
/// proof. Registration verification additionally marks the account itself
/// verified.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn consume_otp(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    mark_account_verified: bool,
) -> diesel::QueryResult<usize> {
    if mark_account_verified {
        diesel::update(account::table.find(id))
            .set((
                account::otp_code.eq(None::<i32>),
                account::otp_expires_at.eq(None::<chrono::DateTime<chrono::Utc>>),
                account::otp_purpose.eq(None::<OtpPurpose>),
                account::otp_verified.eq(true),
                account::is_verified.eq(true),
            ))
            .execute(conn)
            .await
    } else {
        diesel::update(account::table.find(id))
            .set((
                account::otp_code.eq(None::<i32>),
                account::otp_expires_at.eq(None::<chrono::DateTime<chrono::Utc>>),
                account::otp_purpose.eq(None::<OtpPurpose>),
                account::otp_verified.eq(true),
            ))
            .execute(conn)
            .await
    }
}

/// ## Summary
/// Atomically consumes the `otp_verified` freshness proof. Returns the
/// number of rows updated: zero means no proof was held and the privileged
/// operation must be refused.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn take_otp_verified(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::update(
        account::table
            .find(id)
            .filter(account::otp_verified.eq(true)),
    )
    .set(account::otp_verified.eq(false))
    .execute(conn)
    .await
}

pub async fn update_password(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    password_hash: &str,
) -> diesel::QueryResult<usize> {
    diesel::update(account::table.find(id))
        .set(account::password_hash.eq(password_hash))
        .execute(conn)
        .await
}

/// Attaches a social identity to an existing account (email-matched login).
pub async fn attach_social(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    provider: SocialProvider,
    social_id: &str,
) -> diesel::QueryResult<usize> {
    diesel::update(account::table.find(id))
        .set((
            account::social_provider.eq(provider),
            account::social_id.eq(social_id),
            account::is_verified.eq(true),
        ))
        .execute(conn)
        .await
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = account)]
struct DeviceCapture<'a> {
    device_token: Option<&'a str>,
    device_kind: Option<DeviceKind>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// ## Summary
/// Records the device push binding and coordinates supplied with a login.
/// Absent fields keep their previous values; a call with nothing to record
/// is a no-op.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn capture_device(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    device_token: Option<&str>,
    device_kind: Option<DeviceKind>,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> diesel::QueryResult<usize> {
    if device_token.is_none() && device_kind.is_none() && latitude.is_none() && longitude.is_none()
    {
        return Ok(0);
    }

    let capture = DeviceCapture {
        device_token,
        device_kind,
        latitude,
        longitude,
    };
    diesel::update(account::table.find(id))
        .set(&capture)
        .execute(conn)
        .await
}

/// Drops the device push binding, used at logout and attorney removal.
pub async fn clear_device(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::update(account::table.find(id))
        .set((
            account::device_token.eq(None::<String>),
            account::device_kind.eq(None::<DeviceKind>),
        ))
        .execute(conn)
        .await
}

/// ## Summary
/// Compare-and-set claim of the external contact slot. The predicate only
/// matches while the slot is empty, so of two racing claims exactly one
/// observes an affected row; the partial unique index stops a second
/// account from holding the same contact id.
///
/// ## Errors
/// Returns a unique violation if another live account holds the contact id.
pub async fn claim_clio_contact(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    contact_id: i64,
) -> diesel::QueryResult<usize> {
    diesel::update(
        account::table
            .find(id)
            .filter(account::clio_contact_id.is_null()),
    )
    .set(account::clio_contact_id.eq(contact_id))
    .execute(conn)
    .await
}

/// Compare-and-set claim of the matter slot, same shape as the contact claim.
pub async fn set_clio_matter(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    matter_id: i64,
) -> diesel::QueryResult<usize> {
    diesel::update(
        account::table
            .find(id)
            .filter(account::clio_matter_id.is_null()),
    )
    .set(account::clio_matter_id.eq(matter_id))
    .execute(conn)
    .await
}

/// ## Summary
/// Applies a partial profile update and returns the fresh row. An empty
/// patch degenerates to a plain lookup.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn apply_patch(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    patch: &AccountPatch<'_>,
) -> diesel::QueryResult<Option<Account>> {
    if patch.is_empty() {
        return find_live_by_id(conn, id).await;
    }

    diesel::update(
        account::table
            .find(id)
            .filter(account::is_deleted.eq(false)),
    )
    .set(patch)
    .returning(Account::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// Marks an account soft-deleted. The row stays behind; the partial unique
/// indexes release its email and contact id for reuse.
pub async fn soft_delete(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::update(account::table.find(id))
        .set(account::is_deleted.eq(true))
        .execute(conn)
        .await
}

/// ## Summary
/// Revives a soft-deleted row with a fresh attorney payload. Verification,
/// OTP, social, device, and linkage state are all reset: the old external
/// contact may have been claimed by another account while this row was dead.
///
/// ## Errors
/// Returns a unique violation if the email came back into live use elsewhere.
pub async fn revive(
    conn: &mut DbConnection<'_>,
    id: uuid::Uuid,
    new_account: &NewAccount<'_>,
) -> diesel::QueryResult<Account> {
    diesel::update(account::table.find(id))
        .set((
            new_account,
            account::is_deleted.eq(false),
            account::is_deactivated.eq(false),
            account::otp_code.eq(None::<i32>),
            account::otp_expires_at.eq(None::<chrono::DateTime<chrono::Utc>>),
            account::otp_purpose.eq(None::<OtpPurpose>),
            account::otp_verified.eq(false),
            account::social_provider.eq(None::<SocialProvider>),
            account::social_id.eq(None::<String>),
            account::clio_contact_id.eq(None::<i64>),
            account::clio_matter_id.eq(None::<i64>),
        ))
        .returning(Account::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Reads the configured points-to-money conversion factor: the most
/// recently updated live admin row that carries one.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn point_value(conn: &mut DbConnection<'_>) -> diesel::QueryResult<Option<f64>> {
    let value = account::table
        .filter(account::role.eq(AccountRole::Admin))
        .filter(account::is_deleted.eq(false))
        .filter(account::point_value.is_not_null())
        .order(account::updated_at.desc())
        .select(account::point_value)
        .first::<Option<f64>>(conn)
        .await
        .optional()?;

    Ok(value.flatten())
}

pub async fn set_point_value(
    conn: &mut DbConnection<'_>,
    admin_id: uuid::Uuid,
    value: f64,
) -> diesel::QueryResult<usize> {
    diesel::update(account::table.find(admin_id))
        .set(account::point_value.eq(value))
        .execute(conn)
        .await
}

/// ## Summary
/// Pages through live accounts of one role, newest first, with an optional
/// case-insensitive substring search over names and email. Returns the page
/// and the total match count.
///
/// ## Errors
/// Returns a database error if either query fails.
pub async fn list_by_role(
    conn: &mut DbConnection<'_>,
    role: AccountRole,
    search: Option<&str>,
    page: i64,
    per_page: i64,
) -> diesel::QueryResult<(Vec<Account>, i64)> {
    let mut rows = account::table
        .filter(account::role.eq(role))
        .filter(account::is_deleted.eq(false))
        .select(Account::as_select())
        .into_boxed();
    let mut total = account::table
        .filter(account::role.eq(role))
        .filter(account::is_deleted.eq(false))
        .count()
        .into_boxed();

    if let Some(needle) = search {
        let pattern = format!("%{needle}%");
        rows = rows.filter(
            account::first_name
                .ilike(pattern.clone())
                .or(account::last_name.ilike(pattern.clone()))
                .or(account::email.ilike(pattern.clone())),
        );
        total = total.filter(
            account::first_name
                .ilike(pattern.clone())
                .or(account::last_name.ilike(pattern.clone()))
                .or(account::email.ilike(pattern)),
        );
    }

    let count = total.get_result::<i64>(conn).await?;
    let items = rows
        .order(account::created_at.desc())
        .limit(per_page)
        .offset((page - 1) * per_page)
        .load(conn)
        .await?;

    Ok((items, count))
}

/// Aggregate numbers shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DashboardCounts {
    pub users: i64,
    pub attorneys: i64,
    pub verified_users: i64,
    pub linked_accounts: i64,
}

/// ## Summary
/// Collects the dashboard counters over live rows.
///
/// ## Errors
/// Returns a database error if any of the counts fail.
pub async fn dashboard_counts(conn: &mut DbConnection<'_>) -> diesel::QueryResult<DashboardCounts> {
    let users = account::table
        .filter(account::role.eq(AccountRole::User))
        .filter(account::is_deleted.eq(false))
        .count()
        .get_result::<i64>(conn)
        .await?;

    let attorneys = account::table
        .filter(account::role.eq(AccountRole::Attorney))
        .filter(account::is_deleted.eq(false))
        .count()
        .get_result::<i64>(conn)
        .await?;

    let verified_users = account::table
        .filter(account::role.eq(AccountRole::User))
        .filter(account::is_deleted.eq(false))
        .filter(account::is_verified.eq(true))
        .count()
        .get_result::<i64>(conn)
        .await?;

    let linked_accounts = account::table
        .filter(account::is_deleted.eq(false))
        .filter(account::clio_contact_id.is_not_null())
        .count()
        .get_result::<i64>(conn)
        .await?;

    Ok(DashboardCounts {
        users,
        attorneys,
        verified_users,
        linked_accounts,
    })
}
