//! Client-facing account projection and profile updates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gavel_db::db::connection::DbConnection;
use gavel_db::db::query::account;
use gavel_db::model::account::{Account, AccountPatch, AccountRole};

use crate::clio::client::ClioClient;
use crate::clio::linkage::{self, ContactPatchFields};
use crate::error::{ServiceError, ServiceResult};

/// Account fields safe to hand to clients. Credentials, the OTP slot, and
/// the device binding never leave the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub role: AccountRole,
    pub email: String,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub physical_address: Option<String>,
    pub mailing_address: Option<String>,
    pub profile_image: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub clio_contact_id: Option<i64>,
    pub clio_matter_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Profile {
    /// Projects an account row, rendering the stored image object name as an
    /// absolute URL under the public origin.
    #[must_use]
    pub fn from_account(account: &Account, origin: &str) -> Self {
        Self {
            id: account.id,
            role: account.role,
            email: account.email.clone(),
            country_code: account.country_code.clone(),
            phone: account.phone.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            physical_address: account.physical_address.clone(),
            mailing_address: account.mailing_address.clone(),
            profile_image: account
                .profile_image
                .as_deref()
                .map(|image| image_url(origin, image)),
            latitude: account.latitude,
            longitude: account.longitude,
            is_verified: account.is_verified,
            clio_contact_id: account.clio_contact_id,
            clio_matter_id: account.clio_matter_id,
            created_at: account.created_at,
        }
    }
}

fn image_url(origin: &str, stored: &str) -> String {
    if stored.starts_with("http://") || stored.starts_with("https://") {
        stored.to_string()
    } else {
        format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            stored.trim_start_matches('/')
        )
    }
}

/// Partial profile update payload. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub physical_address: Option<String>,
    pub mailing_address: Option<String>,
    pub profile_image: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// ## Summary
/// Applies a partial profile update, pushing contact-visible fields to the
/// linked external contact first.
///
/// The remote patch must succeed before anything lands locally, so the two
/// representations cannot drift apart on a failed call. Unlinked accounts
/// update locally only.
///
/// ## Errors
/// Returns `NotFound` for missing accounts and propagates external-service
/// and database errors.
pub async fn update_profile(
    conn: &mut DbConnection<'_>,
    clio: &ClioClient,
    origin: &str,
    account_id: Uuid,
    request: &ProfileUpdateRequest,
) -> ServiceResult<Profile> {
    let Some(existing) = account::find_live_by_id(conn, account_id).await? else {
        return Err(ServiceError::NotFound("Account not found".to_string()));
    };

    if let Some(contact_id) = existing.clio_contact_id {
        let fields = ContactPatchFields {
            first_name: request.first_name.as_deref(),
            last_name: request.last_name.as_deref(),
            phone: request.phone.as_deref(),
            physical_address: request.physical_address.as_deref(),
            mailing_address: request.mailing_address.as_deref(),
        };
        if !fields.is_empty() {
            linkage::update_contact_profile(clio, contact_id, &fields).await?;
        }
    }

    let patch = AccountPatch {
        first_name: request.first_name.as_deref(),
        last_name: request.last_name.as_deref(),
        country_code: request.country_code.as_deref(),
        phone: request.phone.as_deref(),
        physical_address: request.physical_address.as_deref(),
        mailing_address: request.mailing_address.as_deref(),
        profile_image: request.profile_image.as_deref(),
        latitude: request.latitude,
        longitude: request.longitude,
    };

    let Some(updated) = account::apply_patch(conn, account_id, &patch).await? else {
        return Err(ServiceError::NotFound("Account not found".to_string()));
    };

    Ok(Profile::from_account(&updated, origin))
}
