use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use gavel_core::error::CoreError;

use crate::db::schema;

// Re-export the column enums for public API
pub use crate::db::enums::{AccountRole, DeviceKind, OtpPurpose, SocialProvider};

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::account)]
#[diesel(check_for_backend(Pg))]
#[expect(clippy::struct_excessive_bools)] // Mirrors the table's independent state flags
pub struct Account {
    pub id: uuid::Uuid,
    pub role: AccountRole,
    pub email: String,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub social_provider: Option<SocialProvider>,
    pub social_id: Option<String>,
    pub is_verified: bool,
    pub otp_verified: bool,
    pub otp_code: Option<i32>,
    pub otp_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub otp_purpose: Option<OtpPurpose>,
    pub device_token: Option<String>,
    pub device_kind: Option<DeviceKind>,
    pub is_deleted: bool,
    pub is_deactivated: bool,
    pub clio_contact_id: Option<i64>,
    pub clio_matter_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub physical_address: Option<String>,
    pub mailing_address: Option<String>,
    pub profile_image: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub point_value: Option<f64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// One-time-code state of an account, projected from the three OTP columns.
///
/// `Verified` is the consumed-code freshness proof awaiting a privileged
/// operation (change password after a reset code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpState {
    NoPending,
    Pending {
        code: i32,
        expires_at: chrono::DateTime<chrono::Utc>,
        purpose: OtpPurpose,
    },
    Verified,
}

impl Account {
    /// ## Summary
    /// Projects the OTP columns into their tagged state. The table CHECK
    /// keeps the three columns set or cleared together, so a partial slot
    /// can only mean the row was written outside this crate.
    ///
    /// ## Errors
    /// Returns `CoreError::InvariantViolation` for a partially populated slot.
    pub fn otp_state(&self) -> Result<OtpState, CoreError> {
        match (self.otp_code, self.otp_expires_at, self.otp_purpose) {
            (Some(code), Some(expires_at), Some(purpose)) => Ok(OtpState::Pending {
                code,
                expires_at,
                purpose,
            }),
            (None, None, None) if self.otp_verified => Ok(OtpState::Verified),
            (None, None, None) => Ok(OtpState::NoPending),
            _ => Err(CoreError::InvariantViolation(
                "otp_code, otp_expires_at, and otp_purpose must be set or cleared together",
            )),
        }
    }

    /// Returns the display name assembled from the name columns.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = schema::account)]
pub struct NewAccount<'a> {
    pub id: uuid::Uuid,
    pub role: AccountRole,
    pub email: &'a str,
    pub country_code: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub social_provider: Option<SocialProvider>,
    pub social_id: Option<&'a str>,
    pub is_verified: bool,
    pub device_token: Option<&'a str>,
    pub device_kind: Option<DeviceKind>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::account)]
pub struct AccountPatch<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub country_code: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub physical_address: Option<&'a str>,
    pub mailing_address: Option<&'a str>,
    pub profile_image: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl AccountPatch<'_> {
    /// Reports whether the patch carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.country_code.is_none()
            && self.phone.is_none()
            && self.physical_address.is_none()
            && self.mailing_address.is_none()
            && self.profile_image.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}
