use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::db::schema;

/// One live session per account. `token_id` is the jti embedded in issued
/// bearer tokens; reissuing overwrites it and bumps `version`, which is the
/// sole revocation mechanism.
#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::session)]
#[diesel(primary_key(account_id))]
#[diesel(check_for_backend(Pg))]
pub struct Session {
    pub account_id: uuid::Uuid,
    pub token_id: String,
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::session)]
pub struct NewSession<'a> {
    pub account_id: uuid::Uuid,
    pub token_id: &'a str,
}
