//! Queries against the session table.

use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::session;
use crate::model::session::{NewSession, Session};

/// ## Summary
/// Installs a fresh token id for the account, superseding any live session.
/// The upsert bumps `version` on every reissue, so the row doubles as a
/// monotonic login counter.
///
/// ## Errors
/// Returns a database error if the upsert fails.
pub async fn upsert(
    conn: &mut DbConnection<'_>,
    account_id: uuid::Uuid,
    token_id: &str,
) -> diesel::QueryResult<Session> {
    diesel::insert_into(session::table)
        .values(&NewSession {
            account_id,
            token_id,
        })
        .on_conflict(session::account_id)
        .do_update()
        .set((
            session::token_id.eq(excluded(session::token_id)),
            session::version.eq(session::version + 1),
        ))
        .returning(Session::as_returning())
        .get_result(conn)
        .await
}

pub async fn find(
    conn: &mut DbConnection<'_>,
    account_id: uuid::Uuid,
) -> diesel::QueryResult<Option<Session>> {
    session::table
        .find(account_id)
        .select(Session::as_select())
        .first(conn)
        .await
        .optional()
}

/// Revokes the live session by dropping the row. Outstanding tokens fail the
/// token-id comparison from then on.
pub async fn delete(
    conn: &mut DbConnection<'_>,
    account_id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(session::table.find(account_id))
        .execute(conn)
        .await
}
