//! Transaction helper utilities for database operations.
//!
//! ## Usage
//!
//! Diesel-async provides built-in transaction support through the `AsyncConnection::transaction` method.
//! To use transactions, wrap your database operations in a closure:
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use crate::db::transaction::with_transaction;
//!
//! with_transaction(&mut conn, |conn| async move {
//!     // Your database operations here
//!     account::consume_otp(conn, account_id, true).await?;
//!     session::upsert(conn, account_id, &token_id).await?;
//!     Ok(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, scoped_futures::ScopedBoxFuture};

use crate::db::connection::DbConnection;

/// ## Summary
/// Runs a database transaction and returns the closure result.
///
/// The error type is anything convertible from a diesel error, so callers can
/// thread their own error enum through the closure.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, 'conn, T, E, F>(
    conn: &'a mut DbConnection<'conn>,
    callback: F,
) -> Result<T, E>
where
    F: for<'r> FnOnce(&'r mut DbConnection<'conn>) -> ScopedBoxFuture<'a, 'r, Result<T, E>>
        + Send
        + 'a,
    E: From<diesel::result::Error> + Send + 'a,
    T: Send + 'a,
{
    conn.transaction::<T, E, _>(callback).await
}
