//! Persistence layer: connection pooling, schema, models, and queries for
//! the account record store.

pub mod db;
pub mod error;
pub mod model;
