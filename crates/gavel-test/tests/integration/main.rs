//! Integration tests for the HTTP API.
//!
//! Suites that touch Postgres are marked `#[ignore]`; run them with
//! `cargo test -- --ignored` against the docker-compose test database (or
//! point `TEST_DATABASE_URL` somewhere else).

mod helpers;

mod billing;
mod documents;
mod login;
mod profile;
mod routing;
