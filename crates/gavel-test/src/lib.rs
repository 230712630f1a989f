//! Gavel legal-services server - integration test support.
//!
//! This crate re-exports the workspace crates to support integration tests
//! that use `gavel::` paths.

#![allow(ambiguous_glob_reexports)]

pub mod component {
    // Re-export core and service modules at the component level
    pub use gavel_core::*;
    pub use gavel_service::*;

    // Re-export db crate with all its public modules
    pub mod db {
        pub use gavel_db::db::*;

        // Additional db handlers from app
        pub mod connection {
            pub use gavel_app::db_handler::DbProviderHandler;
            pub use gavel_db::db::connection::*;
        }
    }

    // Re-export models
    pub mod model {
        pub use gavel_db::model::*;
    }

    // Re-export app middleware and handlers
    pub mod middleware {
        pub use gavel_app::middleware::*;
    }

    // Re-export config from both core and app
    pub mod config {
        pub use gavel_app::config::ConfigHandler;
        pub use gavel_core::config::*;
    }

    // The service error taxonomy; the core error rides along inside it
    pub mod error {
        pub use gavel_service::error::*;
    }
}

// Re-export top-level modules for convenience
pub mod app {
    pub use gavel_app::*;

    pub mod api {
        pub use gavel_app::app::api::*;
    }
}
