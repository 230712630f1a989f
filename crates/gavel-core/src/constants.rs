/// Route component constants shared across crates
pub const USER_ROUTE_COMPONENT: &str = "user";
pub const USER_ROUTE_PREFIX: &str = const_str::concat!("/", USER_ROUTE_COMPONENT);

pub const ADMIN_ROUTE_COMPONENT: &str = "admin";
pub const ADMIN_ROUTE_PREFIX: &str = const_str::concat!("/", ADMIN_ROUTE_COMPONENT);

pub const CLIO_ROUTE_COMPONENT: &str = "clio";
pub const CLIO_ROUTE_PREFIX: &str = const_str::concat!("/", CLIO_ROUTE_COMPONENT);

pub const DOCUMENT_ROUTE_COMPONENT: &str = "document";
pub const DOCUMENT_ROUTE_PREFIX: &str = const_str::concat!("/", DOCUMENT_ROUTE_COMPONENT);

pub const HEALTHCHECK_ROUTE_COMPONENT: &str = "healthcheck";
