pub mod app;
pub mod extract;
pub mod rate_limit;
pub mod route_auth;

// vim: ts=4
