//! Session routes - login, logout and login state
//!
//! Structure:
//! - api.rs: JSON API endpoints

pub mod api;

pub use api::{api_login, api_logout, api_session, require_login};
