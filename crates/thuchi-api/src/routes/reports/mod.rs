//! Report routes - stats, dashboard and filter options
//!
//! Structure:
//! - api.rs: JSON API endpoints

pub mod api;

pub use api::{api_dashboard, api_filter_options, api_stats};
