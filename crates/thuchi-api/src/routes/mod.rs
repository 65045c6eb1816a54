//! Route modules for the API server
//!
//! - session: login, logout, login guard
//! - transactions: list, detail, edit, delete, reload
//! - reports: stats, dashboard, filter options
//!
//! Each module follows the same structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints

pub mod reports;
pub mod session;
pub mod transactions;
