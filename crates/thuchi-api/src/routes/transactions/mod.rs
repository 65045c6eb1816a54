//! Transaction routes - list, detail, edit, delete and reload
//!
//! Structure:
//! - api.rs: JSON API endpoints

pub mod api;

pub use api::{
    api_reload,
    api_transaction_delete,
    api_transaction_detail,
    api_transaction_update,
    api_transactions,
};
