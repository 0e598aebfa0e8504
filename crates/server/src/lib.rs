//! Development backend for the BookOpt upload client.
//!
//! Implements the upload, result and echo endpoints over local directories
//! standing in for storage buckets. The optimizer that fills the derived
//! buckets runs elsewhere.

pub mod api;
pub mod signing;
pub mod state;
pub mod storage;

pub use api::create_router;
pub use state::AppState;
