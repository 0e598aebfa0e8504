//! Backend abstraction.
//!
//! This module provides a `Backend` trait for the two calls the upload
//! workflow makes (upload, result check), the JSON shapes exchanged with the
//! backend, and an HTTP implementation on top of reqwest.

mod http;
mod types;

pub use http::HttpBackend;
pub use types::*;
