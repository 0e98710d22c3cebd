//! HTTP client for the anime-tracking backend.
//!
//! [`ApiClient`] talks to the real REST service. The stores in
//! `shiori-runtime` only see the traits in [`traits`], so they can run against
//! any backend.

pub mod auth;
pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
