//! Authenticated HTTP client for the Langsys translation manager API
//!
//! Provides [`LangsysClient`], a reqwest-based client with connection
//! pooling, per-second rate limiting, and retry on transient failures, plus
//! the [`TranslationApi`] trait the synchronization engine consumes.

pub mod client;
pub mod traits;

pub use client::{ApiConfig, ApiResponse, LangsysClient, DEFAULT_BASE_URL};
pub use traits::TranslationApi;
