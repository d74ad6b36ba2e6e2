//! REST client for the cheers auth backend.
//!
//! Covers account creation, login, OTP verification and resend, password
//! reset, and access token refresh. Requests are never retried.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_API_BASE_URL};
pub use error::ApiError;
