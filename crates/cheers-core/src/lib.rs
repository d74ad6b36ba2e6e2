//! Core library for the cheers mobile client.
//!
//! Holds everything below the UI: the session manager and its token
//! storage, the auth API client, shared models, and configuration.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod store;
pub mod token;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthState, Phase, SessionError, SessionManager};
pub use config::{Config, StorageBackend};
pub use models::{AuthTokens, RegisterRequest, User};
pub use store::{FileStore, KeychainStore, MemoryStore, SessionKey, StoreError, TokenStore};
