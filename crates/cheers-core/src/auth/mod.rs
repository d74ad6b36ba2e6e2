//! Authentication session lifecycle.
//!
//! This module provides:
//! - `SessionManager`: login, OTP verification, logout, startup check,
//!   and refresh-on-demand over a `TokenStore`
//! - `AuthState` / `Phase`: the derived state screens render from
//!
//! Tokens are inspected for expiry only; signatures are the backend's concern.

pub mod session;
pub mod state;

pub use session::{SessionError, SessionManager};
pub use state::{AuthState, Phase};
