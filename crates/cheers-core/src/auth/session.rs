use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{AuthTokens, User};
use crate::store::{SessionKey, StoreError, TokenStore};
use crate::token;

use super::{AuthState, Phase};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0} must not be empty")]
    EmptyToken(SessionKey),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Stored user record is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a refresh attempt gave up. Logged, never returned to callers.
#[derive(Error, Debug)]
enum RefreshError {
    #[error("no refresh token stored")]
    NoRefreshToken,

    #[error("refresh token expired")]
    RefreshTokenExpired,

    #[error("refresh endpoint returned an empty access token")]
    EmptyAccessToken,

    #[error("refresh request failed: {0}")]
    Api(#[from] ApiError),

    #[error("could not read or write tokens: {0}")]
    Store(#[from] StoreError),
}

/// Owns the persisted session and the auth state derived from it.
///
/// Created once by the application root. Screens get a receiver from
/// [`SessionManager::subscribe`] and re-render whenever a transition is
/// committed. Raw tokens only leave through [`SessionManager::access_token`],
/// which is meant for API callers, not the UI.
pub struct SessionManager<S> {
    store: S,
    api: ApiClient,
    state: watch::Sender<AuthState>,
}

impl<S: TokenStore> SessionManager<S> {
    pub fn new(store: S, api: ApiClient) -> Self {
        let (state, _) = watch::channel(AuthState::LOADING);
        Self { store, api, state }
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    pub fn phase(&self) -> Phase {
        self.state().phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated
    }

    /// Receiver that observes every committed state
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn commit(&self, update: impl FnOnce(&mut AuthState)) {
        self.state.send_modify(update);
        debug!(state = ?self.state(), "Auth state committed");
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Store a token pair obtained from the backend and mark the session
    /// authenticated. On a storage error the state is left unchanged.
    pub fn login(&mut self, access_token: &str, refresh_token: &str) -> Result<(), SessionError> {
        self.persist_tokens(access_token, refresh_token)?;
        self.commit(|s| {
            s.is_authenticated = true;
            s.loading = false;
        });
        info!("Logged in");
        Ok(())
    }

    /// [`login`](Self::login) with a backend response, caching its user record.
    pub fn login_with(&mut self, tokens: &AuthTokens) -> Result<(), SessionError> {
        self.login(&tokens.access_token, &tokens.refresh_token)?;
        self.persist_user(tokens.user.as_ref())
    }

    /// Like [`login`](Self::login), and also ends the pending registration.
    pub fn verify_otp(&mut self, access_token: &str, refresh_token: &str) -> Result<(), SessionError> {
        self.persist_tokens(access_token, refresh_token)?;
        self.commit(|s| {
            s.is_authenticated = true;
            s.is_registered = false;
            s.loading = false;
        });
        info!("OTP verified, logged in");
        Ok(())
    }

    pub fn verify_otp_with(&mut self, tokens: &AuthTokens) -> Result<(), SessionError> {
        self.verify_otp(&tokens.access_token, &tokens.refresh_token)?;
        self.persist_user(tokens.user.as_ref())
    }

    /// Record that an account was created and is awaiting OTP verification.
    pub fn register(&mut self) {
        self.commit(|s| s.is_registered = true);
        info!("Registration pending OTP verification");
    }

    /// Remove every persisted session key and sign out.
    ///
    /// The state is always signed out afterwards. Deletes are best effort:
    /// a failure on one key does not stop the others or restore anything,
    /// and the first failure is returned once the state is committed.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        let cleared = self.store.clear_session();
        self.commit(|s| *s = AuthState::SIGNED_OUT);
        match cleared {
            Ok(()) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logged out, but session storage was not fully cleared");
                Err(e.into())
            }
        }
    }

    /// Startup check: decide from persisted tokens whether the user is
    /// signed in, refreshing an expired access token when possible.
    ///
    /// Never fails. Any storage, decoding or network problem ends in the
    /// signed-out state, and `loading` is always false afterwards.
    pub async fn check_auth(&mut self) -> AuthState {
        let authenticated = match self.store.get(SessionKey::AccessToken) {
            Ok(None) => {
                debug!("No stored access token");
                false
            }
            Ok(Some(access_token)) if !token::is_expired(&access_token) => {
                debug!("Stored access token is valid");
                true
            }
            Ok(Some(_)) => {
                debug!("Stored access token expired, attempting refresh");
                self.refresh_or_logout().await.is_some()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored access token");
                false
            }
        };

        self.commit(|s| {
            s.is_authenticated = authenticated;
            s.loading = false;
        });
        self.state()
    }

    /// Current access token for an API call, refreshed if it has expired.
    ///
    /// Returns `Ok(None)` when there is no usable session; if refreshing
    /// failed the session has been logged out. Only a failure to read the
    /// stored token is returned as an error.
    pub async fn access_token(&mut self) -> Result<Option<String>, SessionError> {
        let Some(access_token) = self.store.get(SessionKey::AccessToken)? else {
            if self.is_authenticated() {
                warn!("Access token vanished from storage");
                self.commit(|s| s.is_authenticated = false);
            }
            return Ok(None);
        };

        if !token::is_expired(&access_token) {
            return Ok(Some(access_token));
        }

        debug!("Access token expired, refreshing on demand");
        let refreshed = self.refresh_or_logout().await;
        if refreshed.is_some() {
            self.commit(|s| s.is_authenticated = true);
        }
        Ok(refreshed)
    }

    // =========================================================================
    // User record
    // =========================================================================

    /// The cached user record, if one was stored at login.
    pub fn user(&self) -> Result<Option<User>, SessionError> {
        match self.store.get(SessionKey::User)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn set_user(&mut self, user: &User) -> Result<(), SessionError> {
        let json = serde_json::to_string(user)?;
        self.store.set(SessionKey::User, &json)?;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn persist_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), SessionError> {
        if access_token.is_empty() {
            return Err(SessionError::EmptyToken(SessionKey::AccessToken));
        }
        if refresh_token.is_empty() {
            return Err(SessionError::EmptyToken(SessionKey::RefreshToken));
        }
        // The access token alone authenticates startup, so it goes in last
        self.store.set(SessionKey::RefreshToken, refresh_token)?;
        if let Err(e) = self.store.set(SessionKey::AccessToken, access_token) {
            if let Err(cleanup) = self.store.delete(SessionKey::AccessToken) {
                warn!(error = %cleanup, "Failed to remove access token after failed login");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn persist_user(&mut self, user: Option<&User>) -> Result<(), SessionError> {
        match user {
            Some(user) => self.set_user(user),
            None => Ok(()),
        }
    }

    /// Refresh the access token, logging out if that is impossible.
    async fn refresh_or_logout(&mut self) -> Option<String> {
        match self.refresh().await {
            Ok(access_token) => {
                info!("Access token refreshed");
                Some(access_token)
            }
            Err(e) => {
                warn!(error = %e, "Session could not be refreshed, logging out");
                // logout() already logs partial failures
                let _ = self.logout();
                None
            }
        }
    }

    async fn refresh(&self) -> Result<String, RefreshError> {
        let refresh_token = self
            .store
            .get(SessionKey::RefreshToken)?
            .ok_or(RefreshError::NoRefreshToken)?;
        if token::is_expired(&refresh_token) {
            return Err(RefreshError::RefreshTokenExpired);
        }

        let response = self.api.refresh_access_token(&refresh_token).await?;
        if response.access_token.is_empty() {
            return Err(RefreshError::EmptyAccessToken);
        }

        self.store.set(SessionKey::AccessToken, &response.access_token)?;
        if let Some(rotated) = response.refresh_token.filter(|t| !t.is_empty()) {
            self.store.set(SessionKey::RefreshToken, &rotated)?;
        }
        Ok(response.access_token)
    }
}
