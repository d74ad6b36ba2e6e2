use serde::{Deserialize, Serialize};

/// Authentication state the UI renders from.
///
/// Derived on every lifecycle transition and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    /// An account was just created and is waiting on OTP verification
    pub is_registered: bool,
    /// Startup check has not finished yet
    pub loading: bool,
}

impl AuthState {
    /// State before the startup check has run.
    pub const LOADING: AuthState = AuthState {
        is_authenticated: false,
        is_registered: false,
        loading: true,
    };

    pub const SIGNED_OUT: AuthState = AuthState {
        is_authenticated: false,
        is_registered: false,
        loading: false,
    };

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.is_authenticated {
            Phase::Authenticated
        } else {
            Phase::Unauthenticated
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::LOADING
    }
}

/// Coarse lifecycle phase, for deciding which screen stack to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum Phase {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl Phase {
    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Authenticated => "signed in",
            Phase::Unauthenticated => "signed out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_loading() {
        assert_eq!(AuthState::default(), AuthState::LOADING);
        assert_eq!(AuthState::default().phase(), Phase::Loading);
    }

    #[test]
    fn test_phase_derivation() {
        assert_eq!(AuthState::SIGNED_OUT.phase(), Phase::Unauthenticated);
        let signed_in = AuthState {
            is_authenticated: true,
            ..AuthState::SIGNED_OUT
        };
        assert_eq!(signed_in.phase(), Phase::Authenticated);
        // loading wins over everything else
        let refreshing = AuthState {
            loading: true,
            ..signed_in
        };
        assert_eq!(refreshing.phase(), Phase::Loading);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(AuthState::LOADING).expect("serialize");
        assert_eq!(json["isAuthenticated"], false);
        assert_eq!(json["isRegistered"], false);
        assert_eq!(json["loading"], true);
    }
}
