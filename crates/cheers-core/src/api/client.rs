//! API client for the auth endpoints of the cheers backend.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::debug;

use crate::models::{AuthTokens, RefreshResponse, RegisterRequest};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Production API base URL, used when the config does not override it
pub const DEFAULT_API_BASE_URL: &str = "https://api.cheers.app";

const REFRESH_PATH: &str = "/auth/refresh";
const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const VERIFY_OTP_PATH: &str = "/auth/verify-otp";
const RESEND_OTP_PATH: &str = "/auth/resend-otp";
const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

/// API client for the cheers backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client using the HTTP library's default timeouts
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::build(base_url.into(), None)
    }

    /// Create a client that gives up on requests after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Self::build(base_url.into(), Some(timeout))
    }

    fn build(base_url: String, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =========================================================================
    // Endpoints
    // =========================================================================

    /// Exchange a refresh token for a new access token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        self.post_json(REFRESH_PATH, &json!({ "refreshToken": refresh_token }))
            .await
    }

    /// Log in with phone number and password
    pub async fn login(&self, phone: &str, password: &str) -> Result<AuthTokens, ApiError> {
        self.post_json(LOGIN_PATH, &json!({ "phone": phone, "password": password }))
            .await
    }

    /// Create an account. The backend then sends an OTP to the phone.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.post_empty(REGISTER_PATH, request).await
    }

    /// Confirm the OTP sent after registration
    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<AuthTokens, ApiError> {
        self.post_json(VERIFY_OTP_PATH, &json!({ "phone": phone, "otp": otp }))
            .await
    }

    pub async fn resend_otp(&self, phone: &str) -> Result<(), ApiError> {
        self.post_empty(RESEND_OTP_PATH, &json!({ "phone": phone }))
            .await
    }

    /// Ask the backend to send a password reset code
    pub async fn request_password_reset(&self, phone: &str) -> Result<(), ApiError> {
        self.post_empty(FORGOT_PASSWORD_PATH, &json!({ "phone": phone }))
            .await
    }

    pub async fn reset_password(&self, phone: &str, otp: &str, new_password: &str) -> Result<(), ApiError> {
        self.post_empty(
            RESET_PASSWORD_PATH,
            &json!({ "phone": phone, "otp": otp, "newPassword": new_password }),
        )
        .await
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response, ApiError> {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        Self::check_response(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.post(path, body).await?.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} returned unexpected body: {}", path, e)))
    }

    async fn post_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.post(path, body).await?;
        Ok(())
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("https://api.example.com/v1/").expect("client");
        assert_eq!(client.base_url(), "https://api.example.com/v1");
        assert_eq!(client.url(REFRESH_PATH), "https://api.example.com/v1/auth/refresh");
    }

    #[tokio::test]
    async fn test_refresh_sends_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({ "refreshToken": "r1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        let resp = client.refresh_access_token("r1").await.expect("refresh");
        assert_eq!(resp.access_token, "a2");
    }

    #[tokio::test]
    async fn test_non_success_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        let err = client.login("+15551234567", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_wrong_otp_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-otp"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid or expired code" })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        let err = client.verify_otp("+15551234567", "000000").await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(m) if m == "Invalid or expired code"));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-otp"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        let err = client.verify_otp("+15551234567", "123456").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_body_endpoints_ignore_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/reset-password"))
            .and(body_json(json!({ "phone": "+1555", "otp": "0000", "newPassword": "s3cret!" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/resend-otp"))
            .respond_with(ResponseTemplate::new(200).set_body_string("sent"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        client.reset_password("+1555", "0000", "s3cret!").await.expect("reset");
        client.resend_otp("+1555").await.expect("resend");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) is not listening on test machines
        let client = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).expect("client");
        let err = client.request_password_reset("+1555").await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));
    }
}
