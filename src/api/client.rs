//! API client for communicating with the Account API.
//!
//! This module provides the `ApiClient` struct for the credential
//! exchange, identity, profile, registration, and password reset
//! endpoints. It holds no session state: tokens are passed in by the
//! session manager per call.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::models::{Identity, Profile, ProfileTextUpdate};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Access/refresh credential pair returned by `POST /api/token/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

/// API client for the account service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the given base URL
    /// (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Exchange username/password for an access/refresh pair
    pub async fn obtain_token(&self, username: &str, password: &str) -> Result<TokenPair> {
        let url = format!("{}/api/token/", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .context("Failed to send token request")?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse token response")
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh_token(&self, refresh: &str) -> Result<String> {
        let url = format!("{}/api/token/refresh/", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await
            .context("Failed to send token refresh request")?;

        let response = Self::check_response(response).await?;

        let parsed: RefreshResponse = response
            .json()
            .await
            .context("Failed to parse token refresh response")?;
        Ok(parsed.access)
    }

    /// Fetch the authenticated user's identity
    pub async fn fetch_current_user(&self, access: &str) -> Result<Identity> {
        let url = format!("{}/api/me/", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access)
            .send()
            .await
            .context("Failed to send current-user request")?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse current-user response")
    }

    /// Fetch the authenticated user's extended profile
    pub async fn fetch_profile(&self, access: &str) -> Result<Profile> {
        let url = format!("{}/api/user-profile/", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access)
            .send()
            .await
            .context("Failed to send profile request")?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse profile response")
    }

    /// Update the text fields of the profile
    pub async fn update_profile_text(
        &self,
        access: &str,
        update: &ProfileTextUpdate,
    ) -> Result<Profile> {
        let url = format!("{}/api/user-profile/text/", self.base_url);

        let response = self
            .client
            .put(&url)
            .bearer_auth(access)
            .json(update)
            .send()
            .await
            .context("Failed to send profile text update")?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse profile update response")
    }

    /// Upload a new avatar image as a multipart form
    pub async fn update_profile_avatar(
        &self,
        access: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Profile> {
        let url = format!("{}/api/user-profile/avatar/", self.base_url);

        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("avatar", part);

        let response = self
            .client
            .put(&url)
            .bearer_auth(access)
            .multipart(form)
            .send()
            .await
            .context("Failed to send avatar update")?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse avatar update response")
    }

    /// Register a new account. Returns the server confirmation message.
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<String> {
        let url = format!("{}/api/register/", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "first_name": first_name,
                "last_name": last_name,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .context("Failed to send registration request")?;

        let response = Self::check_response(response).await?;

        let parsed: MessageResponse = response
            .json()
            .await
            .context("Failed to parse registration response")?;
        Ok(parsed.message)
    }

    /// Invalidate a refresh token server-side
    pub async fn logout(&self, refresh: &str) -> Result<()> {
        let url = format!("{}/api/logout/", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await
            .context("Failed to send logout request")?;

        Self::check_response(response).await?;
        debug!("Refresh token invalidated server-side");
        Ok(())
    }

    /// Request a password reset email
    pub async fn request_password_reset(&self, email: &str) -> Result<String> {
        let url = format!("{}/api/password-reset/", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .context("Failed to send password reset request")?;

        let response = Self::check_response(response).await?;

        let parsed: MessageResponse = response
            .json()
            .await
            .context("Failed to parse password reset response")?;
        Ok(parsed.message)
    }

    /// Confirm a password reset with the emailed token
    pub async fn confirm_password_reset(&self, token: &str, password: &str) -> Result<String> {
        let url = format!("{}/api/password-reset-confirm/", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "token": token,
                "password": password,
            }))
            .send()
            .await
            .context("Failed to send password reset confirmation")?;

        let response = Self::check_response(response).await?;

        let parsed: MessageResponse = response
            .json()
            .await
            .context("Failed to parse password reset confirmation")?;
        Ok(parsed.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_obtain_token_parses_pair() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/token/")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "username": "ada@example.com"
            })))
            .with_status(200)
            .with_body(r#"{"access": "acc-1", "refresh": "ref-1"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).expect("Failed to build client");
        let pair = client
            .obtain_token("ada@example.com", "secret")
            .await
            .expect("Token exchange failed");

        assert_eq!(pair.access, "acc-1");
        assert_eq!(pair.refresh, "ref-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_obtain_token_surfaces_field_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/token/")
            .with_status(401)
            .with_body(r#"{"non_field_errors": ["Invalid credentials"]}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).expect("Failed to build client");
        let err = client
            .obtain_token("ada@example.com", "wrongpass")
            .await
            .expect_err("Expected token exchange to fail");

        let api_err = err
            .downcast_ref::<ApiError>()
            .expect("Expected an ApiError");
        assert_eq!(api_err.user_message(), Some("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_fetch_current_user_sends_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/me/")
            .match_header("authorization", "Bearer acc-1")
            .with_status(200)
            .with_body(r#"{"id": 1, "first_name": "Ada", "last_name": null,
                           "email": "ada@example.com", "username": null}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).expect("Failed to build client");
        let identity = client
            .fetch_current_user("acc-1")
            .await
            .expect("Identity fetch failed");

        assert_eq!(identity.id, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_token_returns_access() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/token/refresh/")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "refresh": "ref-1"
            })))
            .with_status(200)
            .with_body(r#"{"access": "acc-2"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).expect("Failed to build client");
        let access = client.refresh_token("ref-1").await.expect("Refresh failed");
        assert_eq!(access, "acc-2");
    }
}
