//! REST adapter for the hosted auth service (GoTrue-compatible `/auth/v1` API).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use launchpad_core::auth::{
    AuthError, IdentityProvider, Result, Session, SignUpOutcome, User, UserMetadata,
};
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use url::Url;

use crate::config::AuthConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to the provider's auth REST API with the project's anon key.
#[derive(Clone)]
pub struct GoTrueProvider {
    http_client: reqwest::Client,
    auth_base: Url,
    anon_key: String,
}

impl GoTrueProvider {
    /// Creates the provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the provider
    /// URL cannot be extended with the auth API path.
    pub fn new(config: &AuthConfig) -> std::result::Result<Self, crate::AuthError> {
        let http_client = reqwest::ClientBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| crate::AuthError::Http(format!("Failed to build HTTP client: {e}")))?;

        let auth_base = config
            .provider_url
            .join("auth/v1/")
            .map_err(|e| crate::AuthError::Http(e.to_string()))?;

        Ok(Self {
            http_client,
            auth_base,
            anon_key: config.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.auth_base
            .join(path)
            .map_err(|e| AuthError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    fn post(&self, url: Url, bearer: Option<&str>) -> RequestBuilder {
        self.http_client
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(self.anon_key.as_str()))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        Ok(())
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let token: TokenResponse = self.send_json(self.post(url, None).json(&body)).await?;
        Ok(token.into_session(Utc::now()))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        tracing::debug!(email = %email, "Password sign-in");
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
        email_redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome> {
        let mut url = self.endpoint("signup")?;
        if let Some(redirect_to) = email_redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        }

        let body = json!({
            "email": email,
            "password": password,
            "data": metadata,
        });

        let value: serde_json::Value = self.send_json(self.post(url, None).json(&body)).await?;
        parse_sign_up(value)
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = self.endpoint("logout")?;
        self.send_empty(self.post(url, Some(access_token))).await
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<()> {
        let mut url = self.endpoint("recover")?;
        if let Some(redirect_to) = redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        }

        self.send_empty(self.post(url, None).json(&json!({ "email": email })))
            .await
    }

    async fn get_user(&self, access_token: &str) -> Result<User> {
        let url = self.endpoint("user")?;
        let request = self
            .http_client
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        self.send_json(request).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + chrono::Duration::seconds(self.expires_in));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up answers with a full token response when email confirmation is
/// off, and with the bare user record when it is on.
fn parse_sign_up(value: serde_json::Value) -> Result<SignUpOutcome> {
    let invalid = |e: serde_json::Error| AuthError::InvalidResponse(e.to_string());

    if value.get("access_token").is_some() {
        let token: TokenResponse = serde_json::from_value(value).map_err(invalid)?;
        return Ok(SignUpOutcome::SignedIn(token.into_session(Utc::now())));
    }

    let nested = if value.get("id").is_none() {
        value.get("user").cloned()
    } else {
        None
    };
    let user = nested.unwrap_or(value);

    serde_json::from_value(user)
        .map(SignUpOutcome::ConfirmationRequired)
        .map_err(invalid)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::Transport("auth provider timed out".to_string())
    } else {
        AuthError::Transport(e.to_string())
    }
}

/// Maps a non-success provider response onto the error taxonomy.
fn error_from_response(status: StatusCode, body: &str) -> AuthError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let message = parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or_else(|| parsed.error.clone())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    let code = parsed.error_code.or(parsed.error).unwrap_or_default();
    let lowered = message.to_lowercase();

    match code.as_str() {
        "invalid_credentials" => return AuthError::InvalidCredentials,
        "email_not_confirmed" => return AuthError::EmailNotConfirmed,
        "user_already_exists" | "email_exists" => return AuthError::UserAlreadyExists,
        "weak_password" => return AuthError::WeakPassword(message),
        "over_request_rate_limit" | "over_email_send_rate_limit" => {
            return AuthError::RateLimited
        }
        "refresh_token_not_found"
        | "refresh_token_already_used"
        | "session_not_found"
        | "session_expired"
        | "bad_jwt" => return AuthError::Unauthorized,
        _ => {}
    }

    if lowered.contains("invalid login credentials") {
        return AuthError::InvalidCredentials;
    }
    if lowered.contains("email not confirmed") {
        return AuthError::EmailNotConfirmed;
    }
    if lowered.contains("already registered") {
        return AuthError::UserAlreadyExists;
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => AuthError::RateLimited,
        // An unknown or revoked refresh token comes back as invalid_grant.
        StatusCode::BAD_REQUEST if code == "invalid_grant" => AuthError::Unauthorized,
        _ => AuthError::Provider {
            status: status.as_u16(),
            message,
        },
    }
}
