//! Identity provider OAuth client.
//!
//! Sign-in is delegated to a hosted OIDC provider (Kinde). We run the
//! authorization-code flow, fetch the user profile once, and keep only the
//! resulting [`CurrentUser`] in the session.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use casecrafters_core::UserId;

use crate::config::IdentityConfig;
use crate::models::CurrentUser;

/// Scopes requested at sign-in.
const SCOPES: &str = "openid profile email offline";

/// Per-request timeout for provider calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the request.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Provider URL could not be built.
    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Profile returned by the provider's user-profile endpoint.
#[derive(Debug, Deserialize)]
struct UserProfile {
    id: Option<String>,
    sub: Option<String>,
    email: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
}

impl TryFrom<UserProfile> for CurrentUser {
    type Error = IdentityError;

    fn try_from(profile: UserProfile) -> Result<Self, Self::Error> {
        let id = profile
            .id
            .or(profile.sub)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| IdentityError::OAuth("profile has no subject id".to_string()))?;

        Ok(Self {
            id: UserId::new(id),
            email: profile.email.filter(|email| !email.is_empty()),
            given_name: profile.given_name,
            family_name: profile.family_name,
        })
    }
}

/// Client for the hosted identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    issuer_url: Url,
    client_id: String,
    client_secret: SecretString,
    request_timeout: Duration,
}

impl IdentityClient {
    /// Create a new identity client.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Create a client whose provider calls give up after `request_timeout`.
    #[must_use]
    pub fn with_timeout(config: &IdentityConfig, request_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                issuer_url: config.issuer_url.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                request_timeout,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        Ok(self.inner.issuer_url.join(path)?)
    }

    /// Build the authorization URL to redirect the shopper to.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Url` if the issuer URL cannot be joined.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url, IdentityError> {
        let mut url = self.endpoint("oauth2/auth")?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.inner.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", SCOPES)
            .append_pair("state", state);
        Ok(url)
    }

    /// Build the provider logout URL.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Url` if the issuer URL cannot be joined.
    pub fn logout_url(&self, post_logout_redirect: &str) -> Result<Url, IdentityError> {
        let mut url = self.endpoint("logout")?;
        url.query_pairs_mut()
            .append_pair("redirect", post_logout_redirect);
        Ok(url)
    }

    /// Exchange an authorization code for the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange or profile fetch fails.
    pub async fn authenticate(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<CurrentUser, IdentityError> {
        let access_token = self.exchange_code(code, redirect_uri).await?;
        self.fetch_profile(&access_token).await
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, IdentityError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(self.endpoint("oauth2/token")?)
            .timeout(self.inner.request_timeout)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdentityError::OAuth(format!("Token exchange failed: {text}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<CurrentUser, IdentityError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("oauth2/v2/user_profile")?)
            .timeout(self.inner.request_timeout)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdentityError::OAuth(format!("Profile fetch failed: {text}")));
        }

        let profile: UserProfile = response.json().await?;
        profile.try_into()
    }
}
