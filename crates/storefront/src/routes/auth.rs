//! Identity provider OAuth route handlers.
//!
//! - Login: stores a CSRF state and redirects to the provider
//! - Callback: validates the state, exchanges the code and signs the shopper in
//! - Logout: clears the session identity and redirects to the provider logout

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::session_keys;
use crate::state::AppState;

/// Query parameters for the login route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginQuery {
    /// Local path to return to after sign-in.
    pub return_to: Option<String>,
}

/// Query parameters from the provider's OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Generate a cryptographically secure random string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET.get(idx).copied().map_or('0', char::from)
        })
        .collect()
}

/// Only same-site paths are accepted as post-login targets.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

fn callback_uri(state: &AppState) -> String {
    format!("{}/api/auth/callback", state.config().base_url)
}

/// Initiate sign-in.
///
/// # Route
///
/// `GET /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Response {
    let oauth_state = generate_random_string(32);

    if let Err(e) = session.insert(session_keys::OAUTH_STATE, &oauth_state).await {
        tracing::error!("Failed to store OAuth state in session: {}", e);
        return Redirect::to("/?error=session").into_response();
    }

    if let Some(return_to) = query.return_to.filter(|p| is_local_path(p))
        && let Err(e) = session
            .insert(session_keys::POST_LOGIN_REDIRECT, &return_to)
            .await
    {
        tracing::warn!("Failed to store post-login redirect: {}", e);
    }

    match state
        .identity()
        .authorization_url(&callback_uri(&state), &oauth_state)
    {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            tracing::error!("Failed to build authorization URL: {}", e);
            Redirect::to("/?error=identity").into_response()
        }
    }
}

/// Handle the OAuth callback.
///
/// # Route
///
/// `GET /api/auth/callback`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!("OAuth error: {} - {}", error, description);
        return Redirect::to("/?error=denied").into_response();
    }

    let Some(code) = query.code else {
        tracing::warn!("OAuth callback missing code");
        return Redirect::to("/?error=missing_code").into_response();
    };

    let Some(returned_state) = query.state else {
        tracing::warn!("OAuth callback missing state");
        return Redirect::to("/?error=missing_state").into_response();
    };

    let stored_state: Option<String> = session
        .remove(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if stored_state.as_ref() != Some(&returned_state) {
        tracing::warn!("OAuth state mismatch");
        return Redirect::to("/?error=invalid_state").into_response();
    }

    let user = match state
        .identity()
        .authenticate(&code, &callback_uri(&state))
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Failed to complete sign-in: {}", e);
            return Redirect::to("/?error=token_exchange").into_response();
        }
    };

    // The local row is also created lazily at checkout; a failure here only
    // delays it.
    if let Err(e) = UserRepository::new(state.pool()).ensure(&user).await {
        tracing::warn!(user_id = %user.id, "Failed to record user at sign-in: {}", e);
    }

    let return_to: Option<String> = session
        .remove(session_keys::POST_LOGIN_REDIRECT)
        .await
        .ok()
        .flatten();

    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!("Failed to store identity in session: {}", e);
        return Redirect::to("/?error=session").into_response();
    }

    set_sentry_user(&user.id, user.email.as_deref());
    tracing::info!(user_id = %user.id, "Shopper signed in");

    Redirect::to(return_to.as_deref().unwrap_or("/")).into_response()
}

/// Sign out.
///
/// # Route
///
/// `GET /api/auth/logout`
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::warn!("Failed to clear session identity: {}", e);
    }
    clear_sentry_user();

    let post_logout = format!("{}/", state.config().base_url);
    match state.identity().logout_url(&post_logout) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(_) => Redirect::to("/").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string_length_and_charset() {
        let s = generate_random_string(32);
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(s, generate_random_string(32));
    }

    #[test]
    fn test_only_local_paths_are_return_targets() {
        assert!(is_local_path("/profile"));
        assert!(is_local_path("/thank-you?orderId=1"));
        assert!(!is_local_path("//evil.example.com"));
        assert!(!is_local_path("https://evil.example.com"));
        assert!(!is_local_path("/\\evil.example.com"));
    }
}
