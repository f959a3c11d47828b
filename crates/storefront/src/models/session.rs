//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use casecrafters_core::UserId;

/// Session-stored identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Provider subject id (local user primary key).
    pub id: UserId,
    /// Email address, if the provider shared one.
    pub email: Option<String>,
    /// Given name.
    pub given_name: Option<String>,
    /// Family name.
    pub family_name: Option<String>,
}

impl CurrentUser {
    /// Email to store on the local user row; empty when unknown.
    #[must_use]
    pub fn email_or_empty(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }

    /// Display name built from given and family name.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        match (self.given_name.as_deref(), self.family_name.as_deref()) {
            (Some(given), Some(family)) => Some(format!("{given} {family}")),
            (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the OAuth state parameter (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for the page to return to after login.
    pub const POST_LOGIN_REDIRECT: &str = "post_login_redirect";
}
