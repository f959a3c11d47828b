//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use casecrafters_core::UserId;

/// Local mirror of an identity-provider user.
///
/// Created lazily on first checkout and keyed by the provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity-provider subject id.
    pub id: UserId,
    /// Email as reported by the provider at first checkout (may be empty).
    pub email: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
