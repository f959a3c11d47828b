//! User repository for database operations.
//!
//! Users are owned by the identity provider; the local row is a mirror keyed
//! by the provider's subject id and is created lazily on first checkout.

use sqlx::{PgExecutor, PgPool};

use casecrafters_core::UserId;

use super::RepositoryError;
use crate::models::{CurrentUser, User};

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, created_at, updated_at
            FROM storefront.users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Ensure a local user row exists for the authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure(&self, identity: &CurrentUser) -> Result<User, RepositoryError> {
        upsert_identity(self.pool, identity).await
    }
}

/// Insert the identity's user row, or return the existing one unchanged.
///
/// Generic over the executor so the checkout transaction can call it.
/// Concurrent callers for the same id both succeed and see one row.
pub(crate) async fn upsert_identity<'e, E>(
    executor: E,
    identity: &CurrentUser,
) -> Result<User, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(
        r"
        INSERT INTO storefront.users (id, email)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET updated_at = storefront.users.updated_at
        RETURNING id, email, created_at, updated_at
        ",
    )
    .bind(&identity.id)
    .bind(identity.email_or_empty())
    .fetch_one(executor)
    .await?;

    Ok(user)
}
