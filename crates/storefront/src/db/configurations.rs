//! Configuration repository.
//!
//! Configurations are written by the configurator flow and are read-only to
//! checkout and order views.

use sqlx::PgPool;

use casecrafters_core::{
    CaseColor, CaseFinish, CaseMaterial, ConfigurationId, PhoneModel,
};

use super::RepositoryError;
use crate::models::Configuration;

const CONFIGURATION_COLUMNS: &str = "id, width, height, image_url, cropped_image_url, \
     color, model, material, finish, created_at";

/// Input for a new configuration row.
#[derive(Debug, Clone)]
pub struct NewConfiguration {
    pub width: i32,
    pub height: i32,
    pub image_url: String,
    pub cropped_image_url: Option<String>,
    pub color: Option<CaseColor>,
    pub model: Option<PhoneModel>,
    pub material: Option<CaseMaterial>,
    pub finish: Option<CaseFinish>,
}

/// Repository for configuration database operations.
pub struct ConfigurationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ConfigurationRepository<'a> {
    /// Create a new configuration repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a configuration by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ConfigurationId) -> Result<Option<Configuration>, RepositoryError> {
        let sql =
            format!("SELECT {CONFIGURATION_COLUMNS} FROM storefront.configurations WHERE id = $1");
        let configuration = sqlx::query_as::<_, Configuration>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(configuration)
    }

    /// Insert a configuration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewConfiguration) -> Result<Configuration, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.configurations \
             (id, width, height, image_url, cropped_image_url, color, model, material, finish) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {CONFIGURATION_COLUMNS}"
        );
        let configuration = sqlx::query_as::<_, Configuration>(&sql)
            .bind(ConfigurationId::generate())
            .bind(new.width)
            .bind(new.height)
            .bind(&new.image_url)
            .bind(new.cropped_image_url.as_deref())
            .bind(new.color.map(CaseColor::as_str))
            .bind(new.model.map(PhoneModel::as_str))
            .bind(new.material.map(CaseMaterial::as_str))
            .bind(new.finish.map(CaseFinish::as_str))
            .fetch_one(self.pool)
            .await?;

        Ok(configuration)
    }
}
