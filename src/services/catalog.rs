use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};
use thiserror::Error;

use crate::domain::pricing::Addon;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only view of the add-on and experience catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_addons(&self) -> Result<Vec<Addon>, CatalogError>;

    /// Base price of an experience package, `None` if the id is unknown.
    async fn experience_price(&self, experience_id: &str) -> Result<Option<Decimal>, CatalogError>;
}

/// In-memory catalog for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    addons: Vec<Addon>,
    experiences: HashMap<String, Decimal>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(addons: Vec<Addon>) -> Self {
        Self {
            addons,
            experiences: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_experience(mut self, experience_id: &str, base_price: Decimal) -> Self {
        self.experiences
            .insert(experience_id.to_string(), base_price);
        self
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn list_addons(&self) -> Result<Vec<Addon>, CatalogError> {
        Ok(self.addons.clone())
    }

    async fn experience_price(&self, experience_id: &str) -> Result<Option<Decimal>, CatalogError> {
        Ok(self.experiences.get(experience_id).copied())
    }
}

/// Catalog backed by the `addons` and `experiences` tables.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: Pool<Postgres>,
}

impl PostgresCatalog {
    #[must_use]
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PostgresCatalog {
    async fn list_addons(&self) -> Result<Vec<Addon>, CatalogError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, unit_price, category
            FROM addons
            WHERE active = TRUE
            ORDER BY category, name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Addon {
                id: row.get("id"),
                name: row.get("name"),
                unit_price: row.get("unit_price"),
                category: row.get("category"),
            })
            .collect())
    }

    async fn experience_price(&self, experience_id: &str) -> Result<Option<Decimal>, CatalogError> {
        let price = sqlx::query_scalar::<_, Decimal>(
            r"
            SELECT base_price
            FROM experiences
            WHERE id = $1
            ",
        )
        .bind(experience_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_catalog_lists_what_it_was_given() {
        let catalog = StaticCatalog::new(vec![Addon {
            id: "headsets".to_string(),
            name: "Noise-cancelling headsets".to_string(),
            unit_price: Decimal::from(20),
            category: "comfort".to_string(),
        }])
        .with_experience("grand-canyon", Decimal::from(899));

        assert_eq!(catalog.list_addons().await.unwrap().len(), 1);
        assert_eq!(
            catalog.experience_price("grand-canyon").await.unwrap(),
            Some(Decimal::from(899))
        );
        assert_eq!(catalog.experience_price("unknown").await.unwrap(), None);
    }
}
