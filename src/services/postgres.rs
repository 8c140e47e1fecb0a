use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{ClassifyingAttributes, Listing, ListingPatch};
use crate::services::repository::{ListingRepository, RepositoryError};

const LISTING_COLUMNS: &str = r#"
    id, name, description, images,
    nationality, hair_color, services, age, price, city, height_cm, weight_kg,
    is_verified, is_active, is_online, rating, tags,
    created_at, updated_at, version
"#;

/// PostgreSQL-backed listing repository
///
/// Tags live in a `TEXT[]` column next to the attributes they are derived
/// from. Updates lock the row with `SELECT ... FOR UPDATE`, re-derive the tags
/// and write both back in the same transaction.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, RepositoryError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn lock_listing(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Listing, RepositoryError> {
        let query = format!("SELECT {} FROM listings WHERE id = $1 FOR UPDATE", LISTING_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;

        listing_from_row(&row)
    }

    /// Write attributes and tags of an already-locked row, guarded by version
    async fn write_locked(
        tx: &mut Transaction<'_, Postgres>,
        listing: &Listing,
        previous_version: i64,
    ) -> Result<(), RepositoryError> {
        let query = r#"
            UPDATE listings SET
                name = $3, description = $4, images = $5,
                nationality = $6, hair_color = $7, services = $8, age = $9, price = $10,
                city = $11, height_cm = $12, weight_kg = $13,
                is_verified = $14, is_active = $15, is_online = $16, rating = $17, tags = $18,
                updated_at = $19, version = $20
            WHERE id = $1 AND version = $2
        "#;

        let attrs = &listing.attributes;
        let result = sqlx::query(query)
            .bind(listing.id)
            .bind(previous_version)
            .bind(&listing.name)
            .bind(&listing.description)
            .bind(&listing.images)
            .bind(attrs.nationality.map(|n| n.as_str()))
            .bind(attrs.hair_color.map(|c| c.as_str()))
            .bind(service_names(attrs))
            .bind(attrs.age.map(i16::from))
            .bind(attrs.price)
            .bind(&attrs.city)
            .bind(attrs.height_cm.map(i32::from))
            .bind(attrs.weight_kg.map(i32::from))
            .bind(attrs.is_verified)
            .bind(attrs.is_active)
            .bind(listing.is_online)
            .bind(listing.rating)
            .bind(listing.tags.iter().cloned().collect::<Vec<String>>())
            .bind(listing.updated_at)
            .bind(listing.version)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() != 1 {
            return Err(RepositoryError::Conflict(listing.id));
        }

        Ok(())
    }
}

#[async_trait]
impl ListingRepository for PostgresClient {
    async fn insert(&self, listing: Listing) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO listings (
                id, name, description, images,
                nationality, hair_color, services, age, price, city, height_cm, weight_kg,
                is_verified, is_active, is_online, rating, tags,
                created_at, updated_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        "#;

        let attrs = &listing.attributes;
        sqlx::query(query)
            .bind(listing.id)
            .bind(&listing.name)
            .bind(&listing.description)
            .bind(&listing.images)
            .bind(attrs.nationality.map(|n| n.as_str()))
            .bind(attrs.hair_color.map(|c| c.as_str()))
            .bind(service_names(attrs))
            .bind(attrs.age.map(i16::from))
            .bind(attrs.price)
            .bind(&attrs.city)
            .bind(attrs.height_cm.map(i32::from))
            .bind(attrs.weight_kg.map(i32::from))
            .bind(attrs.is_verified)
            .bind(attrs.is_active)
            .bind(listing.is_online)
            .bind(listing.rating)
            .bind(listing.tags.iter().cloned().collect::<Vec<String>>())
            .bind(listing.created_at)
            .bind(listing.updated_at)
            .bind(listing.version)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Inserted listing {} ({} tags)", listing.id, listing.tags.len());

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, RepositoryError> {
        let query = format!("SELECT {} FROM listings WHERE id = $1", LISTING_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(listing_from_row).transpose()
    }

    async fn update(&self, id: Uuid, patch: ListingPatch) -> Result<Listing, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut listing = Self::lock_listing(&mut tx, id).await?;
        let previous_version = listing.version;
        listing.apply_patch(patch, Utc::now());
        Self::write_locked(&mut tx, &listing, previous_version).await?;

        tx.commit().await?;

        tracing::debug!("Updated listing {} to version {}", id, listing.version);

        Ok(listing)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn snapshot(&self, active_only: bool) -> Result<Vec<Listing>, RepositoryError> {
        // A single statement reads one consistent MVCC snapshot
        let query = format!(
            "SELECT {} FROM listings WHERE ($1 = FALSE OR is_active = TRUE) ORDER BY seq ASC",
            LISTING_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(listing_from_row).collect()
    }

    async fn retag_all(&self) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM listings ORDER BY seq ASC FOR UPDATE", LISTING_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&mut *tx).await?;

        let mut refreshed = 0;
        for row in &rows {
            let mut listing = listing_from_row(row)?;
            let previous_version = listing.version;
            if listing.refresh_tags() {
                Self::write_locked(&mut tx, &listing, previous_version).await?;
                refreshed += 1;
            }
        }

        tx.commit().await?;

        tracing::info!("Re-derived tags for {} of {} listings", refreshed, rows.len());

        Ok(refreshed)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, RepositoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn service_names(attrs: &ClassifyingAttributes) -> Vec<String> {
    attrs.services.iter().map(|s| s.as_str().to_string()).collect()
}

/// Parse a stored enum label using its serde name
fn parse_label<T: DeserializeOwned>(column: &str, label: String) -> Result<T, RepositoryError> {
    serde_json::from_value(serde_json::Value::String(label.clone()))
        .map_err(|_| RepositoryError::Corrupt(format!("unknown {} value {:?}", column, label)))
}

fn narrow<T: TryFrom<i64>>(column: &str, value: Option<i64>) -> Result<Option<T>, RepositoryError> {
    value
        .map(|v| {
            T::try_from(v)
                .map_err(|_| RepositoryError::Corrupt(format!("{} out of range: {}", column, v)))
        })
        .transpose()
}

fn listing_from_row(row: &PgRow) -> Result<Listing, RepositoryError> {
    let nationality: Option<String> = row.try_get("nationality")?;
    let hair_color: Option<String> = row.try_get("hair_color")?;
    let services: Vec<String> = row.try_get("services")?;
    let age: Option<i16> = row.try_get("age")?;
    let height_cm: Option<i32> = row.try_get("height_cm")?;
    let weight_kg: Option<i32> = row.try_get("weight_kg")?;
    let tags: Vec<String> = row.try_get("tags")?;

    let attributes = ClassifyingAttributes {
        nationality: nationality.map(|n| parse_label("nationality", n)).transpose()?,
        hair_color: hair_color.map(|c| parse_label("hair_color", c)).transpose()?,
        services: services
            .into_iter()
            .map(|s| parse_label("services", s))
            .collect::<Result<_, _>>()?,
        age: narrow("age", age.map(i64::from))?,
        price: row.try_get("price")?,
        city: row.try_get("city")?,
        height_cm: narrow("height_cm", height_cm.map(i64::from))?,
        weight_kg: narrow("weight_kg", weight_kg.map(i64::from))?,
        is_verified: row.try_get("is_verified")?,
        is_active: row.try_get("is_active")?,
    };

    Ok(Listing {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        images: row.try_get("images")?,
        attributes,
        is_online: row.try_get("is_online")?,
        rating: row.try_get("rating")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}
