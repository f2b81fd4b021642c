use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Physical store/godown. Only meaningful when store management is
/// enabled in the company settings.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Store {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Rack within a store
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Rack {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_store(
    pool: &PgPool,
    id: Uuid,
    company_id: Uuid,
    name: &str,
) -> Result<Store, sqlx::Error> {
    sqlx::query_as::<_, Store>(
        r#"
        INSERT INTO stores (id, company_id, name)
        VALUES ($1, $2, $3)
        RETURNING id, company_id, name, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(company_id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn find_store_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as::<_, Store>(
        r#"
        SELECT id, company_id, name, is_active, created_at
        FROM stores
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_store_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as::<_, Store>(
        r#"
        SELECT id, company_id, name, is_active, created_at
        FROM stores
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn find_store_by_name(
    pool: &PgPool,
    company_id: Uuid,
    name: &str,
) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as::<_, Store>(
        r#"
        SELECT id, company_id, name, is_active, created_at
        FROM stores
        WHERE company_id = $1 AND name = $2
        "#,
    )
    .bind(company_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn list_stores(pool: &PgPool, company_id: Uuid) -> Result<Vec<Store>, sqlx::Error> {
    sqlx::query_as::<_, Store>(
        r#"
        SELECT id, company_id, name, is_active, created_at
        FROM stores
        WHERE company_id = $1
        ORDER BY name ASC
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn update_store(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    is_active: bool,
) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as::<_, Store>(
        r#"
        UPDATE stores
        SET name = $2, is_active = $3
        WHERE id = $1
        RETURNING id, company_id, name, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(is_active)
    .fetch_optional(pool)
    .await
}

pub async fn delete_store(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stores WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn insert_rack(
    pool: &PgPool,
    id: Uuid,
    store_id: Uuid,
    name: &str,
) -> Result<Rack, sqlx::Error> {
    sqlx::query_as::<_, Rack>(
        r#"
        INSERT INTO racks (id, store_id, name)
        VALUES ($1, $2, $3)
        RETURNING id, store_id, name, created_at
        "#,
    )
    .bind(id)
    .bind(store_id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn find_rack_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Rack>, sqlx::Error> {
    sqlx::query_as::<_, Rack>(
        r#"
        SELECT id, store_id, name, created_at
        FROM racks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_rack_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Rack>, sqlx::Error> {
    sqlx::query_as::<_, Rack>(
        r#"
        SELECT id, store_id, name, created_at
        FROM racks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn find_rack_by_name(
    pool: &PgPool,
    store_id: Uuid,
    name: &str,
) -> Result<Option<Rack>, sqlx::Error> {
    sqlx::query_as::<_, Rack>(
        r#"
        SELECT id, store_id, name, created_at
        FROM racks
        WHERE store_id = $1 AND name = $2
        "#,
    )
    .bind(store_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn list_racks_by_store(pool: &PgPool, store_id: Uuid) -> Result<Vec<Rack>, sqlx::Error> {
    sqlx::query_as::<_, Rack>(
        r#"
        SELECT id, store_id, name, created_at
        FROM racks
        WHERE store_id = $1
        ORDER BY name ASC
        "#,
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
}

pub async fn delete_rack(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM racks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
