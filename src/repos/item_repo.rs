use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

/// Inventory item. `stock_qty` is an aggregate over the item's stock lots
/// and is only ever changed by atomic increments inside bill transactions
/// (or recomputed wholesale by the rebuild_stock binary).
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Item {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub unit: String,
    pub manufacturer: Option<String>,
    pub is_vatable: bool,
    pub stock_qty: i64,
    pub last_rate_minor: i64,
    pub sales_rate_minor: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur during item repository operations
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Item not found: {item_id}")]
    NotFound { item_id: Uuid },

    #[error("Item is inactive: {item_id}")]
    Inactive { item_id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn insert(
    pool: &PgPool,
    id: Uuid,
    company_id: Uuid,
    name: &str,
    unit: &str,
    manufacturer: Option<&str>,
    is_vatable: bool,
    sales_rate_minor: i64,
) -> Result<Item, sqlx::Error> {
    sqlx::query_as::<_, Item>(
        r#"
        INSERT INTO items (id, company_id, name, unit, manufacturer, is_vatable, sales_rate_minor)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, company_id, name, unit, manufacturer, is_vatable, stock_qty,
                  last_rate_minor, sales_rate_minor, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(company_id)
    .bind(name)
    .bind(unit)
    .bind(manufacturer)
    .bind(is_vatable)
    .bind(sales_rate_minor)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(
        r#"
        SELECT id, company_id, name, unit, manufacturer, is_vatable, stock_qty,
               last_rate_minor, sales_rate_minor, is_active, created_at
        FROM items
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(
        r#"
        SELECT id, company_id, name, unit, manufacturer, is_vatable, stock_qty,
               last_rate_minor, sales_rate_minor, is_active, created_at
        FROM items
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// Find an active item belonging to the company within a transaction.
/// A cross-company ID is reported as NotFound, never leaked.
pub async fn find_active_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    item_id: Uuid,
) -> Result<Item, ItemError> {
    let item = find_by_id_tx(tx, item_id).await?;

    match item {
        Some(it) if it.company_id != company_id => Err(ItemError::NotFound { item_id }),
        Some(it) if it.is_active => Ok(it),
        Some(_) => Err(ItemError::Inactive { item_id }),
        None => Err(ItemError::NotFound { item_id }),
    }
}

pub async fn find_by_name(
    pool: &PgPool,
    company_id: Uuid,
    name: &str,
) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(
        r#"
        SELECT id, company_id, name, unit, manufacturer, is_vatable, stock_qty,
               last_rate_minor, sales_rate_minor, is_active, created_at
        FROM items
        WHERE company_id = $1 AND name = $2
        "#,
    )
    .bind(company_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_company(
    pool: &PgPool,
    company_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(
        r#"
        SELECT id, company_id, name, unit, manufacturer, is_vatable, stock_qty,
               last_rate_minor, sales_rate_minor, is_active, created_at
        FROM items
        WHERE company_id = $1
        ORDER BY name ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(company_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    unit: &str,
    manufacturer: Option<&str>,
    is_vatable: bool,
    sales_rate_minor: i64,
    is_active: bool,
) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(
        r#"
        UPDATE items
        SET name = $2, unit = $3, manufacturer = $4, is_vatable = $5,
            sales_rate_minor = $6, is_active = $7
        WHERE id = $1
        RETURNING id, company_id, name, unit, manufacturer, is_vatable, stock_qty,
                  last_rate_minor, sales_rate_minor, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(unit)
    .bind(manufacturer)
    .bind(is_vatable)
    .bind(sales_rate_minor)
    .bind(is_active)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Atomically add `qty_delta` to the aggregate stock quantity.
///
/// Always a read-modify-write in SQL, never in application code, so
/// concurrent bill transactions serialize on the row instead of losing
/// updates. A positive purchase also refreshes the last purchase rate.
pub async fn adjust_stock_tx(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
    qty_delta: i64,
    last_rate_minor: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE items
        SET stock_qty = stock_qty + $2,
            last_rate_minor = COALESCE($3, last_rate_minor)
        WHERE id = $1
        "#,
    )
    .bind(item_id)
    .bind(qty_delta)
    .bind(last_rate_minor)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
