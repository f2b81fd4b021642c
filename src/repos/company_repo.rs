use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Company model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub pan_no: Option<String>,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Insert a company inside a transaction (creation also seeds defaults)
pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    name: &str,
    address: Option<&str>,
    phone: Option<&str>,
    pan_no: Option<&str>,
    currency: &str,
) -> Result<Company, sqlx::Error> {
    let company = sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (id, name, address, phone, pan_no, currency)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, address, phone, pan_no, currency, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(address)
    .bind(phone)
    .bind(pan_no)
    .bind(currency)
    .fetch_one(&mut **tx)
    .await?;

    Ok(company)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>(
        r#"
        SELECT id, name, address, phone, pan_no, currency, created_at
        FROM companies
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Case-insensitive name lookup, matching the unique index on LOWER(name)
pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>(
        r#"
        SELECT id, name, address, phone, pan_no, currency, created_at
        FROM companies
        WHERE LOWER(name) = LOWER($1)
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>(
        r#"
        SELECT id, name, address, phone, pan_no, currency, created_at
        FROM companies
        ORDER BY name ASC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    address: Option<&str>,
    phone: Option<&str>,
    pan_no: Option<&str>,
    currency: &str,
) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>(
        r#"
        UPDATE companies
        SET name = $2, address = $3, phone = $4, pan_no = $5, currency = $6
        WHERE id = $1
        RETURNING id, name, address, phone, pan_no, currency, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(address)
    .bind(phone)
    .bind(pan_no)
    .bind(currency)
    .fetch_optional(pool)
    .await
}
