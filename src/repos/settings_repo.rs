use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Per-company settings row, created at company creation
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Settings {
    pub company_id: Uuid,
    /// VAT rate in basis points (1300 = 13%)
    pub vat_rate_bp: i32,
    pub store_management_enabled: bool,
    pub bill_no_prefix: String,
    pub updated_at: DateTime<Utc>,
}

/// Seed the default settings row for a freshly created company
pub async fn insert_default_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
) -> Result<Settings, sqlx::Error> {
    sqlx::query_as::<_, Settings>(
        r#"
        INSERT INTO settings (company_id)
        VALUES ($1)
        RETURNING company_id, vat_rate_bp, store_management_enabled, bill_no_prefix, updated_at
        "#,
    )
    .bind(company_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_by_company(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Option<Settings>, sqlx::Error> {
    sqlx::query_as::<_, Settings>(
        r#"
        SELECT company_id, vat_rate_bp, store_management_enabled, bill_no_prefix, updated_at
        FROM settings
        WHERE company_id = $1
        "#,
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_company_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
) -> Result<Option<Settings>, sqlx::Error> {
    sqlx::query_as::<_, Settings>(
        r#"
        SELECT company_id, vat_rate_bp, store_management_enabled, bill_no_prefix, updated_at
        FROM settings
        WHERE company_id = $1
        "#,
    )
    .bind(company_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn update(
    pool: &PgPool,
    company_id: Uuid,
    vat_rate_bp: i32,
    store_management_enabled: bool,
    bill_no_prefix: &str,
) -> Result<Option<Settings>, sqlx::Error> {
    sqlx::query_as::<_, Settings>(
        r#"
        UPDATE settings
        SET vat_rate_bp = $2,
            store_management_enabled = $3,
            bill_no_prefix = $4,
            updated_at = NOW()
        WHERE company_id = $1
        RETURNING company_id, vat_rate_bp, store_management_enabled, bill_no_prefix, updated_at
        "#,
    )
    .bind(company_id)
    .bind(vat_rate_bp)
    .bind(store_management_enabled)
    .bind(bill_no_prefix)
    .fetch_optional(pool)
    .await
}
