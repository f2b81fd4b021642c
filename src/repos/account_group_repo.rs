use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Account group model (grouping for the chart of accounts)
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct AccountGroup {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    company_id: Uuid,
    name: &str,
    is_default: bool,
) -> Result<AccountGroup, sqlx::Error> {
    sqlx::query_as::<_, AccountGroup>(
        r#"
        INSERT INTO account_groups (id, company_id, name, is_default)
        VALUES ($1, $2, $3, $4)
        RETURNING id, company_id, name, is_default, created_at
        "#,
    )
    .bind(id)
    .bind(company_id)
    .bind(name)
    .bind(is_default)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AccountGroup>, sqlx::Error> {
    sqlx::query_as::<_, AccountGroup>(
        r#"
        SELECT id, company_id, name, is_default, created_at
        FROM account_groups
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_name(
    pool: &PgPool,
    company_id: Uuid,
    name: &str,
) -> Result<Option<AccountGroup>, sqlx::Error> {
    sqlx::query_as::<_, AccountGroup>(
        r#"
        SELECT id, company_id, name, is_default, created_at
        FROM account_groups
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
) -> Result<Vec<AccountGroup>, sqlx::Error> {
    sqlx::query_as::<_, AccountGroup>(
        r#"
        SELECT id, company_id, name, is_default, created_at
        FROM account_groups
        WHERE company_id = $1
        ORDER BY name ASC
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn update_name(
    pool: &PgPool,
    id: Uuid,
    name: &str,
) -> Result<Option<AccountGroup>, sqlx::Error> {
    sqlx::query_as::<_, AccountGroup>(
        r#"
        UPDATE account_groups
        SET name = $2
        WHERE id = $1
        RETURNING id, company_id, name, is_default, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM account_groups WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Number of accounts still referencing the group. Deletion is refused
/// while this is non-zero.
pub async fn count_accounts_referencing(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM accounts
        WHERE account_group_id = $1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}
