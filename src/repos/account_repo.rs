use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

/// Account type enum matching database account_type
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Account model representing a chart of accounts entry. Supplier and
/// customer parties are accounts too (with pan/address/phone filled in).
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Account {
    pub id: Uuid,
    pub company_id: Uuid,
    pub account_group_id: Uuid,
    pub code: String,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub is_default: bool,
    pub is_active: bool,
    pub pan_no: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur during account repository operations
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account not found: {account_id}")]
    NotFound { account_id: Uuid },

    #[error("Account is inactive: {account_id}")]
    Inactive { account_id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields for inserting an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub company_id: Uuid,
    pub account_group_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub is_default: bool,
    pub pan_no: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    new: NewAccount,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts
            (id, company_id, account_group_id, code, name, type, is_default,
             pan_no, address, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, company_id, account_group_id, code, name, type, is_default,
                  is_active, pan_no, address, phone, created_at
        "#,
    )
    .bind(new.id)
    .bind(new.company_id)
    .bind(new.account_group_id)
    .bind(&new.code)
    .bind(&new.name)
    .bind(new.account_type)
    .bind(new.is_default)
    .bind(&new.pan_no)
    .bind(&new.address)
    .bind(&new.phone)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, company_id, account_group_id, code, name, type, is_default,
               is_active, pan_no, address, phone, created_at
        FROM accounts
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
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, company_id, account_group_id, code, name, type, is_default,
               is_active, pan_no, address, phone, created_at
        FROM accounts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// Find an active account belonging to the company within a transaction.
/// A cross-company ID is reported as NotFound, never leaked.
pub async fn find_active_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    account_id: Uuid,
) -> Result<Account, AccountError> {
    let account = find_by_id_tx(tx, account_id).await?;

    match account {
        Some(acc) if acc.company_id != company_id => Err(AccountError::NotFound { account_id }),
        Some(acc) if acc.is_active => Ok(acc),
        Some(_) => Err(AccountError::Inactive { account_id }),
        None => Err(AccountError::NotFound { account_id }),
    }
}

pub async fn find_by_code(
    pool: &PgPool,
    company_id: Uuid,
    code: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, company_id, account_group_id, code, name, type, is_default,
               is_active, pan_no, address, phone, created_at
        FROM accounts
        WHERE company_id = $1 AND code = $2
        "#,
    )
    .bind(company_id)
    .bind(code)
    .fetch_optional(pool)
    .await
}

/// Find a default account by its seeded code within a transaction.
/// Posting relies on the Cash/Purchase/VAT/Rounding accounts existing.
pub async fn find_by_code_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    code: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, company_id, account_group_id, code, name, type, is_default,
               is_active, pan_no, address, phone, created_at
        FROM accounts
        WHERE company_id = $1 AND code = $2
        "#,
    )
    .bind(company_id)
    .bind(code)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn find_by_name(
    pool: &PgPool,
    company_id: Uuid,
    name: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, company_id, account_group_id, code, name, type, is_default,
               is_active, pan_no, address, phone, created_at
        FROM accounts
        WHERE company_id = $1 AND name = $2
        "#,
    )
    .bind(company_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

/// List a company's accounts, optionally filtered by group, ordered by code
pub async fn list_by_company(
    pool: &PgPool,
    company_id: Uuid,
    account_group_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, company_id, account_group_id, code, name, type, is_default,
               is_active, pan_no, address, phone, created_at
        FROM accounts
        WHERE company_id = $1
          AND ($2::uuid IS NULL OR account_group_id = $2)
        ORDER BY code ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(company_id)
    .bind(account_group_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Fields an update may change. Code and type are fixed at creation.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub account_group_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub pan_no: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    upd: AccountUpdate,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET account_group_id = $2, name = $3, is_active = $4,
            pan_no = $5, address = $6, phone = $7
        WHERE id = $1
        RETURNING id, company_id, account_group_id, code, name, type, is_default,
                  is_active, pan_no, address, phone, created_at
        "#,
    )
    .bind(id)
    .bind(upd.account_group_id)
    .bind(&upd.name)
    .bind(upd.is_active)
    .bind(&upd.pan_no)
    .bind(&upd.address)
    .bind(&upd.phone)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
