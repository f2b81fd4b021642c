use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Calendar the fiscal year labels follow. Nepali companies run Bikram
/// Sambat years (mid-July to mid-July in Gregorian terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "fy_calendar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FyCalendar {
    Bs,
    Ad,
}

/// Fiscal year model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct FiscalYear {
    pub id: Uuid,
    pub company_id: Uuid,
    pub label: String,
    pub calendar: FyCalendar,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    company_id: Uuid,
    label: &str,
    calendar: FyCalendar,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<FiscalYear, sqlx::Error> {
    let fy = sqlx::query_as::<_, FiscalYear>(
        r#"
        INSERT INTO fiscal_years (id, company_id, label, calendar, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, company_id, label, calendar, start_date, end_date, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(company_id)
    .bind(label)
    .bind(calendar)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(&mut **tx)
    .await?;

    Ok(fy)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<FiscalYear>, sqlx::Error> {
    sqlx::query_as::<_, FiscalYear>(
        r#"
        SELECT id, company_id, label, calendar, start_date, end_date, is_active, created_at
        FROM fiscal_years
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Find a fiscal year by ID within a transaction
pub async fn find_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<FiscalYear>, sqlx::Error> {
    sqlx::query_as::<_, FiscalYear>(
        r#"
        SELECT id, company_id, label, calendar, start_date, end_date, is_active, created_at
        FROM fiscal_years
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// List a company's fiscal years ordered chronologically
pub async fn list_by_company(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Vec<FiscalYear>, sqlx::Error> {
    sqlx::query_as::<_, FiscalYear>(
        r#"
        SELECT id, company_id, label, calendar, start_date, end_date, is_active, created_at
        FROM fiscal_years
        WHERE company_id = $1
        ORDER BY start_date ASC
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await
}

/// Find any fiscal year of the company whose range overlaps [start, end]
pub async fn find_overlapping_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Option<FiscalYear>, sqlx::Error> {
    sqlx::query_as::<_, FiscalYear>(
        r#"
        SELECT id, company_id, label, calendar, start_date, end_date, is_active, created_at
        FROM fiscal_years
        WHERE company_id = $1
          AND start_date <= $3
          AND end_date >= $2
        LIMIT 1
        "#,
    )
    .bind(company_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_optional(&mut **tx)
    .await
}

/// The chronologically first fiscal year of a company (minimum start_date).
/// Opening balances may only be recorded against this year.
pub async fn find_first_of_company(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Option<FiscalYear>, sqlx::Error> {
    sqlx::query_as::<_, FiscalYear>(
        r#"
        SELECT id, company_id, label, calendar, start_date, end_date, is_active, created_at
        FROM fiscal_years
        WHERE company_id = $1
        ORDER BY start_date ASC
        LIMIT 1
        "#,
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

/// Mark one fiscal year active and deactivate its siblings
pub async fn activate_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    fiscal_year_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE fiscal_years
        SET is_active = (id = $2)
        WHERE company_id = $1
        "#,
    )
    .bind(company_id)
    .bind(fiscal_year_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
