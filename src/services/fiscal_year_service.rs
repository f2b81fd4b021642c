//! Fiscal year creation and activation
//!
//! A company's fiscal years partition time: ranges must be well formed
//! and must not overlap. The chronologically first year is special, it
//! is the only one opening balances may be recorded against.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::fiscal_year_repo::{self, FiscalYear, FyCalendar};
use crate::repos::company_repo;

/// Errors that can occur during fiscal year operations
#[derive(Debug, thiserror::Error)]
pub enum FiscalYearError {
    #[error("Company not found: {0}")]
    CompanyNotFound(Uuid),

    #[error("Fiscal year not found: {0}")]
    NotFound(Uuid),

    #[error("end_date {end} must be after start_date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Date range overlaps fiscal year '{0}'")]
    Overlap(String),

    #[error("Fiscal year label already exists: {0}")]
    DuplicateLabel(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for fiscal year operations
pub type FiscalYearResult<T> = Result<T, FiscalYearError>;

/// Create a fiscal year for a company, optionally activating it
pub async fn create_fiscal_year(
    pool: &PgPool,
    company_id: Uuid,
    label: &str,
    calendar: FyCalendar,
    start_date: NaiveDate,
    end_date: NaiveDate,
    activate: bool,
) -> FiscalYearResult<FiscalYear> {
    if end_date <= start_date {
        return Err(FiscalYearError::InvalidRange {
            start: start_date,
            end: end_date,
        });
    }

    if company_repo::find_by_id(pool, company_id).await?.is_none() {
        return Err(FiscalYearError::CompanyNotFound(company_id));
    }

    let mut tx = pool.begin().await?;

    if let Some(overlapping) =
        fiscal_year_repo::find_overlapping_tx(&mut tx, company_id, start_date, end_date).await?
    {
        return Err(FiscalYearError::Overlap(overlapping.label));
    }

    let fy = match fiscal_year_repo::insert_tx(
        &mut tx,
        Uuid::new_v4(),
        company_id,
        label,
        calendar,
        start_date,
        end_date,
    )
    .await
    {
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(FiscalYearError::DuplicateLabel(label.to_string()));
        }
        other => other?,
    };

    if activate {
        fiscal_year_repo::activate_tx(&mut tx, company_id, fy.id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        fiscal_year_id = %fy.id,
        company_id = %company_id,
        label = %fy.label,
        "Fiscal year created"
    );

    // activate_tx runs after the insert returned its row
    Ok(FiscalYear {
        is_active: activate || fy.is_active,
        ..fy
    })
}

/// Mark a fiscal year active, deactivating its siblings
pub async fn activate_fiscal_year(pool: &PgPool, fiscal_year_id: Uuid) -> FiscalYearResult<FiscalYear> {
    let mut tx = pool.begin().await?;

    let fy = fiscal_year_repo::find_by_id_tx(&mut tx, fiscal_year_id)
        .await?
        .ok_or(FiscalYearError::NotFound(fiscal_year_id))?;

    fiscal_year_repo::activate_tx(&mut tx, fy.company_id, fy.id).await?;

    tx.commit().await?;

    tracing::info!(
        fiscal_year_id = %fy.id,
        company_id = %fy.company_id,
        "Fiscal year activated"
    );

    Ok(FiscalYear {
        is_active: true,
        ..fy
    })
}
