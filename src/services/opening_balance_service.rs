//! Opening balance recording
//!
//! Opening balances seed an account's ledger position and only make
//! sense in the company's chronologically first fiscal year, later
//! years start from posted transactions.

use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::opening_balance_repo::{self, BalanceSide, OpeningBalance};
use crate::repos::{account_repo, fiscal_year_repo};

/// Errors that can occur when recording an opening balance
#[derive(Debug, thiserror::Error)]
pub enum OpeningBalanceError {
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(Uuid),

    #[error("Opening balances are only allowed in the first fiscal year '{first_label}'")]
    NotFirstFiscalYear { first_label: String },

    #[error("Opening balance amount must not be negative: {0}")]
    NegativeAmount(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for opening balance operations
pub type OpeningBalanceResult<T> = Result<T, OpeningBalanceError>;

/// Upsert an account's opening balance.
///
/// The target fiscal year must belong to the account's company and be
/// its chronologically first year.
pub async fn set_opening_balance(
    pool: &PgPool,
    account_id: Uuid,
    fiscal_year_id: Uuid,
    side: BalanceSide,
    amount_minor: i64,
) -> OpeningBalanceResult<OpeningBalance> {
    if amount_minor < 0 {
        return Err(OpeningBalanceError::NegativeAmount(amount_minor));
    }

    let account = account_repo::find_by_id(pool, account_id)
        .await?
        .ok_or(OpeningBalanceError::AccountNotFound(account_id))?;

    let fy = fiscal_year_repo::find_by_id(pool, fiscal_year_id)
        .await?
        .filter(|fy| fy.company_id == account.company_id)
        .ok_or(OpeningBalanceError::FiscalYearNotFound(fiscal_year_id))?;

    let first = fiscal_year_repo::find_first_of_company(pool, account.company_id)
        .await?
        .ok_or(OpeningBalanceError::FiscalYearNotFound(fiscal_year_id))?;

    if first.id != fy.id {
        return Err(OpeningBalanceError::NotFirstFiscalYear {
            first_label: first.label,
        });
    }

    let balance = opening_balance_repo::upsert(
        pool,
        Uuid::new_v4(),
        account_id,
        fiscal_year_id,
        side,
        amount_minor,
    )
    .await?;

    tracing::info!(
        account_id = %account_id,
        fiscal_year_id = %fiscal_year_id,
        amount_minor,
        "Opening balance recorded"
    );

    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_first_fiscal_year_error_names_the_year() {
        let err = OpeningBalanceError::NotFirstFiscalYear {
            first_label: "2080/81".to_string(),
        };
        assert!(err.to_string().contains("2080/81"));
    }

    #[test]
    fn test_negative_amount_error_display() {
        let err = OpeningBalanceError::NegativeAmount(-500);
        assert!(err.to_string().contains("-500"));
    }
}
