//! Company creation and maintenance
//!
//! Creating a company seeds its default account groups, the default
//! accounts posting relies on, and a settings row, all in one
//! transaction.

use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::account_repo::{self, AccountType, NewAccount};
use crate::repos::company_repo::{self, Company};
use crate::repos::{account_group_repo, settings_repo};

/// Code of the seeded cash account, credited on cash purchases
pub const CASH_ACCOUNT_CODE: &str = "1000";
/// Code of the seeded VAT receivable account, debited with input VAT
pub const VAT_RECEIVABLE_CODE: &str = "1300";
/// Code of the seeded purchase account, debited with the taxable base
pub const PURCHASE_ACCOUNT_CODE: &str = "5000";
/// Code of the seeded rounding account, carrying round-off remainders
pub const ROUNDING_ACCOUNT_CODE: &str = "6900";

/// Groups every company starts with. Names are unique per company so the
/// seed list doubles as the lookup key for default account placement.
const DEFAULT_GROUPS: [&str; 10] = [
    "Capital",
    "Current Assets",
    "Current Liabilities",
    "Fixed Assets",
    "Sundry Creditors",
    "Sundry Debtors",
    "Purchase",
    "Sales",
    "Expenses",
    "Duties & Taxes",
];

/// (group name, code, account name, type) of the seeded accounts
const DEFAULT_ACCOUNTS: [(&str, &str, &str, AccountType); 4] = [
    ("Current Assets", CASH_ACCOUNT_CODE, "Cash", AccountType::Asset),
    (
        "Duties & Taxes",
        VAT_RECEIVABLE_CODE,
        "VAT Receivable",
        AccountType::Asset,
    ),
    (
        "Purchase",
        PURCHASE_ACCOUNT_CODE,
        "Purchase",
        AccountType::Expense,
    ),
    ("Expenses", ROUNDING_ACCOUNT_CODE, "Rounding", AccountType::Expense),
];

/// Errors that can occur during company operations
#[derive(Debug, thiserror::Error)]
pub enum CompanyError {
    #[error("Company name already exists: {0}")]
    DuplicateName(String),

    #[error("Company not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for company operations
pub type CompanyResult<T> = Result<T, CompanyError>;

/// Create a company and seed its default groups, accounts and settings
pub async fn create_company(
    pool: &PgPool,
    name: &str,
    address: Option<&str>,
    phone: Option<&str>,
    pan_no: Option<&str>,
    currency: &str,
) -> CompanyResult<Company> {
    if company_repo::find_by_name(pool, name).await?.is_some() {
        return Err(CompanyError::DuplicateName(name.to_string()));
    }

    let mut tx = pool.begin().await?;

    let company = match company_repo::insert_tx(
        &mut tx,
        Uuid::new_v4(),
        name,
        address,
        phone,
        pan_no,
        currency,
    )
    .await
    {
        // A concurrent create can slip past the pre-check
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(CompanyError::DuplicateName(name.to_string()));
        }
        other => other?,
    };

    let mut group_ids: Vec<(&str, Uuid)> = Vec::with_capacity(DEFAULT_GROUPS.len());
    for group_name in DEFAULT_GROUPS {
        let group =
            account_group_repo::insert_tx(&mut tx, Uuid::new_v4(), company.id, group_name, true)
                .await?;
        group_ids.push((group_name, group.id));
    }

    for (group_name, code, account_name, account_type) in DEFAULT_ACCOUNTS {
        let group_id = group_ids
            .iter()
            .find(|(name, _)| *name == group_name)
            .map(|(_, id)| *id)
            .unwrap_or(group_ids[0].1);

        account_repo::insert_tx(
            &mut tx,
            NewAccount {
                id: Uuid::new_v4(),
                company_id: company.id,
                account_group_id: group_id,
                code: code.to_string(),
                name: account_name.to_string(),
                account_type,
                is_default: true,
                pan_no: None,
                address: None,
                phone: None,
            },
        )
        .await?;
    }

    settings_repo::insert_default_tx(&mut tx, company.id).await?;

    tx.commit().await?;

    tracing::info!(
        company_id = %company.id,
        name = %company.name,
        "Company created with default chart"
    );

    Ok(company)
}

/// Update a company's profile. The name stays unique.
pub async fn update_company(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    address: Option<&str>,
    phone: Option<&str>,
    pan_no: Option<&str>,
    currency: &str,
) -> CompanyResult<Company> {
    if let Some(existing) = company_repo::find_by_name(pool, name).await? {
        if existing.id != id {
            return Err(CompanyError::DuplicateName(name.to_string()));
        }
    }

    company_repo::update(pool, id, name, address, phone, pan_no, currency)
        .await?
        .ok_or(CompanyError::NotFound(id))
}
