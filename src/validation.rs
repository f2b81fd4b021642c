//! Validation logic for purchase bill payloads
//!
//! Structural checks run before the posting transaction opens; the
//! cross-record checks (fiscal year range, VAT exemption against loaded
//! items) run on rows the service has already fetched inside it.

use chrono::NaiveDate;
use thiserror::Error;

use crate::contracts::purchase_bill::{PurchaseBillInput, PurchaseLineInput};
use crate::repos::fiscal_year_repo::FiscalYear;
use crate::repos::item_repo::Item;

/// Validation errors for purchase bill payloads
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Bill must have at least 1 line, got {0}")]
    InsufficientLines(usize),

    #[error("Discount percent must be between 0 and 100, got {0}")]
    InvalidDiscountPct(f64),

    #[error("Note exceeds 500 characters, got {0}")]
    NoteTooLong(usize),

    #[error("Line {0}: batch number cannot be empty")]
    EmptyBatchNo(usize),

    #[error("Line {0}: quantity must be positive, got {1}")]
    NonPositiveQty(usize, i64),

    #[error("Line {0}: rate must be non-negative, got {1}")]
    NegativeRate(usize, f64),

    #[error("Line {0}: store is required when store management is enabled")]
    StoreRequired(usize),

    #[error("Line {0}: rack given without a store")]
    RackWithoutStore(usize),

    #[error("Bill is VAT-exempt but item '{0}' is vatable")]
    VatExemptVatableItem(String),

    #[error("Bill date {date} is outside fiscal year {label} ({start} to {end})")]
    DateOutsideFiscalYear {
        date: NaiveDate,
        label: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Validate a purchase bill payload
///
/// # Validation Rules
///
/// - `lines`: must have at least 1 item
/// - `discount_pct`: must be within 0..=100
/// - `note`: if present, must be <= 500 characters
/// - Each line:
///   - `batch_no`: must be non-empty
///   - `qty`: must be > 0
///   - `rate`: must be >= 0
///   - `store_id`: required when store management is enabled
///
/// # Errors
///
/// Returns `ValidationError` if any validation rule is violated
pub fn validate_purchase_bill(
    payload: &PurchaseBillInput,
    store_management_enabled: bool,
) -> Result<(), ValidationError> {
    if payload.lines.is_empty() {
        return Err(ValidationError::InsufficientLines(payload.lines.len()));
    }

    // contains() rejects NaN along with out-of-range values
    if !(0.0..=100.0).contains(&payload.discount_pct) {
        return Err(ValidationError::InvalidDiscountPct(payload.discount_pct));
    }

    if let Some(ref note) = payload.note {
        if note.len() > 500 {
            return Err(ValidationError::NoteTooLong(note.len()));
        }
    }

    for (idx, line) in payload.lines.iter().enumerate() {
        validate_purchase_line(line, idx, store_management_enabled)?;
    }

    Ok(())
}

/// Validate a single purchase line
fn validate_purchase_line(
    line: &PurchaseLineInput,
    index: usize,
    store_management_enabled: bool,
) -> Result<(), ValidationError> {
    if line.batch_no.trim().is_empty() {
        return Err(ValidationError::EmptyBatchNo(index));
    }

    if line.qty <= 0 {
        return Err(ValidationError::NonPositiveQty(index, line.qty));
    }

    // is_finite also rejects NaN rates that would poison the money math
    if !line.rate.is_finite() || line.rate < 0.0 {
        return Err(ValidationError::NegativeRate(index, line.rate));
    }

    if store_management_enabled && line.store_id.is_none() {
        return Err(ValidationError::StoreRequired(index));
    }

    if line.rack_id.is_some() && line.store_id.is_none() {
        return Err(ValidationError::RackWithoutStore(index));
    }

    Ok(())
}

/// Reject a VAT-exempt bill that contains any vatable item.
///
/// The items must already be loaded (inside the posting transaction) so
/// the check sees the same rows the bill will reference.
pub fn check_vat_exempt_items(vat_exempt: bool, items: &[Item]) -> Result<(), ValidationError> {
    if !vat_exempt {
        return Ok(());
    }

    for item in items {
        if item.is_vatable {
            return Err(ValidationError::VatExemptVatableItem(item.name.clone()));
        }
    }

    Ok(())
}

/// Check that the bill date falls inside the fiscal year's range
pub fn check_bill_date_in_fiscal_year(
    bill_date: NaiveDate,
    fy: &FiscalYear,
) -> Result<(), ValidationError> {
    if bill_date < fy.start_date || bill_date > fy.end_date {
        return Err(ValidationError::DateOutsideFiscalYear {
            date: bill_date,
            label: fy.label.clone(),
            start: fy.start_date,
            end: fy.end_date,
        });
    }

    Ok(())
}
