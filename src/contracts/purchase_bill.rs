//! Purchase bill request payload
//!
//! The payload shared by the create and edit endpoints. Monetary fields
//! arrive as decimal rupees and are converted to integer paisa at the
//! service boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the bill is settled. Credit bills owe the supplier; cash bills
/// credit the cash account directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_mode", rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Credit,
}

/// Payload for creating or editing a purchase bill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseBillInput {
    pub company_id: Uuid,

    pub fiscal_year_id: Uuid,

    /// Supplier party account in the chart of accounts
    pub supplier_account_id: Uuid,

    /// The supplier's own bill/invoice number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_bill_no: Option<String>,

    /// Accounting date for the bill (must fall inside the fiscal year)
    pub bill_date: NaiveDate,

    pub payment_mode: PaymentMode,

    /// VAT-exempt bills may not contain vatable items
    #[serde(default)]
    pub vat_exempt: bool,

    /// Bill-level discount percent (0..=100)
    #[serde(default)]
    pub discount_pct: f64,

    /// Optional note (<= 500 chars)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Bill lines (must have at least 1 item)
    pub lines: Vec<PurchaseLineInput>,
}

/// A single line on a purchase bill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseLineInput {
    pub item_id: Uuid,

    /// Batch number stamped on the received stock lot
    pub batch_no: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,

    /// Quantity received (must be > 0)
    pub qty: i64,

    /// Unit purchase rate in rupees (must be >= 0)
    pub rate: f64,

    /// Target store, required when store management is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<Uuid>,
}
