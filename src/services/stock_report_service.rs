//! Stock reporting
//!
//! Groups a company's stock lots by item with aggregate quantity and a
//! valuation at the item's last purchase rate. Supports narrowing to a
//! store and to batches expiring within a window, the pharmacy view.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::repos::report_query_repo::{self, ReportQueryError, StockReportLot};

/// One batch shown under its item
#[derive(Debug, Clone, Serialize)]
pub struct StockLotDto {
    pub batch_no: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i64,
    pub rate_minor: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<Uuid>,
}

/// One item with its lots in scope
#[derive(Debug, Clone, Serialize)]
pub struct StockReportItem {
    pub item_id: Uuid,
    pub name: String,
    pub unit: String,
    /// Sum of the lots in scope, not the company-wide aggregate when a
    /// filter narrows the report
    pub qty: i64,
    pub last_rate_minor: i64,
    pub valuation_minor: i64,
    pub lots: Vec<StockLotDto>,
}

/// Stock report response
#[derive(Debug, Clone, Serialize)]
pub struct StockReportResponse {
    pub company_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiring_on_or_before: Option<NaiveDate>,
    pub items: Vec<StockReportItem>,
    pub total_valuation_minor: i64,
}

/// Errors that can occur during stock reporting
#[derive(Debug, Error)]
pub enum StockReportError {
    #[error("expiring_within_days must be non-negative, got {0}")]
    InvalidExpiryWindow(i64),

    #[error("Report query error: {0}")]
    Query(#[from] ReportQueryError),
}

/// Build the stock report for a company
pub async fn get_stock_report(
    pool: &PgPool,
    company_id: Uuid,
    store_id: Option<Uuid>,
    expiring_within_days: Option<i64>,
) -> Result<StockReportResponse, StockReportError> {
    let cutoff = match expiring_within_days {
        Some(days) if days < 0 => return Err(StockReportError::InvalidExpiryWindow(days)),
        Some(days) => Utc::now()
            .date_naive()
            .checked_add_signed(Duration::days(days))
            .map(Some)
            .ok_or(StockReportError::InvalidExpiryWindow(days))?,
        None => None,
    };

    let lots = report_query_repo::query_stock_lots(pool, company_id, store_id, cutoff).await?;
    let items = group_lots(lots);
    let total_valuation_minor = items.iter().map(|i| i.valuation_minor).sum();

    Ok(StockReportResponse {
        company_id,
        store_id,
        expiring_on_or_before: cutoff,
        items,
        total_valuation_minor,
    })
}

/// Group lots under their items, ordered by item name. Lot order within
/// an item follows the query (nearest expiry first).
fn group_lots(lots: Vec<StockReportLot>) -> Vec<StockReportItem> {
    let mut items: Vec<StockReportItem> = Vec::new();

    for lot in lots {
        let dto = StockLotDto {
            batch_no: lot.batch_no,
            expiry_date: lot.expiry_date,
            qty: lot.qty,
            rate_minor: lot.rate_minor,
            store_id: lot.store_id,
            rack_id: lot.rack_id,
        };

        match items.iter_mut().find(|i| i.item_id == lot.item_id) {
            Some(item) => {
                item.qty += dto.qty;
                item.lots.push(dto);
            }
            None => items.push(StockReportItem {
                item_id: lot.item_id,
                name: lot.item_name,
                unit: lot.unit,
                qty: dto.qty,
                last_rate_minor: lot.last_rate_minor,
                valuation_minor: 0,
                lots: vec![dto],
            }),
        }
    }

    for item in &mut items {
        item.valuation_minor = item.qty.saturating_mul(item.last_rate_minor);
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));

    items
}
