pub mod company_service;
pub mod fiscal_year_service;
pub mod ledger_service;
pub mod opening_balance_service;
pub mod purchase_math;
pub mod purchase_service;
pub mod stock_report_service;
pub mod trial_balance_service;
