pub mod account_group_repo;
pub mod account_repo;
pub mod bill_counter_repo;
pub mod company_repo;
pub mod fiscal_year_repo;
pub mod item_repo;
pub mod ledger_repo;
pub mod opening_balance_repo;
pub mod purchase_repo;
pub mod report_query_repo;
pub mod settings_repo;
pub mod stock_repo;
pub mod store_repo;
