pub mod purchase_bill;
