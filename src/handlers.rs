pub mod auth;
pub mod companies;
pub mod orders;
pub mod purchase_orders;
