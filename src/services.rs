pub mod auth;
pub use auth::AuthService;
pub mod company_service;
pub use company_service::CompanyService;
pub mod purchase_order_service;
pub use purchase_order_service::PurchaseOrderService;
pub mod saldo_service;
pub use saldo_service::SaldoService;
pub mod scope_service;
pub use scope_service::{OrderScope, ScopeService};
pub mod order_service;
pub use order_service::OrderService;
pub mod reprogramacao_service;
pub use reprogramacao_service::ReprogramacaoService;
