// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::list_urgent_orders,
        handlers::orders::get_order,
        handlers::orders::approve_order,
        handlers::orders::reject_order,
        handlers::orders::upload_documents,
        handlers::orders::register_tracking_point,
        handlers::orders::confirm_delivery,
        handlers::orders::request_reprogramacao,
        handlers::orders::approve_reprogramacao,
        handlers::orders::reject_reprogramacao,
        handlers::orders::delete_order,

        // --- Purchase Orders ---
        handlers::purchase_orders::create_purchase_order,
        handlers::purchase_orders::list_purchase_orders,
        handlers::purchase_orders::get_saldo,
        handlers::purchase_orders::get_entregue,
    ),
    components(
        schemas(
            // --- Domínio ---
            models::orders::OrderStatus,
            models::orders::DeliveryOrder,
            models::orders::PurchaseOrder,
            models::orders::PurchaseOrderItem,
            models::orders::Product,
            models::orders::TrackingPoint,
            models::orders::AuditLog,
            models::orders::SaldoProduto,
            models::orders::QuantidadeEntregue,
            models::company::Company,
            models::company::CompanyCategory,
            models::auth::User,
            models::auth::Role,

            // --- Payloads ---
            models::orders::CreateOrderPayload,
            models::orders::CreateProductPayload,
            models::orders::CreatePurchaseOrderPayload,
            models::orders::PurchaseOrderItemPayload,
            models::orders::UploadDocumentsPayload,
            models::orders::ConfirmDeliveryPayload,
            models::orders::ReprogramarPayload,
            models::orders::TrackingPointPayload,
            models::company::CreateCategoryPayload,
            models::company::CreateCompanyPayload,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
        )
    ),
    tags(
        (name = "Orders", description = "Ordens de entrega e seu ciclo de vida"),
        (name = "Reprogramação", description = "Negociação de nova data de entrega"),
        (name = "Purchase Orders", description = "Pedidos de compra e razão de saldo")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
