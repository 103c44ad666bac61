// src/handlers/purchase_orders.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::Capability,
        orders::{
            CreateProductPayload, CreatePurchaseOrderPayload, PurchaseOrder, QuantidadeEntregue,
            SaldoProduto,
        },
    },
};

// ---
// Catálogo de produtos
// ---

pub async fn create_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    user.0.exigir(Capability::ProductsManage)?;
    payload.validate()?;

    let produto = app_state.purchase_order_service.create_product(&payload).await?;
    Ok((StatusCode::CREATED, Json(produto)))
}

pub async fn list_products(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let produtos = app_state.purchase_order_service.list_products().await?;
    Ok((StatusCode::OK, Json(produtos)))
}

// ---
// Pedidos de compra
// ---

// POST /api/purchase-orders
#[utoipa::path(
    post,
    path = "/api/purchase-orders",
    tag = "Purchase Orders",
    request_body = CreatePurchaseOrderPayload,
    responses(
        (status = 201, description = "Pedido criado com seus itens", body = PurchaseOrder)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePurchaseOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    user.0.exigir(Capability::PurchaseOrdersManage)?;
    payload.validate()?;

    let po = app_state
        .purchase_order_service
        .create_purchase_order(&user.0, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(po)))
}

// GET /api/purchase-orders
#[utoipa::path(
    get,
    path = "/api/purchase-orders",
    tag = "Purchase Orders",
    responses(
        (status = 200, description = "Pedidos visíveis para o usuário", body = [PurchaseOrder])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_purchase_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let escopo = app_state.scope_service.scope_for(&user.0).await?;
    let pos = app_state.purchase_order_service.list(&escopo).await?;
    Ok((StatusCode::OK, Json(pos)))
}

// ---
// Razão de saldo
// ---

// GET /api/purchase-orders/{id}/products/{product_id}/saldo
#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}/products/{product_id}/saldo",
    tag = "Purchase Orders",
    responses(
        (status = 200, description = "Saldo disponível/contratado/consumido do par", body = SaldoProduto),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do pedido de compra"),
        ("product_id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_saldo(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let saldo = app_state.saldo_service.saldo(id, product_id).await?;
    Ok((StatusCode::OK, Json(saldo)))
}

// GET /api/purchase-orders/{id}/products/{product_id}/entregue
#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}/products/{product_id}/entregue",
    tag = "Purchase Orders",
    responses(
        (status = 200, description = "Quantidade efetivamente entregue do par", body = QuantidadeEntregue)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do pedido de compra"),
        ("product_id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_entregue(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let entregue = app_state.saldo_service.entregue(id, product_id).await?;
    Ok((StatusCode::OK, Json(entregue)))
}
