// src/handlers/orders.rs

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
            ConfirmDeliveryPayload, CreateOrderPayload, DeliveryOrder, ReprogramarPayload,
            TrackingPointPayload, UploadDocumentsPayload,
        },
    },
};

// =============================================================================
//  1. CRIAÇÃO E LISTAGEM
// =============================================================================

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Ordem criada após checagem de saldo", body = DeliveryOrder),
        (status = 400, description = "Saldo insuficiente (corpo traz saldoDisponivel)")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state.order_service.create_order(&user.0, &payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Ordens visíveis para o usuário", body = [DeliveryOrder])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    user.0.exigir(Capability::OrdersRead)?;

    let escopo = app_state.scope_service.scope_for(&user.0).await?;
    let orders = app_state.order_service.list(&escopo).await?;
    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/orders/urgent
#[utoipa::path(
    get,
    path = "/api/orders/urgent",
    tag = "Orders",
    responses(
        (status = 200, description = "Urgentes aguardando aprovação no escopo do aprovador", body = [DeliveryOrder])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_urgent_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    user.0.exigir(Capability::OrdersRead)?;

    let escopo = app_state.scope_service.scope_for(&user.0).await?;
    let orders = app_state.order_service.list_urgent(&user.0, &escopo).await?;
    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    responses(
        (status = 200, description = "Detalhe da ordem", body = DeliveryOrder),
        (status = 404, description = "Ordem não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    user.0.exigir(Capability::OrdersRead)?;

    let order = app_state.order_service.find_order(id).await?;
    Ok((StatusCode::OK, Json(order)))
}

// =============================================================================
//  2. APROVAÇÃO DE URGENTES
// =============================================================================

// PUT /api/orders/{id}/approve
#[utoipa::path(
    put,
    path = "/api/orders/{id}/approve",
    tag = "Orders",
    responses(
        (status = 200, description = "Ordem aprovada", body = DeliveryOrder),
        (status = 403, description = "Usuário não é o aprovador do destino"),
        (status = 409, description = "Ordem fora do estado Registrado")
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn approve_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.order_service.approve_order(&user.0, id).await?;
    Ok((StatusCode::OK, Json(order)))
}

// PUT /api/orders/{id}/reject
#[utoipa::path(
    put,
    path = "/api/orders/{id}/reject",
    tag = "Orders",
    responses(
        (status = 200, description = "Ordem rejeitada (Cancelado)", body = DeliveryOrder)
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn reject_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.order_service.reject_order(&user.0, id).await?;
    Ok((StatusCode::OK, Json(order)))
}

// =============================================================================
//  3. DOCUMENTOS, RASTREAMENTO E CONFIRMAÇÃO
// =============================================================================

// POST /api/orders/{id}/documents
#[utoipa::path(
    post,
    path = "/api/orders/{id}/documents",
    tag = "Orders",
    request_body = UploadDocumentsPayload,
    responses(
        (status = 200, description = "Documentos anexados; ordem Carregado", body = DeliveryOrder),
        (status = 409, description = "Ordem urgente ainda não aprovada")
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn upload_documents(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UploadDocumentsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state
        .order_service
        .upload_documents(&user.0, id, &payload)
        .await?;
    Ok((StatusCode::OK, Json(order)))
}

// POST /api/orders/{id}/tracking
#[utoipa::path(
    post,
    path = "/api/orders/{id}/tracking",
    tag = "Orders",
    request_body = TrackingPointPayload,
    responses(
        (status = 201, description = "Ponto registrado; primeiro ponto move a ordem para Em Rota")
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn register_tracking_point(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TrackingPointPayload>,
) -> Result<impl IntoResponse, AppError> {
    let point = app_state
        .order_service
        .registrar_rastreamento(&user.0, id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(point)))
}

// POST /api/orders/{id}/confirmar
#[utoipa::path(
    post,
    path = "/api/orders/{id}/confirmar",
    tag = "Orders",
    request_body = ConfirmDeliveryPayload,
    responses(
        (status = 200, description = "Entrega confirmada (Entregue)", body = DeliveryOrder),
        (status = 409, description = "Ordem fora do estado Em Rota")
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn confirm_delivery(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmDeliveryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state
        .order_service
        .confirm_delivery(&user.0, id, &payload)
        .await?;
    Ok((StatusCode::OK, Json(order)))
}

// =============================================================================
//  4. REPROGRAMAÇÃO
// =============================================================================

// POST /api/orders/{id}/reprogramar
#[utoipa::path(
    post,
    path = "/api/orders/{id}/reprogramar",
    tag = "Reprogramação",
    request_body = ReprogramarPayload,
    responses(
        (status = 200, description = "Reprogramação solicitada (Suspenso)", body = DeliveryOrder),
        (status = 400, description = "Justificativa ou data fora dos limites"),
        (status = 403, description = "Usuário não pertence à empresa destino")
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn request_reprogramacao(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReprogramarPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state
        .reprogramacao_service
        .solicitar(&user.0, id, &payload)
        .await?;
    Ok((StatusCode::OK, Json(order)))
}

// PUT /api/orders/{id}/reprogramacao/aprovar
#[utoipa::path(
    put,
    path = "/api/orders/{id}/reprogramacao/aprovar",
    tag = "Reprogramação",
    responses(
        (status = 200, description = "Reprogramação aceita; data atualizada", body = DeliveryOrder),
        (status = 403, description = "Usuário não pertence ao fornecedor")
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn approve_reprogramacao(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.reprogramacao_service.aprovar(&user.0, id).await?;
    Ok((StatusCode::OK, Json(order)))
}

// PUT /api/orders/{id}/reprogramacao/rejeitar
#[utoipa::path(
    put,
    path = "/api/orders/{id}/reprogramacao/rejeitar",
    tag = "Reprogramação",
    responses(
        (status = 200, description = "Reprogramação rejeitada; ordem cancelada e quantidade zerada", body = DeliveryOrder)
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn reject_reprogramacao(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.reprogramacao_service.rejeitar(&user.0, id).await?;
    Ok((StatusCode::OK, Json(order)))
}

// =============================================================================
//  5. EXCLUSÃO DEFINITIVA
// =============================================================================

// DELETE /api/orders/{id}
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    tag = "Orders",
    responses(
        (status = 204, description = "Ordem e artefatos removidos"),
        (status = 403, description = "Apenas o super-admin")
    ),
    params(("id" = Uuid, Path, description = "ID da ordem")),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.order_service.delete_order(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
