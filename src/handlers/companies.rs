// src/handlers/companies.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::Capability,
        company::{CreateCategoryPayload, CreateCompanyPayload},
    },
};

// ---
// Categorias de empresa
// ---

pub async fn create_category(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    user.0.exigir(Capability::CompaniesManage)?;
    payload.validate()?;

    let categoria = app_state.company_service.create_category(&payload).await?;
    Ok((StatusCode::CREATED, Json(categoria)))
}

pub async fn list_categories(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let categorias = app_state.company_service.list_categories().await?;
    Ok((StatusCode::OK, Json(categorias)))
}

// ---
// Empresas
// ---

pub async fn create_company(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    user.0.exigir(Capability::CompaniesManage)?;
    payload.validate()?;

    let empresa = app_state.company_service.create_company(&payload).await?;
    Ok((StatusCode::CREATED, Json(empresa)))
}

pub async fn list_companies(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let empresas = app_state.company_service.list_companies().await?;
    Ok((StatusCode::OK, Json(empresas)))
}

// ---
// Auditoria (somente super-admin ou quem tiver a capacidade)
// ---

pub async fn list_audit_logs(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    user.0.exigir(Capability::AuditRead)?;

    let logs = app_state.audit_repo.list_recent(200).await?;
    Ok((StatusCode::OK, Json(logs)))
}
