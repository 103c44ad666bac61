// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Categoria de empresa. As três flags juntas decidem se os usuários da
// empresa têm visibilidade restrita (ver ScopeService).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCategory {
    pub id: Uuid,
    pub nome: String,
    pub requires_approver: bool,
    pub requires_contract: bool,
    pub receives_purchase_orders: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub nome: String,
    // CNPJ: o pedido de compra referencia o destino por este documento.
    pub cnpj: String,
    pub category_id: Uuid,
    // Usuário habilitado a aprovar ordens destinadas a esta empresa.
    pub approver_id: Option<Uuid>,
    pub contract_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    #[serde(default)]
    pub requires_approver: bool,
    #[serde(default)]
    pub requires_contract: bool,
    #[serde(default)]
    pub receives_purchase_orders: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    #[validate(length(min = 11, message = "O CNPJ/CPF é obrigatório."))]
    pub cnpj: String,
    pub category_id: Uuid,
    pub approver_id: Option<Uuid>,
    pub contract_number: Option<String>,
}
