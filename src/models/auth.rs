// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub nome: String,
    pub company_id: Uuid,
    pub role_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Cargo com a lista de slugs de permissão ("orders:write", "*", ...)
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub nome: String,
    pub permissions: Vec<String>,
}

// ---
// Capacidades tipadas
// ---
// As permissões deixam de ser varreduras de arrays de strings espalhadas
// pelos handlers: os slugs do cargo são resolvidos UMA vez, na validação do
// token, para este conjunto fechado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    OrdersRead,
    OrdersWrite,
    PurchaseOrdersManage,
    CompaniesManage,
    ProductsManage,
    AuditRead,
}

impl Capability {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "orders:read" => Some(Self::OrdersRead),
            "orders:write" => Some(Self::OrdersWrite),
            "purchase-orders:manage" => Some(Self::PurchaseOrdersManage),
            "companies:manage" => Some(Self::CompaniesManage),
            "products:manage" => Some(Self::ProductsManage),
            "audit:read" => Some(Self::AuditRead),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::OrdersRead => "orders:read",
            Self::OrdersWrite => "orders:write",
            Self::PurchaseOrdersManage => "purchase-orders:manage",
            Self::CompaniesManage => "companies:manage",
            Self::ProductsManage => "products:manage",
            Self::AuditRead => "audit:read",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PermissionSet {
    wildcard: bool,
    caps: HashSet<Capability>,
}

impl PermissionSet {
    // Slugs desconhecidos são ignorados (cargos antigos podem carregar
    // permissões que o backend não conhece mais).
    pub fn from_slugs(slugs: &[String]) -> Self {
        let wildcard = slugs.iter().any(|s| s == "*");
        let caps = slugs
            .iter()
            .filter_map(|s| Capability::from_slug(s))
            .collect();
        Self { wildcard, caps }
    }

    pub fn allows(&self, cap: Capability) -> bool {
        self.wildcard || self.caps.contains(&cap)
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }
}

// Usuário autenticado + capacidades já resolvidas, carregado pelo
// auth_guard e injetado nas extensions da requisição.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub permissions: PermissionSet,
}

impl CurrentUser {
    // O "super-admin" é o cargo com permissão coringa, resolvido na
    // autenticação (não existe mais id numérico mágico).
    pub fn is_super_admin(&self) -> bool {
        self.permissions.is_wildcard()
    }

    pub fn exigir(&self, cap: Capability) -> Result<(), AppError> {
        if self.permissions.allows(cap) {
            return Ok(());
        }
        Err(AppError::AuthorizationError(format!(
            "Você precisa da permissão '{}' para realizar esta ação.",
            cap.slug()
        )))
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    pub company_id: Uuid,
    pub role_id: Uuid,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slugs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn coringa_concede_todas_as_capacidades() {
        let set = PermissionSet::from_slugs(&slugs(&["*"]));
        assert!(set.is_wildcard());
        assert!(set.allows(Capability::OrdersWrite));
        assert!(set.allows(Capability::AuditRead));
    }

    #[test]
    fn conjunto_sem_coringa_so_permite_o_listado() {
        let set = PermissionSet::from_slugs(&slugs(&["orders:read", "orders:write"]));
        assert!(!set.is_wildcard());
        assert!(set.allows(Capability::OrdersRead));
        assert!(set.allows(Capability::OrdersWrite));
        assert!(!set.allows(Capability::CompaniesManage));
    }

    #[test]
    fn slugs_desconhecidos_sao_ignorados() {
        let set = PermissionSet::from_slugs(&slugs(&["relatorios:pdf", "orders:read"]));
        assert!(set.allows(Capability::OrdersRead));
        assert!(!set.allows(Capability::AuditRead));
    }
}
