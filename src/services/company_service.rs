// src/services/company_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::CompanyRepository,
    models::company::{Company, CompanyCategory, CreateCategoryPayload, CreateCompanyPayload},
};

#[derive(Clone)]
pub struct CompanyService {
    company_repo: CompanyRepository,
    pool: PgPool,
}

impl CompanyService {
    pub fn new(company_repo: CompanyRepository, pool: PgPool) -> Self {
        Self { company_repo, pool }
    }

    pub async fn create_category(
        &self,
        payload: &CreateCategoryPayload,
    ) -> Result<CompanyCategory, AppError> {
        self.company_repo
            .create_category(
                &self.pool,
                &payload.nome,
                payload.requires_approver,
                payload.requires_contract,
                payload.receives_purchase_orders,
            )
            .await
    }

    pub async fn list_categories(&self) -> Result<Vec<CompanyCategory>, AppError> {
        self.company_repo.list_categories().await
    }

    pub async fn create_company(
        &self,
        payload: &CreateCompanyPayload,
    ) -> Result<Company, AppError> {
        let categoria = self
            .company_repo
            .find_category(payload.category_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Categoria".into()))?;

        // Categoria que exige contrato não aceita empresa sem número de contrato
        if categoria.requires_contract && payload.contract_number.is_none() {
            return Err(AppError::InvalidInput(
                "Esta categoria exige o número do contrato.".into(),
            ));
        }

        self.company_repo
            .create_company(
                &self.pool,
                &payload.nome,
                &payload.cnpj,
                payload.category_id,
                payload.approver_id,
                payload.contract_number.as_deref(),
            )
            .await
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        self.company_repo.list_companies().await
    }
}
