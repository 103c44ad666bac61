// src/db/company_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::company::{Company, CompanyCategory},
};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let companies =
            sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY nome ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(companies)
    }

    pub async fn list_categories(&self) -> Result<Vec<CompanyCategory>, AppError> {
        let categories = sqlx::query_as::<_, CompanyCategory>(
            "SELECT * FROM company_categories ORDER BY nome ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn find_category(&self, id: Uuid) -> Result<Option<CompanyCategory>, AppError> {
        let category = sqlx::query_as::<_, CompanyCategory>(
            "SELECT * FROM company_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    /// Empresa destino de um pedido de compra: casamento por CNPJ.
    pub async fn find_by_cnpj(&self, cnpj: &str) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE cnpj = $1")
            .bind(cnpj)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    /// Empresas que têm o usuário como aprovador designado.
    pub async fn companies_approved_by(&self, user_id: Uuid) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE approver_id = $1 ORDER BY nome ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(companies)
    }

    // ---
    // Escrita
    // ---

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        nome: &str,
        requires_approver: bool,
        requires_contract: bool,
        receives_purchase_orders: bool,
    ) -> Result<CompanyCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CompanyCategory>(
            r#"
            INSERT INTO company_categories
                (nome, requires_approver, requires_contract, receives_purchase_orders)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(nome)
        .bind(requires_approver)
        .bind(requires_contract)
        .bind(receives_purchase_orders)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::InvalidInput(format!(
                        "Já existe uma categoria chamada '{}'.",
                        nome
                    ));
                }
            }
            e.into()
        })
    }

    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        nome: &str,
        cnpj: &str,
        category_id: Uuid,
        approver_id: Option<Uuid>,
        contract_number: Option<&str>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (nome, cnpj, category_id, approver_id, contract_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(nome)
        .bind(cnpj)
        .bind(category_id)
        .bind(approver_id)
        .bind(contract_number)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::InvalidInput(format!(
                        "Já existe uma empresa com o CNPJ '{}'.",
                        cnpj
                    ));
                }
            }
            e.into()
        })
    }
}
