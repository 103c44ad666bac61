// src/db/audit_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::orders::AuditLog};

// Livro-razão de auditoria: cada mutação bem-sucedida do core grava
// exatamente uma linha (ator, ação, alvo, detalhe livre).
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record<'e, E>(
        &self,
        executor: E,
        user_id: Option<Uuid>,
        acao: &str,
        alvo: &str,
        detalhe: Option<&str>,
    ) -> Result<AuditLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, acao, alvo, detalhe)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(acao)
        .bind(alvo)
        .bind(detalhe)
        .fetch_one(executor)
        .await?;
        Ok(log)
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLog>, AppError> {
        let logs = sqlx::query_as::<_, AuditLog>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
