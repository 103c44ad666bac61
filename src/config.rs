// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::{env, time::Duration};

use crate::{
    common::documents::{DocumentStore, LocalDocumentStore},
    db::{
        AuditRepository, CompanyRepository, OrderRepository, PurchaseOrderRepository,
        UserRepository,
    },
    services::{
        AuthService, CompanyService, OrderService, PurchaseOrderService, ReprogramacaoService,
        SaldoService, ScopeService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub purchase_order_service: PurchaseOrderService,
    pub saldo_service: SaldoService,
    pub scope_service: ScopeService,
    pub order_service: OrderService,
    pub reprogramacao_service: ReprogramacaoService,
    pub audit_repo: AuditRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        // Diretório dos artefatos de documento (chaves gravadas pelas ordens)
        let documentos_dir =
            env::var("DOCUMENTOS_DIR").unwrap_or_else(|_| "./documentos".to_string());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let purchase_order_repo = PurchaseOrderRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let document_store: Arc<dyn DocumentStore> =
            Arc::new(LocalDocumentStore::new(documentos_dir));

        let auth_service = AuthService::new(
            user_repo,
            company_repo.clone(),
            jwt_secret,
            db_pool.clone(),
        );
        let company_service = CompanyService::new(company_repo.clone(), db_pool.clone());
        let purchase_order_service = PurchaseOrderService::new(
            purchase_order_repo.clone(),
            audit_repo.clone(),
            db_pool.clone(),
        );
        let saldo_service = SaldoService::new(
            purchase_order_repo.clone(),
            order_repo.clone(),
            db_pool.clone(),
        );
        let scope_service = ScopeService::new(company_repo.clone());
        let order_service = OrderService::new(
            order_repo.clone(),
            purchase_order_repo.clone(),
            company_repo.clone(),
            audit_repo.clone(),
            document_store,
            db_pool.clone(),
        );
        let reprogramacao_service = ReprogramacaoService::new(
            order_repo,
            purchase_order_repo,
            company_repo,
            audit_repo.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            auth_service,
            company_service,
            purchase_order_service,
            saldo_service,
            scope_service,
            order_service,
            reprogramacao_service,
            audit_repo,
        })
    }
}
