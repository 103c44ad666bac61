// src/services/purchase_order_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AuditRepository, PurchaseOrderRepository},
    models::{
        auth::CurrentUser,
        orders::{CreateProductPayload, CreatePurchaseOrderPayload, Product, PurchaseOrder},
    },
    services::scope_service::OrderScope,
};

#[derive(Clone)]
pub struct PurchaseOrderService {
    purchase_order_repo: PurchaseOrderRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl PurchaseOrderService {
    pub fn new(
        purchase_order_repo: PurchaseOrderRepository,
        audit_repo: AuditRepository,
        pool: PgPool,
    ) -> Self {
        Self { purchase_order_repo, audit_repo, pool }
    }

    pub async fn create_product(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        self.purchase_order_repo
            .create_product(&self.pool, &payload.nome, &payload.unidade)
            .await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.purchase_order_repo.list_products().await
    }

    /// Cria o pedido de compra com seus itens em uma única transação: ou
    /// tudo entra, ou nada entra.
    pub async fn create_purchase_order(
        &self,
        current: &CurrentUser,
        payload: &CreatePurchaseOrderPayload,
    ) -> Result<PurchaseOrder, AppError> {
        payload.validate_consistency()?;

        // Todos os produtos referenciados precisam existir
        for item in &payload.itens {
            self.purchase_order_repo
                .find_product(item.product_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Produto".into()))?;
        }

        let mut tx = self.pool.begin().await?;

        let po = self
            .purchase_order_repo
            .create_purchase_order(
                &mut *tx,
                &payload.numero,
                current.user.company_id,
                &payload.destino_cnpj,
                payload.valid_from,
                payload.valid_until,
            )
            .await?;

        for item in &payload.itens {
            self.purchase_order_repo
                .add_item(&mut *tx, po.id, item.product_id, item.quantity)
                .await?;
        }

        self.audit_repo
            .record(
                &mut *tx,
                Some(current.user.id),
                "pedido_compra_criado",
                &po.numero,
                Some(&format!("{} item(ns) | destino {}", payload.itens.len(), po.destino_cnpj)),
            )
            .await?;

        tx.commit().await?;
        Ok(po)
    }

    pub async fn list(&self, escopo: &OrderScope) -> Result<Vec<PurchaseOrder>, AppError> {
        match escopo {
            OrderScope::Unrestricted => self.purchase_order_repo.list_all().await,
            OrderScope::Approver { destino_cnpjs } => {
                self.purchase_order_repo.list_by_destino_cnpjs(destino_cnpjs).await
            }
            OrderScope::Company { company_id, cnpj } => {
                self.purchase_order_repo.list_by_company(*company_id, cnpj).await
            }
        }
    }
}
