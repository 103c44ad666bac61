// src/db/purchase_order_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::orders::{Product, PurchaseOrder, PurchaseOrderItem},
};

#[derive(Clone)]
pub struct PurchaseOrderRepository {
    pool: PgPool,
}

impl PurchaseOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Produtos (catálogo simples)
    // ---

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        nome: &str,
        unidade: &str,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (nome, unidade) VALUES ($1, $2) RETURNING *",
        )
        .bind(nome)
        .bind(unidade)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY nome ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    // ---
    // Pedidos de Compra
    // ---

    pub async fn create_purchase_order<'e, E>(
        &self,
        executor: E,
        numero: &str,
        company_id: Uuid,
        destino_cnpj: &str,
        valid_from: chrono::NaiveDate,
        valid_until: chrono::NaiveDate,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let po = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (numero, company_id, destino_cnpj, valid_from, valid_until)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(numero)
        .bind(company_id)
        .bind(destino_cnpj)
        .bind(valid_from)
        .bind(valid_until)
        .fetch_one(executor)
        .await?;
        Ok(po)
    }

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        purchase_order_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<PurchaseOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            INSERT INTO purchase_order_items (purchase_order_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(purchase_order_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::InvalidInput(
                        "O pedido já possui um item para este produto.".into(),
                    );
                }
            }
            e.into()
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PurchaseOrder>, AppError> {
        let po = sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(po)
    }

    pub async fn find_item(
        &self,
        purchase_order_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<PurchaseOrderItem>, AppError> {
        let item = sqlx::query_as::<_, PurchaseOrderItem>(
            "SELECT * FROM purchase_order_items WHERE purchase_order_id = $1 AND product_id = $2",
        )
        .bind(purchase_order_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    /// Variante com lock de linha: serializa criações concorrentes de ordens
    /// contra o mesmo par (pedido, produto). Deve rodar dentro de transação.
    pub async fn find_item_for_update<'e, E>(
        &self,
        executor: E,
        purchase_order_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<PurchaseOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            SELECT * FROM purchase_order_items
            WHERE purchase_order_id = $1 AND product_id = $2
            FOR UPDATE
            "#,
        )
        .bind(purchase_order_id)
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    // ---
    // Listagens com escopo de visibilidade
    // ---

    pub async fn list_all(&self) -> Result<Vec<PurchaseOrder>, AppError> {
        let pos = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(pos)
    }

    /// Pedidos cujo destino pertence às empresas do aprovador.
    pub async fn list_by_destino_cnpjs(
        &self,
        cnpjs: &[String],
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let pos = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT * FROM purchase_orders
            WHERE destino_cnpj = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(cnpjs)
        .fetch_all(&self.pool)
        .await?;
        Ok(pos)
    }

    /// Pedidos em que a empresa é emissora ou destino (por CNPJ).
    pub async fn list_by_company(
        &self,
        company_id: Uuid,
        cnpj: &str,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let pos = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT * FROM purchase_orders
            WHERE company_id = $1 OR destino_cnpj = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(cnpj)
        .fetch_all(&self.pool)
        .await?;
        Ok(pos)
    }
}
