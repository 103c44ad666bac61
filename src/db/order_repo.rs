// src/db/order_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::orders::{DeliveryOrder, OrderStatus, TrackingPoint},
};

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DeliveryOrder>, AppError> {
        let order = sqlx::query_as::<_, DeliveryOrder>("SELECT * FROM delivery_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Lock de linha para transições: evita duas transições concorrentes
    /// lendo o mesmo estado de origem. Deve rodar dentro de transação.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<DeliveryOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, DeliveryOrder>(
            "SELECT * FROM delivery_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    /// Quantidade já consumida do par (pedido, produto): soma de todas as
    /// ordens não-canceladas.
    pub async fn sum_consumed<'e, E>(
        &self,
        executor: E,
        purchase_order_id: Uuid,
        product_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumed: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM delivery_orders
            WHERE purchase_order_id = $1
              AND product_id = $2
              AND status <> 'Cancelado'::order_status
            "#,
        )
        .bind(purchase_order_id)
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(consumed)
    }

    /// Ordens já entregues do par, para o cálculo de quantidade entregue.
    pub async fn list_delivered(
        &self,
        purchase_order_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<DeliveryOrder>, AppError> {
        let orders = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            SELECT * FROM delivery_orders
            WHERE purchase_order_id = $1
              AND product_id = $2
              AND status = 'Entregue'::order_status
            "#,
        )
        .bind(purchase_order_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    // ---
    // Listagens com escopo de visibilidade
    // ---

    pub async fn list_all(&self) -> Result<Vec<DeliveryOrder>, AppError> {
        let orders = sqlx::query_as::<_, DeliveryOrder>(
            "SELECT * FROM delivery_orders ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Ordens cujo pedido de compra tem destino nas empresas do aprovador.
    pub async fn list_by_destino_cnpjs(
        &self,
        cnpjs: &[String],
    ) -> Result<Vec<DeliveryOrder>, AppError> {
        let orders = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            SELECT o.* FROM delivery_orders o
            JOIN purchase_orders po ON po.id = o.purchase_order_id
            WHERE po.destino_cnpj = ANY($1)
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(cnpjs)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Ordens em que a empresa é fornecedora ou destino (por CNPJ).
    pub async fn list_by_company(
        &self,
        company_id: Uuid,
        cnpj: &str,
    ) -> Result<Vec<DeliveryOrder>, AppError> {
        let orders = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            SELECT o.* FROM delivery_orders o
            JOIN purchase_orders po ON po.id = o.purchase_order_id
            WHERE o.supplier_id = $1 OR po.destino_cnpj = $2
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(cnpj)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Ordens urgentes aguardando aprovação, sem filtro de escopo.
    pub async fn list_urgent_all(&self) -> Result<Vec<DeliveryOrder>, AppError> {
        let orders = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            SELECT * FROM delivery_orders
            WHERE is_urgent AND status = 'Registrado'::order_status
            ORDER BY delivery_date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Ordens urgentes restritas ao escopo do aprovador.
    pub async fn list_urgent_by_destino_cnpjs(
        &self,
        cnpjs: &[String],
    ) -> Result<Vec<DeliveryOrder>, AppError> {
        let orders = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            SELECT o.* FROM delivery_orders o
            JOIN purchase_orders po ON po.id = o.purchase_order_id
            WHERE o.is_urgent
              AND o.status = 'Registrado'::order_status
              AND po.destino_cnpj = ANY($1)
            ORDER BY o.delivery_date ASC
            "#,
        )
        .bind(cnpjs)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    // ---
    // Escrita
    // ---

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        order_id: &str,
        purchase_order_id: Uuid,
        product_id: Uuid,
        supplier_id: Uuid,
        created_by: Uuid,
        quantity: Decimal,
        delivery_date: DateTime<Utc>,
        status: OrderStatus,
        is_urgent: bool,
        work_location: Option<&str>,
    ) -> Result<DeliveryOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            INSERT INTO delivery_orders (
                order_id, purchase_order_id, product_id, supplier_id, created_by,
                quantity, delivery_date, status, is_urgent, work_location
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(purchase_order_id)
        .bind(product_id)
        .bind(supplier_id)
        .bind(created_by)
        .bind(quantity)
        .bind(delivery_date)
        .bind(status)
        .bind(is_urgent)
        .bind(work_location)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE delivery_orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Grava as três chaves de documento e marca a ordem como Carregado.
    pub async fn set_documents<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        nota_pdf: &str,
        nota_xml: &str,
        certificado_pdf: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE delivery_orders
            SET nota_pdf = $1, nota_xml = $2, certificado_pdf = $3,
                status = 'Carregado'::order_status, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(nota_pdf)
        .bind(nota_xml)
        .bind(certificado_pdf)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Quantidade reconciliada a partir do qCom do XML da nota.
    pub async fn update_quantity<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantity: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE delivery_orders SET quantity = $1, updated_at = NOW() WHERE id = $2")
            .bind(quantity)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn confirm_delivery<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantidade_recebida: &str,
        foto_confirmacao: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE delivery_orders
            SET status = 'Entregue'::order_status,
                quantidade_recebida = $1,
                foto_confirmacao = $2,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(quantidade_recebida)
        .bind(foto_confirmacao)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn request_reprogramacao<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        nova_data_entrega: DateTime<Utc>,
        justificativa: &str,
        requested_by: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE delivery_orders
            SET status = 'Suspenso'::order_status,
                nova_data_entrega = $1,
                justificativa_reprogramacao = $2,
                reprogramacao_user_id = $3,
                reprogramacao_solicitada_em = NOW(),
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(nova_data_entrega)
        .bind(justificativa)
        .bind(requested_by)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Aceite do fornecedor: a data proposta vira a data de entrega e os
    /// campos de reprogramação são limpos.
    pub async fn accept_reprogramacao<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        nova_data: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE delivery_orders
            SET status = 'Aprovado'::order_status,
                delivery_date = $1,
                nova_data_entrega = NULL,
                justificativa_reprogramacao = NULL,
                reprogramacao_user_id = NULL,
                reprogramacao_solicitada_em = NULL,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(nova_data)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Rejeição do fornecedor: cancelamento terminal com quantidade zerada,
    /// liberando o saldo do item do pedido de compra.
    pub async fn reject_reprogramacao<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE delivery_orders
            SET status = 'Cancelado'::order_status,
                quantity = 0,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_order<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM delivery_orders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Rastreamento
    // ---

    pub async fn insert_tracking_point<'e, E>(
        &self,
        executor: E,
        delivery_order_id: Uuid,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Result<TrackingPoint, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let point = sqlx::query_as::<_, TrackingPoint>(
            r#"
            INSERT INTO tracking_points (delivery_order_id, latitude, longitude)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(delivery_order_id)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(executor)
        .await?;
        Ok(point)
    }
}
