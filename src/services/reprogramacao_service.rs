// src/services/reprogramacao_service.rs

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AuditRepository, CompanyRepository, OrderRepository, PurchaseOrderRepository},
    models::{
        auth::CurrentUser,
        orders::{DeliveryOrder, OrderStatus, ReprogramarPayload},
    },
};

// Limites da negociação de reprogramação
pub const MAX_JUSTIFICATIVA: usize = 100;
pub const JANELA_REPROGRAMACAO_DIAS: i64 = 7;

/// Valida a solicitação de reprogramação: justificativa não vazia com até
/// 100 caracteres; nova data estritamente no futuro e a no máximo 7 dias
/// da solicitação.
pub fn validar_solicitacao(
    justificativa: &str,
    nova_data: DateTime<Utc>,
    agora: DateTime<Utc>,
) -> Result<(), AppError> {
    let justificativa = justificativa.trim();
    if justificativa.is_empty() {
        return Err(AppError::InvalidInput("A justificativa é obrigatória.".into()));
    }
    if justificativa.chars().count() > MAX_JUSTIFICATIVA {
        return Err(AppError::InvalidInput(format!(
            "A justificativa deve ter no máximo {} caracteres.",
            MAX_JUSTIFICATIVA
        )));
    }
    if nova_data <= agora {
        return Err(AppError::InvalidInput(
            "A nova data de entrega deve estar no futuro.".into(),
        ));
    }
    if nova_data > agora + Duration::days(JANELA_REPROGRAMACAO_DIAS) {
        return Err(AppError::InvalidInput(format!(
            "A nova data de entrega deve estar a no máximo {} dias da solicitação.",
            JANELA_REPROGRAMACAO_DIAS
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ReprogramacaoService {
    order_repo: OrderRepository,
    purchase_order_repo: PurchaseOrderRepository,
    company_repo: CompanyRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl ReprogramacaoService {
    pub fn new(
        order_repo: OrderRepository,
        purchase_order_repo: PurchaseOrderRepository,
        company_repo: CompanyRepository,
        audit_repo: AuditRepository,
        pool: PgPool,
    ) -> Self {
        Self { order_repo, purchase_order_repo, company_repo, audit_repo, pool }
    }

    /// Solicitação: exclusividade da empresa destino do pedido de compra.
    /// (Nem o super-admin solicita em nome de terceiros.)
    pub async fn solicitar(
        &self,
        current: &CurrentUser,
        id: Uuid,
        payload: &ReprogramarPayload,
    ) -> Result<DeliveryOrder, AppError> {
        let agora = Utc::now();
        validar_solicitacao(&payload.justificativa, payload.nova_data_entrega, agora)?;

        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))?;

        if !order.status.can_transition_to(OrderStatus::Suspenso) {
            return Err(AppError::StateConflict(format!(
                "Uma ordem '{}' não pode entrar em reprogramação.",
                order.status
            )));
        }

        self.exigir_empresa_destino(current, &order).await?;

        self.order_repo
            .request_reprogramacao(
                &mut *tx,
                id,
                payload.nova_data_entrega,
                payload.justificativa.trim(),
                current.user.id,
            )
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(current.user.id),
                "reprogramacao_solicitada",
                &order.order_id,
                Some(&format!(
                    "nova data {} | justificativa: {}",
                    payload.nova_data_entrega.format("%d/%m/%Y %H:%M"),
                    payload.justificativa.trim()
                )),
            )
            .await?;

        tx.commit().await?;
        self.reler(id).await
    }

    /// Aceite do fornecedor: a ordem volta a Aprovado com a data proposta.
    pub async fn aprovar(&self, current: &CurrentUser, id: Uuid) -> Result<DeliveryOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))?;

        if order.status != OrderStatus::Suspenso {
            return Err(AppError::StateConflict(
                "A ordem não possui reprogramação pendente.".into(),
            ));
        }
        self.exigir_fornecedor(current, &order)?;

        let nova_data = order.nova_data_entrega.ok_or_else(|| {
            AppError::StateConflict("A ordem não possui data de reprogramação registrada.".into())
        })?;

        self.order_repo.accept_reprogramacao(&mut *tx, id, nova_data).await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(current.user.id),
                "reprogramacao_aceita",
                &order.order_id,
                Some(&format!("entrega movida para {}", nova_data.format("%d/%m/%Y %H:%M"))),
            )
            .await?;

        tx.commit().await?;
        self.reler(id).await
    }

    /// Rejeição do fornecedor: cancelamento terminal com quantidade zerada.
    pub async fn rejeitar(&self, current: &CurrentUser, id: Uuid) -> Result<DeliveryOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))?;

        if order.status != OrderStatus::Suspenso {
            return Err(AppError::StateConflict(
                "A ordem não possui reprogramação pendente.".into(),
            ));
        }
        self.exigir_fornecedor(current, &order)?;

        self.order_repo.reject_reprogramacao(&mut *tx, id).await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(current.user.id),
                "reprogramacao_rejeitada",
                &order.order_id,
                Some("ordem cancelada e quantidade zerada"),
            )
            .await?;

        tx.commit().await?;
        self.reler(id).await
    }

    async fn exigir_empresa_destino(
        &self,
        current: &CurrentUser,
        order: &DeliveryOrder,
    ) -> Result<(), AppError> {
        let po = self
            .purchase_order_repo
            .find_by_id(order.purchase_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Pedido de compra".into()))?;
        let destino = self
            .company_repo
            .find_by_cnpj(&po.destino_cnpj)
            .await?
            .ok_or_else(|| AppError::NotFound("Empresa destino".into()))?;

        if current.user.company_id != destino.id {
            return Err(AppError::AuthorizationError(
                "Apenas a empresa destino pode solicitar reprogramação.".into(),
            ));
        }
        Ok(())
    }

    fn exigir_fornecedor(
        &self,
        current: &CurrentUser,
        order: &DeliveryOrder,
    ) -> Result<(), AppError> {
        if current.is_super_admin() || current.user.company_id == order.supplier_id {
            return Ok(());
        }
        Err(AppError::AuthorizationError(
            "Apenas o fornecedor pode decidir a reprogramação.".into(),
        ))
    }

    async fn reler(&self, id: Uuid) -> Result<DeliveryOrder, AppError> {
        self.order_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn agora() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn solicitacao_valida_passa() {
        let nova = agora() + Duration::days(3);
        assert!(validar_solicitacao("greve na rodovia", nova, agora()).is_ok());
    }

    #[test]
    fn justificativa_com_101_caracteres_e_rejeitada() {
        let justificativa = "x".repeat(101);
        let nova = agora() + Duration::days(3);
        let erro = validar_solicitacao(&justificativa, nova, agora());
        assert!(matches!(erro, Err(AppError::InvalidInput(_))));
        // 100 exatos ainda passam
        assert!(validar_solicitacao(&"x".repeat(100), nova, agora()).is_ok());
    }

    #[test]
    fn justificativa_vazia_e_rejeitada() {
        let nova = agora() + Duration::days(3);
        assert!(validar_solicitacao("   ", nova, agora()).is_err());
    }

    #[test]
    fn data_alem_de_sete_dias_e_rejeitada() {
        let nova = agora() + Duration::days(8);
        assert!(validar_solicitacao("ok", nova, agora()).is_err());
        // Exatamente 7 dias ainda passa
        let limite = agora() + Duration::days(7);
        assert!(validar_solicitacao("ok", limite, agora()).is_ok());
    }

    #[test]
    fn data_no_passado_ou_agora_e_rejeitada() {
        assert!(validar_solicitacao("ok", agora(), agora()).is_err());
        assert!(validar_solicitacao("ok", agora() - Duration::hours(1), agora()).is_err());
    }
}
