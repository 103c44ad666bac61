// src/services/order_service.rs

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

use crate::{
    common::{documents::DocumentStore, error::AppError},
    db::{AuditRepository, CompanyRepository, OrderRepository, PurchaseOrderRepository},
    models::{
        auth::{Capability, CurrentUser},
        orders::{
            ConfirmDeliveryPayload, CreateOrderPayload, DeliveryOrder, OrderStatus,
            TrackingPoint, TrackingPointPayload, UploadDocumentsPayload,
        },
    },
    services::scope_service::OrderScope,
};

// Ordens com entrega dentro desta janela exigem aprovação explícita.
pub const JANELA_URGENCIA_DIAS: i64 = 7;

/// Classifica a urgência de uma ordem no momento da criação.
/// `dias = ceil(data_entrega - agora)`; dentro da janela => urgente, nasce
/// `Registrado` aguardando aprovação; fora => auto-aprovada (`Aprovado`).
/// O resultado é congelado na ordem e nunca recalculado depois.
pub fn classificar_urgencia(
    delivery_date: DateTime<Utc>,
    agora: DateTime<Utc>,
) -> (bool, OrderStatus) {
    let segundos = (delivery_date - agora).num_seconds();
    // Equivalente a `segundos.div_ceil(86_400)`; `i64::div_ceil` ainda é
    // instável neste toolchain, então expandimos a divisão-teto (divisor > 0).
    let dias = {
        let q = segundos / 86_400;
        if segundos % 86_400 > 0 { q + 1 } else { q }
    };
    let urgente = dias <= JANELA_URGENCIA_DIAS;
    let status_inicial = if urgente {
        OrderStatus::Registrado
    } else {
        OrderStatus::Aprovado
    };
    (urgente, status_inicial)
}

/// Identificador legível da ordem: CAP + ddmmyy + hhmmss da criação.
pub fn gerar_order_id(agora: DateTime<Utc>) -> String {
    format!("CAP{}", agora.format("%d%m%y%H%M%S"))
}

static QCOM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<qCom>\s*([0-9.,]+)\s*</qCom>").expect("regex qCom inválida"));

/// Extrai a quantidade comercial (campo qCom da NF-e) do XML da nota.
/// A primeira ocorrência vale; vírgula é tolerada como separador decimal.
pub fn extrair_quantidade_comercial(xml: &str) -> Option<Decimal> {
    let captura = QCOM_RE.captures(xml)?;
    let bruto = captura.get(1)?.as_str().replace(',', ".");
    Decimal::from_str(&bruto).ok()
}

fn ensure_transition(atual: OrderStatus, destino: OrderStatus) -> Result<(), AppError> {
    if atual.can_transition_to(destino) {
        return Ok(());
    }
    Err(AppError::StateConflict(format!(
        "Transição de '{}' para '{}' não é permitida.",
        atual, destino
    )))
}

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    purchase_order_repo: PurchaseOrderRepository,
    company_repo: CompanyRepository,
    audit_repo: AuditRepository,
    document_store: Arc<dyn DocumentStore>,
    pool: PgPool,
}

impl OrderService {
    pub fn new(
        order_repo: OrderRepository,
        purchase_order_repo: PurchaseOrderRepository,
        company_repo: CompanyRepository,
        audit_repo: AuditRepository,
        document_store: Arc<dyn DocumentStore>,
        pool: PgPool,
    ) -> Self {
        Self {
            order_repo,
            purchase_order_repo,
            company_repo,
            audit_repo,
            document_store,
            pool,
        }
    }

    // ---
    // Criação (com controle de admissão de saldo)
    // ---

    /// Cria uma ordem de entrega contra um pedido de compra.
    /// O lock de linha no item + a soma do consumo DENTRO da transação
    /// serializam criações concorrentes contra o mesmo par: no máximo uma
    /// das requisições simultâneas consome o saldo restante.
    pub async fn create_order(
        &self,
        current: &CurrentUser,
        payload: &CreateOrderPayload,
    ) -> Result<DeliveryOrder, AppError> {
        current.exigir(Capability::OrdersWrite)?;

        if payload.quantity <= Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "A quantidade deve ser maior que zero.".into(),
            ));
        }

        let po = self
            .purchase_order_repo
            .find_by_id(payload.purchase_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Pedido de compra".into()))?;
        if po.status != "Ativo" {
            return Err(AppError::InvalidInput(
                "O pedido de compra não está ativo.".into(),
            ));
        }

        self.company_repo
            .find_company(payload.supplier_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Empresa fornecedora".into()))?;

        let mut tx = self.pool.begin().await?;

        // Lock da linha do item: criações concorrentes do mesmo par esperam aqui
        let item = self
            .purchase_order_repo
            .find_item_for_update(&mut *tx, payload.purchase_order_id, payload.product_id)
            .await?;

        let contratado = match &item {
            Some(item) => item.quantity,
            // Par sem item contratado: saldo zero
            None => {
                return Err(AppError::InsufficientBalance { disponivel: Decimal::ZERO });
            }
        };

        let consumido = self
            .order_repo
            .sum_consumed(&mut *tx, payload.purchase_order_id, payload.product_id)
            .await?;
        let disponivel = (contratado - consumido).round_dp(3);

        if payload.quantity > disponivel {
            return Err(AppError::InsufficientBalance { disponivel });
        }

        let agora = Utc::now();
        let (is_urgent, status_inicial) = classificar_urgencia(payload.delivery_date, agora);
        let order_id = gerar_order_id(agora);

        let order = self
            .order_repo
            .insert_order(
                &mut *tx,
                &order_id,
                payload.purchase_order_id,
                payload.product_id,
                payload.supplier_id,
                current.user.id,
                payload.quantity,
                payload.delivery_date,
                status_inicial,
                is_urgent,
                payload.work_location.as_deref(),
            )
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                Some(current.user.id),
                "ordem_criada",
                &order.order_id,
                Some(&format!(
                    "quantidade {} | urgente: {} | status inicial: {}",
                    order.quantity, is_urgent, status_inicial
                )),
            )
            .await?;

        tx.commit().await?;

        tracing::info!("📦 Ordem {} criada ({})", order.order_id, status_inicial);
        Ok(order)
    }

    // ---
    // Aprovação / rejeição de ordens urgentes
    // ---

    pub async fn approve_order(
        &self,
        current: &CurrentUser,
        id: Uuid,
    ) -> Result<DeliveryOrder, AppError> {
        self.decidir_registro(current, id, OrderStatus::Aprovado, "ordem_aprovada")
            .await
    }

    pub async fn reject_order(
        &self,
        current: &CurrentUser,
        id: Uuid,
    ) -> Result<DeliveryOrder, AppError> {
        self.decidir_registro(current, id, OrderStatus::Cancelado, "ordem_rejeitada")
            .await
    }

    async fn decidir_registro(
        &self,
        current: &CurrentUser,
        id: Uuid,
        destino: OrderStatus,
        acao: &str,
    ) -> Result<DeliveryOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))?;

        // Suspenso -> Aprovado/Cancelado pertence à reprogramação (fornecedor),
        // nunca a este fluxo de decisão do aprovador.
        if order.status != OrderStatus::Registrado {
            return Err(AppError::StateConflict(format!(
                "Apenas ordens 'Registrado' podem ser decididas (atual: '{}').",
                order.status
            )));
        }
        ensure_transition(order.status, destino)?;
        self.exigir_aprovador(current, &order).await?;

        self.order_repo.update_status(&mut *tx, id, destino).await?;
        self.audit_repo
            .record(&mut *tx, Some(current.user.id), acao, &order.order_id, None)
            .await?;

        tx.commit().await?;

        self.order_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))
    }

    /// Só o aprovador designado da empresa destino (ou o super-admin) decide
    /// uma ordem urgente.
    async fn exigir_aprovador(
        &self,
        current: &CurrentUser,
        order: &DeliveryOrder,
    ) -> Result<(), AppError> {
        if current.is_super_admin() {
            return Ok(());
        }

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

        if destino.approver_id == Some(current.user.id) {
            return Ok(());
        }
        Err(AppError::AuthorizationError(
            "Apenas o aprovador da empresa destino pode decidir esta ordem.".into(),
        ))
    }

    // ---
    // Documentos (Aprovado -> Carregado) com reconciliação do XML
    // ---

    pub async fn upload_documents(
        &self,
        current: &CurrentUser,
        id: Uuid,
        payload: &UploadDocumentsPayload,
    ) -> Result<DeliveryOrder, AppError> {
        current.exigir(Capability::OrdersWrite)?;

        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))?;

        // Ordem urgente ainda não aprovada não recebe documentos
        if order.status == OrderStatus::Registrado {
            return Err(AppError::StateConflict(
                "A ordem aguarda aprovação; documentos só podem ser anexados após a aprovação."
                    .into(),
            ));
        }
        ensure_transition(order.status, OrderStatus::Carregado)?;

        // O XML da nota é a fonte autoritativa da quantidade a partir daqui:
        // se o qCom divergir do pedido, a ordem é ajustada e o ajuste fica
        // registrado. Reenvio do mesmo valor não gera novo registro.
        if let Some(xml) = payload.xml_conteudo.as_deref() {
            if let Some(qcom) = extrair_quantidade_comercial(xml) {
                if qcom != order.quantity {
                    self.order_repo.update_quantity(&mut *tx, id, qcom).await?;
                    self.audit_repo
                        .record(
                            &mut *tx,
                            Some(current.user.id),
                            "quantidade_reconciliada",
                            &order.order_id,
                            Some(&format!("de {} para {} (qCom da NF-e)", order.quantity, qcom)),
                        )
                        .await?;
                    tracing::info!(
                        "Ordem {}: quantidade ajustada de {} para {} pelo XML da nota",
                        order.order_id,
                        order.quantity,
                        qcom
                    );
                }
            }
        }

        self.order_repo
            .set_documents(
                &mut *tx,
                id,
                &payload.nota_pdf,
                &payload.nota_xml,
                &payload.certificado_pdf,
            )
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(current.user.id),
                "documentos_anexados",
                &order.order_id,
                None,
            )
            .await?;

        tx.commit().await?;

        self.order_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))
    }

    // ---
    // Rastreamento (Carregado -> Em Rota no primeiro ponto)
    // ---

    pub async fn registrar_rastreamento(
        &self,
        current: &CurrentUser,
        id: Uuid,
        payload: &TrackingPointPayload,
    ) -> Result<TrackingPoint, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))?;

        if !matches!(order.status, OrderStatus::Carregado | OrderStatus::EmRota) {
            return Err(AppError::StateConflict(
                "Rastreamento só é aceito para ordens carregadas ou em rota.".into(),
            ));
        }

        let point = self
            .order_repo
            .insert_tracking_point(&mut *tx, id, payload.latitude, payload.longitude)
            .await?;

        if order.status == OrderStatus::Carregado {
            self.order_repo
                .update_status(&mut *tx, id, OrderStatus::EmRota)
                .await?;
            self.audit_repo
                .record(
                    &mut *tx,
                    Some(current.user.id),
                    "ordem_em_rota",
                    &order.order_id,
                    Some("primeiro ponto de rastreamento recebido"),
                )
                .await?;
        }

        tx.commit().await?;
        Ok(point)
    }

    // ---
    // Confirmação de entrega (Em Rota -> Entregue)
    // ---

    pub async fn confirm_delivery(
        &self,
        current: &CurrentUser,
        id: Uuid,
        payload: &ConfirmDeliveryPayload,
    ) -> Result<DeliveryOrder, AppError> {
        current.exigir(Capability::OrdersWrite)?;

        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))?;

        ensure_transition(order.status, OrderStatus::Entregue)?;

        self.order_repo
            .confirm_delivery(
                &mut *tx,
                id,
                &payload.quantidade_recebida,
                &payload.foto_confirmacao,
            )
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(current.user.id),
                "entrega_confirmada",
                &order.order_id,
                Some(&format!("quantidade recebida: {}", payload.quantidade_recebida)),
            )
            .await?;

        tx.commit().await?;

        self.order_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))
    }

    // ---
    // Exclusão definitiva (somente super-admin)
    // ---

    pub async fn delete_order(&self, current: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        if !current.is_super_admin() {
            return Err(AppError::AuthorizationError(
                "Apenas o super-admin pode excluir ordens definitivamente.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem".into()))?;

        // Remove os artefatos de documento antes da linha
        for chave in [
            order.nota_pdf.as_deref(),
            order.nota_xml.as_deref(),
            order.certificado_pdf.as_deref(),
            order.foto_confirmacao.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            self.document_store.remove(chave).await?;
        }

        self.order_repo.delete_order(&mut *tx, id).await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(current.user.id),
                "ordem_excluida",
                &order.order_id,
                None,
            )
            .await?;

        tx.commit().await?;
        tracing::info!("🗑️ Ordem {} excluída pelo super-admin", order.order_id);
        Ok(())
    }

    // ---
    // Listagens
    // ---

    pub async fn list(&self, escopo: &OrderScope) -> Result<Vec<DeliveryOrder>, AppError> {
        match escopo {
            OrderScope::Unrestricted => self.order_repo.list_all().await,
            OrderScope::Approver { destino_cnpjs } => {
                self.order_repo.list_by_destino_cnpjs(destino_cnpjs).await
            }
            OrderScope::Company { company_id, cnpj } => {
                self.order_repo.list_by_company(*company_id, cnpj).await
            }
        }
    }

    /// Ordens urgentes aguardando aprovação. Só aprovadores (no próprio
    /// escopo) e o super-admin recebem algo; os demais, lista vazia.
    pub async fn list_urgent(
        &self,
        current: &CurrentUser,
        escopo: &OrderScope,
    ) -> Result<Vec<DeliveryOrder>, AppError> {
        if current.is_super_admin() {
            return self.order_repo.list_urgent_all().await;
        }
        match escopo {
            OrderScope::Approver { destino_cnpjs } => {
                self.order_repo.list_urgent_by_destino_cnpjs(destino_cnpjs).await
            }
            _ => Ok(Vec::new()),
        }
    }

    pub async fn find_order(&self, id: Uuid) -> Result<DeliveryOrder, AppError> {
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
    fn entrega_em_tres_dias_e_urgente() {
        let entrega = agora() + chrono::Duration::days(3);
        let (urgente, status) = classificar_urgencia(entrega, agora());
        assert!(urgente);
        assert_eq!(status, OrderStatus::Registrado);
    }

    #[test]
    fn entrega_em_trinta_dias_e_auto_aprovada() {
        let entrega = agora() + chrono::Duration::days(30);
        let (urgente, status) = classificar_urgencia(entrega, agora());
        assert!(!urgente);
        assert_eq!(status, OrderStatus::Aprovado);
    }

    #[test]
    fn fronteira_de_sete_dias() {
        // Exatamente 7 dias: ceil = 7, ainda urgente
        let (urgente, _) = classificar_urgencia(agora() + chrono::Duration::days(7), agora());
        assert!(urgente);
        // 7 dias e 1 hora: ceil = 8, não urgente
        let (urgente, _) = classificar_urgencia(
            agora() + chrono::Duration::days(7) + chrono::Duration::hours(1),
            agora(),
        );
        assert!(!urgente);
    }

    #[test]
    fn data_no_passado_e_urgente() {
        let (urgente, status) = classificar_urgencia(agora() - chrono::Duration::days(2), agora());
        assert!(urgente);
        assert_eq!(status, OrderStatus::Registrado);
    }

    #[test]
    fn classificacao_e_deterministica() {
        let entrega = agora() + chrono::Duration::days(5);
        assert_eq!(
            classificar_urgencia(entrega, agora()),
            classificar_urgencia(entrega, agora())
        );
    }

    #[test]
    fn order_id_tem_prefixo_e_data() {
        let id = gerar_order_id(agora());
        assert_eq!(id, "CAP150725120000");
        assert!(id.starts_with("CAP"));
        assert_eq!(id.len(), 15);
    }

    #[test]
    fn extrai_qcom_do_xml() {
        let xml = "<det><prod><qCom>40.000</qCom></prod></det>";
        assert_eq!(
            extrair_quantidade_comercial(xml),
            Some(Decimal::from_str("40.000").unwrap())
        );
    }

    #[test]
    fn primeira_ocorrencia_do_qcom_vale() {
        let xml = "<qCom>12,5</qCom><qCom>99</qCom>";
        assert_eq!(
            extrair_quantidade_comercial(xml),
            Some(Decimal::from_str("12.5").unwrap())
        );
    }

    #[test]
    fn xml_sem_qcom_nao_reconcilia() {
        assert_eq!(extrair_quantidade_comercial("<nfe></nfe>"), None);
        assert_eq!(extrair_quantidade_comercial("<qCom>abc</qCom>"), None);
    }
}
