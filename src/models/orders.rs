// src/models/orders.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- 1. Produtos ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub nome: String,
    // Unidade de exibição (t, kg, m³...), devolvida nas consultas de saldo
    pub unidade: String,
    pub created_at: DateTime<Utc>,
}

// --- 2. Pedidos de Compra ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub numero: String,
    // Empresa emissora
    pub company_id: Uuid,
    // Destino identificado por CNPJ; o casamento com companies.cnpj define
    // quem recebe e quem aprova
    pub destino_cnpj: String,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    // Quantidade contratada: teto para a soma das ordens não-canceladas
    pub quantity: Decimal,
}

// --- 3. Status da Ordem de Entrega ---
// Enum fechado: nada de strings soltas espalhadas pelos handlers. A tabela
// de transições em can_transition_to é o único lugar que conhece o grafo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status")]
pub enum OrderStatus {
    #[sqlx(rename = "Registrado")]
    Registrado,
    #[sqlx(rename = "Aprovado")]
    Aprovado,
    #[sqlx(rename = "Carregado")]
    Carregado,
    #[sqlx(rename = "Em Rota")]
    #[serde(rename = "Em Rota")]
    EmRota,
    #[sqlx(rename = "Entregue")]
    Entregue,
    #[sqlx(rename = "Cancelado")]
    Cancelado,
    #[sqlx(rename = "Suspenso")]
    Suspenso,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registrado => "Registrado",
            Self::Aprovado => "Aprovado",
            Self::Carregado => "Carregado",
            Self::EmRota => "Em Rota",
            Self::Entregue => "Entregue",
            Self::Cancelado => "Cancelado",
            Self::Suspenso => "Suspenso",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Entregue | Self::Cancelado)
    }

    // Tabela central de transições legais. Os guards de permissão ficam nos
    // services; aqui mora apenas a legalidade estrutural do grafo.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Registrado, Aprovado)
                | (Registrado, Cancelado)
                | (Registrado, Suspenso)
                | (Aprovado, Carregado)
                | (Aprovado, Suspenso)
                | (Carregado, EmRota)
                | (EmRota, Entregue)
                | (Suspenso, Aprovado)
                | (Suspenso, Cancelado)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- 4. Ordem de Entrega ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOrder {
    pub id: Uuid,
    // Identificador legível: CAP + ddmmyy + hhmmss da criação
    pub order_id: String,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub created_by: Uuid,
    pub quantity: Decimal,
    pub delivery_date: DateTime<Utc>,
    pub status: OrderStatus,
    // Congelado na criação; nunca recalculado depois
    pub is_urgent: bool,

    // Texto livre capturado na confirmação; pode divergir de quantity
    pub quantidade_recebida: Option<String>,

    // Chaves de documento produzidas pelo colaborador de upload
    pub nota_pdf: Option<String>,
    pub nota_xml: Option<String>,
    pub certificado_pdf: Option<String>,
    pub foto_confirmacao: Option<String>,

    // Campos de reprogramação (presentes apenas enquanto Suspenso)
    pub nova_data_entrega: Option<DateTime<Utc>>,
    pub justificativa_reprogramacao: Option<String>,
    pub reprogramacao_user_id: Option<Uuid>,
    pub reprogramacao_solicitada_em: Option<DateTime<Utc>>,

    pub work_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 5. Rastreamento ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingPoint {
    pub id: Uuid,
    pub delivery_order_id: Uuid,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub registrado_em: DateTime<Utc>,
}

// --- 6. Auditoria ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub acao: String,
    pub alvo: String,
    pub detalhe: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- 7. Respostas de saldo ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaldoProduto {
    pub disponivel: Decimal,
    pub contratado: Decimal,
    pub consumido: Decimal,
    pub unidade: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuantidadeEntregue {
    pub entregue: Decimal,
    pub unidade: String,
}

// --- 8. Payloads ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    pub unidade: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItemPayload {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderPayload {
    #[validate(length(min = 1, message = "O número do pedido é obrigatório."))]
    pub numero: String,
    #[validate(length(min = 11, message = "O CNPJ de destino é obrigatório."))]
    pub destino_cnpj: String,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    #[validate(length(min = 1, message = "O pedido precisa de ao menos um item."))]
    pub itens: Vec<PurchaseOrderItemPayload>,
}

impl CreatePurchaseOrderPayload {
    // Regras cruzadas que o derive não cobre.
    pub fn validate_consistency(&self) -> Result<(), crate::common::error::AppError> {
        use crate::common::error::AppError;
        if self.valid_until < self.valid_from {
            return Err(AppError::InvalidInput(
                "A validade final não pode ser anterior à inicial.".into(),
            ));
        }
        if self.itens.iter().any(|i| i.quantity <= Decimal::ZERO) {
            return Err(AppError::InvalidInput(
                "Todos os itens precisam de quantidade positiva.".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub supplier_id: Uuid,
    pub delivery_date: DateTime<Utc>,
    pub work_location: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentsPayload {
    // Chaves de armazenamento dos três documentos obrigatórios
    #[validate(length(min = 1, message = "A nota fiscal (PDF) é obrigatória."))]
    pub nota_pdf: String,
    #[validate(length(min = 1, message = "A nota fiscal (XML) é obrigatória."))]
    pub nota_xml: String,
    #[validate(length(min = 1, message = "O certificado (PDF) é obrigatório."))]
    pub certificado_pdf: String,
    // Conteúdo do XML para reconciliação do qCom (opcional)
    pub xml_conteudo: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDeliveryPayload {
    #[validate(length(min = 1, message = "A quantidade recebida é obrigatória."))]
    pub quantidade_recebida: String,
    #[validate(length(min = 1, message = "A foto de confirmação é obrigatória."))]
    pub foto_confirmacao: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReprogramarPayload {
    pub nova_data_entrega: DateTime<Utc>,
    #[validate(length(min = 1, message = "A justificativa é obrigatória."))]
    pub justificativa: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingPointPayload {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    #[test]
    fn fluxo_principal_e_legal() {
        assert!(Registrado.can_transition_to(Aprovado));
        assert!(Aprovado.can_transition_to(Carregado));
        assert!(Carregado.can_transition_to(EmRota));
        assert!(EmRota.can_transition_to(Entregue));
    }

    #[test]
    fn rejeicao_e_reprogramacao() {
        assert!(Registrado.can_transition_to(Cancelado));
        assert!(Registrado.can_transition_to(Suspenso));
        assert!(Aprovado.can_transition_to(Suspenso));
        assert!(Suspenso.can_transition_to(Aprovado));
        assert!(Suspenso.can_transition_to(Cancelado));
    }

    #[test]
    fn estados_terminais_nao_saem() {
        for origem in [Entregue, Cancelado] {
            for destino in [Registrado, Aprovado, Carregado, EmRota, Entregue, Cancelado, Suspenso] {
                assert!(
                    !origem.can_transition_to(destino),
                    "{} -> {} deveria ser ilegal",
                    origem,
                    destino
                );
            }
            assert!(origem.is_terminal());
        }
    }

    #[test]
    fn saltos_ilegais_sao_barrados() {
        // Documentos não podem ser anexados a uma ordem urgente não aprovada
        assert!(!Registrado.can_transition_to(Carregado));
        // Confirmação exige Em Rota
        assert!(!Carregado.can_transition_to(Entregue));
        assert!(!Aprovado.can_transition_to(Entregue));
        // Carregado/Em Rota não entram em reprogramação
        assert!(!Carregado.can_transition_to(Suspenso));
        assert!(!EmRota.can_transition_to(Suspenso));
        // Nada volta para Registrado
        assert!(!Aprovado.can_transition_to(Registrado));
    }

    #[test]
    fn rotulo_do_status_em_rota_tem_espaco() {
        assert_eq!(EmRota.as_str(), "Em Rota");
        assert_eq!(
            serde_json::to_string(&EmRota).unwrap(),
            "\"Em Rota\"",
        );
    }
}
