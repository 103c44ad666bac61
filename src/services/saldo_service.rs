// src/services/saldo_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{OrderRepository, PurchaseOrderRepository},
    models::orders::{QuantidadeEntregue, SaldoProduto},
};

// Casas decimais de todas as quantidades expostas pelo razão de saldo.
pub const CASAS_DECIMAIS: u32 = 3;

/// Quantidade recebida vinda do app: texto livre, vírgula tolerada como
/// separador decimal. Valores ausentes, ilegíveis ou negativos caem no
/// fallback (quantidade originalmente pedida).
pub fn parse_quantidade_recebida(texto: &str) -> Option<Decimal> {
    let normalizado = texto.trim().replace(',', ".");
    Decimal::from_str(&normalizado)
        .ok()
        .filter(|d| !d.is_sign_negative())
}

/// Valor que conta para a quantidade entregue de uma ordem: o recebido,
/// quando legível, senão o pedido.
pub fn quantidade_contabilizada(recebida: Option<&str>, pedida: Decimal) -> Decimal {
    recebida
        .and_then(parse_quantidade_recebida)
        .unwrap_or(pedida)
}

#[derive(Clone)]
pub struct SaldoService {
    purchase_order_repo: PurchaseOrderRepository,
    order_repo: OrderRepository,
    pool: PgPool,
}

impl SaldoService {
    pub fn new(
        purchase_order_repo: PurchaseOrderRepository,
        order_repo: OrderRepository,
        pool: PgPool,
    ) -> Self {
        Self { purchase_order_repo, order_repo, pool }
    }

    /// Saldo do par (pedido de compra, produto): contratado menos o que as
    /// ordens não-canceladas já consumiram. Par sem item cadastrado tem
    /// saldo zero.
    pub async fn saldo(
        &self,
        purchase_order_id: Uuid,
        product_id: Uuid,
    ) -> Result<SaldoProduto, AppError> {
        let product = self
            .purchase_order_repo
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto".into()))?;

        let contratado = match self
            .purchase_order_repo
            .find_item(purchase_order_id, product_id)
            .await?
        {
            Some(item) => item.quantity,
            None => Decimal::ZERO,
        };

        let consumido = self
            .order_repo
            .sum_consumed(&self.pool, purchase_order_id, product_id)
            .await?;

        let disponivel = contratado - consumido;

        Ok(SaldoProduto {
            disponivel: disponivel.round_dp(CASAS_DECIMAIS),
            contratado: contratado.round_dp(CASAS_DECIMAIS),
            consumido: consumido.round_dp(CASAS_DECIMAIS),
            unidade: product.unidade,
        })
    }

    /// Quantidade efetivamente entregue do par: soma sobre as ordens
    /// `Entregue`, preferindo a quantidade recebida quando legível.
    pub async fn entregue(
        &self,
        purchase_order_id: Uuid,
        product_id: Uuid,
    ) -> Result<QuantidadeEntregue, AppError> {
        let product = self
            .purchase_order_repo
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto".into()))?;

        let entregues = self
            .order_repo
            .list_delivered(purchase_order_id, product_id)
            .await?;

        let total = entregues
            .iter()
            .map(|o| quantidade_contabilizada(o.quantidade_recebida.as_deref(), o.quantity))
            .sum::<Decimal>();

        Ok(QuantidadeEntregue {
            entregue: total.round_dp(CASAS_DECIMAIS),
            unidade: product.unidade,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parse_aceita_virgula_brasileira() {
        assert_eq!(parse_quantidade_recebida("12,5"), Some(d("12.5")));
        assert_eq!(parse_quantidade_recebida(" 40 "), Some(d("40")));
    }

    #[test]
    fn parse_rejeita_lixo_e_negativos() {
        assert_eq!(parse_quantidade_recebida("abc"), None);
        assert_eq!(parse_quantidade_recebida(""), None);
        assert_eq!(parse_quantidade_recebida("-3"), None);
    }

    #[test]
    fn fallback_para_quantidade_pedida() {
        assert_eq!(quantidade_contabilizada(Some("30,25"), d("40")), d("30.25"));
        assert_eq!(quantidade_contabilizada(Some("???"), d("40")), d("40"));
        assert_eq!(quantidade_contabilizada(None, d("40")), d("40"));
    }

    #[test]
    fn arredondamento_em_tres_casas() {
        assert_eq!(d("10.00049").round_dp(CASAS_DECIMAIS), d("10.000"));
        assert_eq!(d("59.9996").round_dp(CASAS_DECIMAIS), d("60.000"));
    }
}
