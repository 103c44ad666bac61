// src/services/scope_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CompanyRepository,
    models::{
        auth::CurrentUser,
        company::{Company, CompanyCategory},
    },
};

// Escopo de visibilidade de um usuário sobre ordens e pedidos de compra.
// Precedência estrita (não cumulativa): admin > aprovador > empresa > livre.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderScope {
    // Super-admin, ou usuário cuja categoria não ativa nenhum critério
    Unrestricted,
    // Aprovador: enxerga apenas ordens destinadas às empresas que o
    // designaram (casamento por CNPJ do pedido de compra)
    Approver { destino_cnpjs: Vec<String> },
    // Usuário comum de empresa com critério ativo: fornecedora ou destino
    Company { company_id: Uuid, cnpj: String },
}

/// Deriva o escopo a partir dos dados já carregados. Função pura: a ordem
/// dos ramos É a precedência da regra.
pub fn resolve_scope(
    is_super_admin: bool,
    approver_of: &[Company],
    company: Option<&Company>,
    categoria: Option<&CompanyCategory>,
) -> OrderScope {
    if is_super_admin {
        return OrderScope::Unrestricted;
    }

    if !approver_of.is_empty() {
        return OrderScope::Approver {
            destino_cnpjs: approver_of.iter().map(|c| c.cnpj.clone()).collect(),
        };
    }

    if let (Some(company), Some(categoria)) = (company, categoria) {
        let restringe = categoria.requires_approver
            || categoria.requires_contract
            || categoria.receives_purchase_orders;
        if restringe {
            return OrderScope::Company {
                company_id: company.id,
                cnpj: company.cnpj.clone(),
            };
        }
    }

    // Categoria sem nenhum critério ativo: visibilidade irrestrita
    OrderScope::Unrestricted
}

#[derive(Clone)]
pub struct ScopeService {
    company_repo: CompanyRepository,
}

impl ScopeService {
    pub fn new(company_repo: CompanyRepository) -> Self {
        Self { company_repo }
    }

    pub async fn scope_for(&self, current: &CurrentUser) -> Result<OrderScope, AppError> {
        if current.is_super_admin() {
            return Ok(OrderScope::Unrestricted);
        }

        let approver_of = self
            .company_repo
            .companies_approved_by(current.user.id)
            .await?;
        if !approver_of.is_empty() {
            return Ok(resolve_scope(false, &approver_of, None, None));
        }

        let company = self.company_repo.find_company(current.user.company_id).await?;
        let categoria = match &company {
            Some(c) => self.company_repo.find_category(c.category_id).await?,
            None => None,
        };

        Ok(resolve_scope(false, &[], company.as_ref(), categoria.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn empresa(cnpj: &str, approver: Option<Uuid>) -> Company {
        Company {
            id: Uuid::new_v4(),
            nome: "Empresa Teste".into(),
            cnpj: cnpj.into(),
            category_id: Uuid::new_v4(),
            approver_id: approver,
            contract_number: None,
            created_at: Utc::now(),
        }
    }

    fn categoria(ra: bool, rc: bool, rp: bool) -> CompanyCategory {
        CompanyCategory {
            id: Uuid::new_v4(),
            nome: "Categoria Teste".into(),
            requires_approver: ra,
            requires_contract: rc,
            receives_purchase_orders: rp,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn super_admin_enxerga_tudo() {
        let aprovadas = vec![empresa("111", None)];
        let escopo = resolve_scope(true, &aprovadas, None, None);
        assert_eq!(escopo, OrderScope::Unrestricted);
    }

    #[test]
    fn aprovador_vem_antes_do_escopo_da_propria_empresa() {
        let aprovadas = vec![empresa("111", None), empresa("222", None)];
        let minha = empresa("999", None);
        let cat = categoria(true, true, true);
        let escopo = resolve_scope(false, &aprovadas, Some(&minha), Some(&cat));
        // O aprovador vê as ordens que lhe cabem aprovar, não as da empresa dele
        assert_eq!(
            escopo,
            OrderScope::Approver { destino_cnpjs: vec!["111".into(), "222".into()] }
        );
    }

    #[test]
    fn categoria_com_criterio_ativo_restringe_a_empresa() {
        let minha = empresa("333", None);
        for cat in [categoria(true, false, false), categoria(false, true, false), categoria(false, false, true)] {
            let escopo = resolve_scope(false, &[], Some(&minha), Some(&cat));
            assert_eq!(
                escopo,
                OrderScope::Company { company_id: minha.id, cnpj: "333".into() }
            );
        }
    }

    #[test]
    fn categoria_sem_criterio_nao_restringe() {
        let minha = empresa("444", None);
        let cat = categoria(false, false, false);
        let escopo = resolve_scope(false, &[], Some(&minha), Some(&cat));
        assert_eq!(escopo, OrderScope::Unrestricted);
    }
}
