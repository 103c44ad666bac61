use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// O handler mais externo só vê este enum; o detalhe interno dos erros de
// banco nunca chega ao cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validações manuais (janela de reprogramação, campos cruzados, etc.)
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Ação não autorizada: {0}")]
    AuthorizationError(String),

    // Transição a partir de um estado de origem inválido
    #[error("Conflito de estado: {0}")]
    StateConflict(String),

    // Quantidade pedida excede o saldo disponível do item do pedido de compra
    #[error("Saldo insuficiente (disponível: {disponivel})")]
    InsufficientBalance { disponivel: Decimal },

    #[error("{0} não encontrado(a)")]
    NotFound(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),

            // Evento relevante de segurança: fica no log além da resposta.
            AppError::AuthorizationError(msg) => {
                tracing::warn!("Autorização negada: {}", msg);
                (StatusCode::FORBIDDEN, msg)
            }

            AppError::StateConflict(msg) => (StatusCode::CONFLICT, msg),

            // O chamador precisa do saldo disponível para ajustar o pedido.
            AppError::InsufficientBalance { disponivel } => {
                let body = Json(json!({
                    "error": "Saldo insuficiente para esta ordem.",
                    "saldoDisponivel": disponivel,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::NotFound(entidade) => {
                (StatusCode::NOT_FOUND, format!("{} não encontrado(a).", entidade))
            }

            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe algo genérico.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
