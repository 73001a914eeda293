use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Nosso tipo de erro de domínio. Os handlers convertem para `ApiError`
// (já traduzido) antes de responder.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta desativada")]
    AccountDisabled,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // O parâmetro é o tipo do recurso ("product", "order", ...)
    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Referência já existe: {0}")]
    ReferenceAlreadyExists(String),

    #[error("Nome já existe: {0}")]
    NameAlreadyExists(String),

    #[error("Avaliação já existe")]
    ReviewAlreadyExists,

    #[error("Estoque insuficiente para {product} (disponível: {available})")]
    InsufficientStock { product: String, available: i32 },

    #[error("Quantidade inválida")]
    InvalidQuantity,

    #[error("Carrinho vazio")]
    EmptyCart,

    #[error("Categoria ou subcategoria inválida: {0}")]
    InvalidCategory(String),

    #[error("Tag desconhecida: {0}")]
    UnknownTag(String),

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Pedido não pode ser cancelado")]
    OrderNotCancellable,

    #[error("Pagamento não concluído")]
    PaymentNotCompleted,

    #[error("Pagamento não confere com o pedido")]
    PaymentMismatch,

    #[error("Pagamento já utilizado")]
    PaymentAlreadyUsed,

    #[error("Erro no provedor de pagamento: {0}")]
    PaymentProviderError(String),

    #[error("Erro no envio de imagem: {0}")]
    ImageUploadError(String),

    #[error("Arquivo inválido: {0}")]
    InvalidUpload(String),

    #[error("Erro no provedor OAuth: {0}")]
    OAuthError(String),

    #[error("Operação não permitida sobre a própria conta")]
    SelfModification,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// ---
// Erro "de saída": o que o cliente realmente recebe
// ---
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "message": self.message, "details": details }),
            None => json!({ "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidQuantity
            | AppError::EmptyCart
            | AppError::InvalidCategory(_)
            | AppError::UnknownTag(_)
            | AppError::PaymentMismatch
            | AppError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::OAuthError(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::PaymentNotCompleted => StatusCode::PAYMENT_REQUIRED,
            AppError::AccountDisabled | AppError::Forbidden | AppError::SelfModification => {
                StatusCode::FORBIDDEN
            }
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::ReferenceAlreadyExists(_)
            | AppError::NameAlreadyExists(_)
            | AppError::ReviewAlreadyExists
            | AppError::InsufficientStock { .. }
            | AppError::InvalidStatusTransition { .. }
            | AppError::OrderNotCancellable
            | AppError::PaymentAlreadyUsed => StatusCode::CONFLICT,
            AppError::PaymentProviderError(_) | AppError::ImageUploadError(_) => StatusCode::BAD_GATEWAY,
            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Chave de tradução + parâmetros para interpolação
    fn message_key(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => ("error.validation", vec![]),
            AppError::EmailAlreadyExists => ("error.email_exists", vec![]),
            AppError::InvalidCredentials => ("error.invalid_credentials", vec![]),
            AppError::InvalidToken => ("error.invalid_token", vec![]),
            AppError::AccountDisabled => ("error.account_disabled", vec![]),
            AppError::Forbidden => ("error.forbidden", vec![]),
            AppError::UserNotFound => ("error.user_not_found", vec![]),
            AppError::ResourceNotFound(kind) => ("error.not_found", vec![("resource", kind.clone())]),
            AppError::ReferenceAlreadyExists(r) => ("error.reference_exists", vec![("reference", r.clone())]),
            AppError::NameAlreadyExists(n) => ("error.name_exists", vec![("name", n.clone())]),
            AppError::ReviewAlreadyExists => ("error.review_exists", vec![]),
            AppError::InsufficientStock { product, available } => (
                "error.insufficient_stock",
                vec![("product", product.clone()), ("available", available.to_string())],
            ),
            AppError::InvalidQuantity => ("error.invalid_quantity", vec![]),
            AppError::EmptyCart => ("error.empty_cart", vec![]),
            AppError::InvalidCategory(c) => ("error.invalid_category", vec![("category", c.clone())]),
            AppError::UnknownTag(t) => ("error.unknown_tag", vec![("tag", t.clone())]),
            AppError::InvalidStatusTransition { from, to } => (
                "error.invalid_transition",
                vec![("from", from.clone()), ("to", to.clone())],
            ),
            AppError::OrderNotCancellable => ("error.order_not_cancellable", vec![]),
            AppError::PaymentNotCompleted => ("error.payment_not_completed", vec![]),
            AppError::PaymentMismatch => ("error.payment_mismatch", vec![]),
            AppError::PaymentAlreadyUsed => ("error.payment_used", vec![]),
            AppError::PaymentProviderError(_) => ("error.payment_provider", vec![]),
            AppError::ImageUploadError(_) => ("error.image_upload", vec![]),
            AppError::InvalidUpload(reason) => ("error.invalid_upload", vec![("reason", reason.clone())]),
            AppError::OAuthError(_) => ("error.oauth", vec![]),
            AppError::SelfModification => ("error.self_modification", vec![]),
            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ("error.internal", vec![]),
        }
    }

    /// Converte para a resposta HTTP no idioma pedido pelo cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        } else {
            tracing::debug!("Requisição rejeitada ({}): {}", status, self);
        }

        let (key, params) = self.message_key();
        let message = store.translate(&locale.0, key, &params);

        // Detalhes por campo para erros de validação
        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            store.translate(&locale.0, &format!("validation.{code}"), &[])
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError { status, message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "invalid_email"))]
        email: String,
    }

    fn en() -> Locale {
        Locale("en".into())
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AccountDisabled.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::ResourceNotFound("product".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InsufficientStock { product: "x".into(), available: 0 }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::PaymentNotCompleted.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(AppError::PaymentProviderError("down".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let store = I18nStore::load();
        let api = AppError::InternalServerError(anyhow::anyhow!("senha do banco: hunter2"))
            .to_api_error(&en(), &store);
        assert!(!api.message.contains("hunter2"));
    }

    #[test]
    fn stock_message_is_interpolated() {
        let store = I18nStore::load();
        let api = AppError::InsufficientStock { product: "Caneca".into(), available: 2 }
            .to_api_error(&en(), &store);
        assert!(api.message.contains("Caneca"));
        assert!(api.message.contains('2'));
    }

    #[tokio::test]
    async fn validation_errors_carry_field_details() {
        let store = I18nStore::load();
        let errors = Probe { email: "nope".into() }.validate().unwrap_err();
        let response = AppError::ValidationError(errors).to_api_error(&en(), &store).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].is_string());
        assert!(body["details"]["email"][0].is_string());
    }
}
