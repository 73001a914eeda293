// src/services/payment_service.rs

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// Visão mínima de um PaymentIntent do processador
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    /// Comprador gravado em `metadata[user_id]` na criação da intenção.
    pub fn owner(&self) -> Option<Uuid> {
        self.metadata.get("user_id").and_then(|id| id.parse().ok())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    #[schema(example = 2499)]
    pub amount: i64,
    #[schema(example = "eur")]
    pub currency: String,
}

/// Processador de pagamentos: o servidor cria a intenção, o cliente confirma
/// com o formulário hospedado e o servidor consulta o resultado.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, amount: i64, currency: &str, user_id: Uuid) -> Result<PaymentIntent, AppError>;
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, AppError>;
}

/// Valor em centavos (unidade mínima da moeda).
pub fn to_minor_units(amount: Decimal) -> Result<i64, AppError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::InternalServerError(anyhow::anyhow!("valor fora do intervalo: {amount}")))
}

/// Confere se a intenção é do comprador e paga exatamente o pedido.
pub fn verify_intent(
    intent: &PaymentIntent,
    user_id: Uuid,
    expected_amount: i64,
    currency: &str,
) -> Result<(), AppError> {
    if intent.owner() != Some(user_id) {
        return Err(AppError::PaymentMismatch);
    }
    if intent.status != "succeeded" {
        return Err(AppError::PaymentNotCompleted);
    }
    if intent.amount != expected_amount || !intent.currency.eq_ignore_ascii_case(currency) {
        return Err(AppError::PaymentMismatch);
    }
    Ok(())
}

// ---
// Implementação HTTP compatível com a API da Stripe
// ---

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    api_base: String,
    secret_key: Option<String>,
}

impl StripeGateway {
    pub fn new(http: reqwest::Client, api_base: &str, secret_key: Option<String>) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    fn secret(&self) -> Result<&str, AppError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| AppError::PaymentProviderError("STRIPE_SECRET_KEY não configurada".into()))
    }

    async fn parse(response: reqwest::Response) -> Result<PaymentIntent, AppError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<PaymentIntent>()
                .await
                .map_err(|e| AppError::PaymentProviderError(e.to_string()));
        }

        // Intenção inexistente é erro do cliente, não do processador
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::PaymentMismatch);
        }

        let message = response
            .json::<StripeErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| status.to_string());
        Err(AppError::PaymentProviderError(message))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, amount: i64, currency: &str, user_id: Uuid) -> Result<PaymentIntent, AppError> {
        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(self.secret()?)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::PaymentProviderError(e.to_string()))?;

        let intent = Self::parse(response).await?;
        tracing::info!("💳 PaymentIntent criado: {} ({} {})", intent.id, intent.amount, intent.currency);
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, AppError> {
        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{}", self.api_base, intent_id))
            .bearer_auth(self.secret()?)
            .send()
            .await
            .map_err(|e| AppError::PaymentProviderError(e.to_string()))?;

        Self::parse(response).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn buyer() -> Uuid {
        Uuid::from_u128(42)
    }

    pub(crate) fn intent(status: &str, amount: i64, currency: &str) -> PaymentIntent {
        PaymentIntent {
            id: "pi_123".into(),
            status: status.into(),
            amount,
            currency: currency.into(),
            client_secret: Some("pi_123_secret".into()),
            metadata: [("user_id".to_string(), buyer().to_string())].into(),
        }
    }

    #[test]
    fn minor_units_round_half_away_from_zero() {
        assert_eq!(to_minor_units("24.99".parse().unwrap()).unwrap(), 2499);
        assert_eq!(to_minor_units("10".parse().unwrap()).unwrap(), 1000);
        assert_eq!(to_minor_units("0.005".parse().unwrap()).unwrap(), 1);
    }

    #[test]
    fn succeeded_intent_with_matching_amount_passes() {
        assert!(verify_intent(&intent("succeeded", 2499, "EUR"), buyer(), 2499, "eur").is_ok());
    }

    #[test]
    fn unfinished_intent_requires_payment() {
        let err = verify_intent(&intent("requires_payment_method", 2499, "eur"), buyer(), 2499, "eur").unwrap_err();
        assert!(matches!(err, AppError::PaymentNotCompleted));
    }

    #[test]
    fn amount_or_currency_mismatch_is_rejected() {
        assert!(matches!(
            verify_intent(&intent("succeeded", 2000, "eur"), buyer(), 2499, "eur"),
            Err(AppError::PaymentMismatch)
        ));
        assert!(matches!(
            verify_intent(&intent("succeeded", 2499, "usd"), buyer(), 2499, "eur"),
            Err(AppError::PaymentMismatch)
        ));
    }

    #[test]
    fn intent_of_another_buyer_is_rejected() {
        let paid = intent("succeeded", 2499, "eur");
        assert!(matches!(
            verify_intent(&paid, Uuid::from_u128(7), 2499, "eur"),
            Err(AppError::PaymentMismatch)
        ));

        let mut anonymous = paid.clone();
        anonymous.metadata.clear();
        assert!(matches!(
            verify_intent(&anonymous, buyer(), 2499, "eur"),
            Err(AppError::PaymentMismatch)
        ));
    }

    #[test]
    fn intent_metadata_is_parsed_from_provider_json() {
        let raw = r#"{"id":"pi_9","status":"succeeded","amount":100,"currency":"eur","client_secret":null,"metadata":{"user_id":"00000000-0000-0000-0000-00000000002a"}}"#;
        let parsed: PaymentIntent = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.owner(), Some(buyer()));
    }

    #[tokio::test]
    async fn gateway_without_key_fails_before_any_request() {
        let gateway = StripeGateway::new(reqwest::Client::new(), "http://127.0.0.1:9/", None);
        let err = gateway.retrieve_intent("pi_1").await.unwrap_err();
        assert!(matches!(err, AppError::PaymentProviderError(_)));
    }
}
