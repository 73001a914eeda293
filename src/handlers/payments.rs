// src/handlers/payments.rs

use axum::{extract::State, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    services::payment_service::PaymentIntentResponse,
};

#[utoipa::path(
    post,
    path = "/api/payments/intent",
    tag = "Payments",
    responses(
        (status = 200, description = "Intenção de pagamento para o total atual do carrinho", body = PaymentIntentResponse),
        (status = 400, description = "Carrinho vazio"),
        (status = 502, description = "Falha no provedor de pagamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_intent(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let intent = app_state
        .order_service
        .create_payment_intent(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(intent))
}
