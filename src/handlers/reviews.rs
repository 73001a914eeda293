// src/handlers/reviews.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::review::{CreateReviewPayload, ProductReviews, Review, UpdateReviewPayload},
};

#[utoipa::path(
    get,
    path = "/api/products/{product_id}/reviews",
    tag = "Reviews",
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Avaliações e média do produto", body = ProductReviews),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn list_for_product(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductReviews>, ApiError> {
    let reviews = app_state
        .review_service
        .for_product(product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(reviews))
}

#[utoipa::path(
    get,
    path = "/api/reviews/mine",
    tag = "Reviews",
    responses((status = 200, description = "Avaliações do usuário", body = Vec<Review>)),
    security(("api_jwt" = []))
)]
pub async fn list_mine(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = app_state
        .review_service
        .mine(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(reviews))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "Reviews",
    request_body = CreateReviewPayload,
    responses(
        (status = 201, description = "Avaliação criada", body = Review),
        (status = 409, description = "Usuário já avaliou o produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_review(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateReviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let review = app_state
        .review_service
        .create(user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(review)))
}

#[utoipa::path(
    put,
    path = "/api/reviews/{review_id}",
    tag = "Reviews",
    request_body = UpdateReviewPayload,
    params(("review_id" = Uuid, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Avaliação atualizada", body = Review),
        (status = 403, description = "Avaliação de outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_review(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(review_id): Path<Uuid>,
    Json(payload): Json<UpdateReviewPayload>,
) -> Result<Json<Review>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let review = app_state
        .review_service
        .update(user.id, review_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(review))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{review_id}",
    tag = "Reviews",
    params(("review_id" = Uuid, Path, description = "ID da avaliação")),
    responses((status = 204, description = "Avaliação removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_review(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(review_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .review_service
        .delete_own(user.id, review_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// Moderação
#[utoipa::path(
    delete,
    path = "/api/admin/reviews/{review_id}",
    tag = "Admin",
    params(("review_id" = Uuid, Path, description = "ID da avaliação")),
    responses((status = 204, description = "Avaliação removida pela moderação")),
    security(("api_jwt" = []))
)]
pub async fn moderate_delete(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(review_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .review_service
        .delete_any(review_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
