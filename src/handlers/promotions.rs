// src/handlers/promotions.rs

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
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        product::Product,
        promotion::{AttachProductsPayload, CreatePromotionPayload, Promotion, RefreshReport, UpdatePromotionPayload},
    },
};

// ---
// Vitrine (pública)
// ---

#[utoipa::path(
    get,
    path = "/api/promotions",
    tag = "Promotions",
    responses((status = 200, description = "Promoções vigentes", body = Vec<Promotion>))
)]
pub async fn list_active(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<Promotion>>, ApiError> {
    let promotions = app_state
        .promotion_service
        .list(true)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(promotions))
}

#[utoipa::path(
    get,
    path = "/api/promotions/{promotion_id}",
    tag = "Promotions",
    params(("promotion_id" = Uuid, Path, description = "ID da promoção")),
    responses(
        (status = 200, description = "Promoção", body = Promotion),
        (status = 404, description = "Promoção não encontrada")
    )
)]
pub async fn get_promotion(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(promotion_id): Path<Uuid>,
) -> Result<Json<Promotion>, ApiError> {
    let promotion = app_state
        .promotion_service
        .get(promotion_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(promotion))
}

#[utoipa::path(
    get,
    path = "/api/promotions/{promotion_id}/products",
    tag = "Promotions",
    params(("promotion_id" = Uuid, Path, description = "ID da promoção")),
    responses((status = 200, description = "Produtos da promoção", body = Vec<Product>))
)]
pub async fn promotion_products(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(promotion_id): Path<Uuid>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = app_state
        .promotion_service
        .products(promotion_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

// ---
// Back-office
// ---

#[utoipa::path(
    get,
    path = "/api/admin/promotions",
    tag = "Admin",
    responses((status = 200, description = "Todas as promoções (inclusive agendadas e encerradas)", body = Vec<Promotion>)),
    security(("api_jwt" = []))
)]
pub async fn list_all(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
) -> Result<Json<Vec<Promotion>>, ApiError> {
    let promotions = app_state
        .promotion_service
        .list(false)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(promotions))
}

#[utoipa::path(
    post,
    path = "/api/admin/promotions",
    tag = "Admin",
    request_body = CreatePromotionPayload,
    responses(
        (status = 201, description = "Promoção criada", body = Promotion),
        (status = 400, description = "Período ou desconto inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_promotion(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreatePromotionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let promotion = app_state
        .promotion_service
        .create(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(promotion)))
}

#[utoipa::path(
    put,
    path = "/api/admin/promotions/{promotion_id}",
    tag = "Admin",
    request_body = UpdatePromotionPayload,
    params(("promotion_id" = Uuid, Path, description = "ID da promoção")),
    responses((status = 200, description = "Promoção atualizada", body = Promotion)),
    security(("api_jwt" = []))
)]
pub async fn update_promotion(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(promotion_id): Path<Uuid>,
    Json(payload): Json<UpdatePromotionPayload>,
) -> Result<Json<Promotion>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let promotion = app_state
        .promotion_service
        .update(promotion_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(promotion))
}

#[utoipa::path(
    delete,
    path = "/api/admin/promotions/{promotion_id}",
    tag = "Admin",
    params(("promotion_id" = Uuid, Path, description = "ID da promoção")),
    responses((status = 204, description = "Promoção removida; produtos voltam ao preço cheio")),
    security(("api_jwt" = []))
)]
pub async fn delete_promotion(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(promotion_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .promotion_service
        .delete(promotion_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/promotions/{promotion_id}/products",
    tag = "Admin",
    request_body = AttachProductsPayload,
    params(("promotion_id" = Uuid, Path, description = "ID da promoção")),
    responses((status = 200, description = "Produtos vinculados à promoção", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn attach_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(promotion_id): Path<Uuid>,
    Json(payload): Json<AttachProductsPayload>,
) -> Result<Json<Vec<Product>>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let products = app_state
        .promotion_service
        .attach_products(promotion_id, &payload.product_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    delete,
    path = "/api/admin/promotions/{promotion_id}/products/{product_id}",
    tag = "Admin",
    params(
        ("promotion_id" = Uuid, Path, description = "ID da promoção"),
        ("product_id" = Uuid, Path, description = "ID do produto")
    ),
    responses((status = 204, description = "Produto desvinculado")),
    security(("api_jwt" = []))
)]
pub async fn detach_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path((promotion_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .promotion_service
        .detach_product(promotion_id, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/promotions/refresh",
    tag = "Admin",
    responses((status = 200, description = "Ativação recalculada", body = RefreshReport)),
    security(("api_jwt" = []))
)]
pub async fn refresh_promotions(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
) -> Result<Json<RefreshReport>, ApiError> {
    let report = app_state
        .promotion_service
        .refresh_activation()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
