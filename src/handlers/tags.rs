// src/handlers/tags.rs

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
    models::tag::{ProductTag, TagPayload},
};

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "Catalog",
    responses((status = 200, description = "Tags conhecidas", body = Vec<ProductTag>))
)]
pub async fn list_tags(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<ProductTag>>, ApiError> {
    let tags = app_state
        .catalog_service
        .list_tags()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tags))
}

#[utoipa::path(
    post,
    path = "/api/admin/tags",
    tag = "Admin",
    request_body = TagPayload,
    responses(
        (status = 201, description = "Tag criada", body = ProductTag),
        (status = 409, description = "Tag já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tag(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<TagPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tag = app_state
        .catalog_service
        .create_tag(&payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(tag)))
}

#[utoipa::path(
    put,
    path = "/api/admin/tags/{tag_id}",
    tag = "Admin",
    request_body = TagPayload,
    params(("tag_id" = Uuid, Path, description = "ID da tag")),
    responses((status = 200, description = "Tag renomeada (produtos atualizados)", body = ProductTag)),
    security(("api_jwt" = []))
)]
pub async fn rename_tag(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(tag_id): Path<Uuid>,
    Json(payload): Json<TagPayload>,
) -> Result<Json<ProductTag>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tag = app_state
        .catalog_service
        .rename_tag(tag_id, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tag))
}

#[utoipa::path(
    delete,
    path = "/api/admin/tags/{tag_id}",
    tag = "Admin",
    params(("tag_id" = Uuid, Path, description = "ID da tag")),
    responses((status = 204, description = "Tag removida de todos os produtos")),
    security(("api_jwt" = []))
)]
pub async fn delete_tag(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(tag_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .catalog_service
        .delete_tag(tag_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
