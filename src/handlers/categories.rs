// src/handlers/categories.rs

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
    models::category::{Category, CreateCategoryPayload, SubcategoryGroup, UpdateCategoryPayload},
};

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Catalog",
    responses((status = 200, description = "Árvore de categorias", body = Vec<Category>))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = app_state
        .catalog_service
        .list_categories()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/api/categories/{category_id}",
    tag = "Catalog",
    params(("category_id" = Uuid, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Categoria", body = Category),
        (status = 404, description = "Categoria não encontrada")
    )
)]
pub async fn get_category(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(category_id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    let category = app_state
        .catalog_service
        .get_category(category_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(category))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    tag = "Admin",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .create_category(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/admin/categories/{category_id}",
    tag = "Admin",
    request_body = UpdateCategoryPayload,
    params(("category_id" = Uuid, Path, description = "ID da categoria")),
    responses((status = 200, description = "Categoria atualizada", body = Category)),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<Json<Category>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .update_category(category_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{category_id}",
    tag = "Admin",
    params(("category_id" = Uuid, Path, description = "ID da categoria")),
    responses((status = 204, description = "Categoria removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .catalog_service
        .delete_category(category_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/categories/{category_id}/subcategories",
    tag = "Admin",
    request_body = SubcategoryGroup,
    params(("category_id" = Uuid, Path, description = "ID da categoria")),
    responses(
        (status = 201, description = "Subcategoria adicionada", body = Category),
        (status = 409, description = "Subcategoria já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_subcategory(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<SubcategoryGroup>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .add_subcategory(category_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{category_id}/subcategories/{name}",
    tag = "Admin",
    params(
        ("category_id" = Uuid, Path, description = "ID da categoria"),
        ("name" = String, Path, description = "Nome do grupo de subcategorias")
    ),
    responses((status = 200, description = "Subcategoria removida", body = Category)),
    security(("api_jwt" = []))
)]
pub async fn remove_subcategory(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path((category_id, name)): Path<(Uuid, String)>,
) -> Result<Json<Category>, ApiError> {
    let category = app_state
        .catalog_service
        .remove_subcategory(category_id, &name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(category))
}
