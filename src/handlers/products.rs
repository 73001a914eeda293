// src/handlers/products.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::uploads::read_image,
    middleware::{
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::product::{
        CreateProductPayload, ImageUrlPayload, Page, Product, ProductFilter, UpdateProductPayload,
        UpdateStockPayload,
    },
};

// ---
// Vitrine (pública)
// ---

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    params(ProductFilter),
    responses((status = 200, description = "Produtos paginados", body = Page<Product>))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Page<Product>>, ApiError> {
    let page = app_state
        .catalog_service
        .search_products(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    tag = "Catalog",
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = app_state
        .catalog_service
        .get_product(product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    get,
    path = "/api/products/reference/{reference}",
    tag = "Catalog",
    params(("reference" = String, Path, description = "Referência (SKU) do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product_by_reference(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(reference): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = app_state
        .catalog_service
        .get_product_by_reference(&reference)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// ---
// Back-office
// ---

#[utoipa::path(
    post,
    path = "/api/admin/products",
    tag = "Admin",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos, categoria ou tag desconhecida"),
        (status = 409, description = "Referência já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .catalog_service
        .create_product(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{product_id}",
    tag = "Admin",
    request_body = UpdateProductPayload,
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Produto atualizado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .catalog_service
        .update_product(product_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{product_id}",
    tag = "Admin",
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses((status = 204, description = "Produto removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .catalog_service
        .delete_product(product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/admin/products/{product_id}/stock",
    tag = "Admin",
    request_body = UpdateStockPayload,
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Estoque ajustado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn update_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateStockPayload>,
) -> Result<Json<Product>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .catalog_service
        .set_stock(product_id, payload.stock)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{product_id}/images",
    tag = "Admin",
    request_body(content_type = "multipart/form-data", description = "Campo `file` com a imagem (até 5 MiB)"),
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 201, description = "Imagem adicionada ao produto", body = Product),
        (status = 400, description = "Arquivo inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_product_image(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(product_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    // Falha cedo se o produto não existe, antes de enviar ao provedor
    app_state
        .catalog_service
        .get_product(product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let file = read_image(multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let url = app_state
        .image_service
        .upload(&file.file_name, &file.content_type, file.bytes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .catalog_service
        .add_image(product_id, &url)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{product_id}/images",
    tag = "Admin",
    request_body = ImageUrlPayload,
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Imagem removida do produto", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn remove_product_image(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ImageUrlPayload>,
) -> Result<Json<Product>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .catalog_service
        .remove_image(product_id, &payload.url)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}
