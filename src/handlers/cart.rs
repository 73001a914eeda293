// src/handlers/cart.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::cart::{AddCartItemPayload, CartView, MergeCartPayload, UpdateCartItemPayload},
};

#[utoipa::path(
    get,
    path = "/api/cart",
    tag = "Cart",
    responses((status = 200, description = "Carrinho com preços e estoque atualizados", body = CartView)),
    security(("api_jwt" = []))
)]
pub async fn get_cart(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<CartView>, ApiError> {
    let cart = app_state
        .cart_service
        .get_cart(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cart))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    tag = "Cart",
    request_body = AddCartItemPayload,
    responses(
        (status = 200, description = "Item adicionado", body = CartView),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AddCartItemPayload>,
) -> Result<Json<CartView>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cart = app_state
        .cart_service
        .add_item(user.id, payload.product_id, payload.quantity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cart))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{product_id}",
    tag = "Cart",
    request_body = UpdateCartItemPayload,
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Quantidade definida (0 remove o item)", body = CartView)),
    security(("api_jwt" = []))
)]
pub async fn set_quantity(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemPayload>,
) -> Result<Json<CartView>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cart = app_state
        .cart_service
        .set_quantity(user.id, product_id, payload.quantity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cart))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    tag = "Cart",
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Item removido", body = CartView)),
    security(("api_jwt" = []))
)]
pub async fn remove_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<CartView>, ApiError> {
    let cart = app_state
        .cart_service
        .remove_item(user.id, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cart))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    tag = "Cart",
    responses((status = 200, description = "Carrinho esvaziado", body = CartView)),
    security(("api_jwt" = []))
)]
pub async fn clear_cart(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<CartView>, ApiError> {
    let cart = app_state
        .cart_service
        .clear(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cart))
}

#[utoipa::path(
    post,
    path = "/api/cart/merge",
    tag = "Cart",
    request_body = MergeCartPayload,
    responses((status = 200, description = "Carrinho de convidado incorporado", body = CartView)),
    security(("api_jwt" = []))
)]
pub async fn merge_cart(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<MergeCartPayload>,
) -> Result<Json<CartView>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cart = app_state
        .cart_service
        .merge_guest_cart(user.id, &payload.items)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cart))
}
