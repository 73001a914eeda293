// src/handlers/wishlist.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        cart::{CartView, LineItem},
        wishlist::AddWishlistItemPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/wishlist",
    tag = "Wishlist",
    responses((status = 200, description = "Lista de desejos", body = Vec<LineItem>)),
    security(("api_jwt" = []))
)]
pub async fn get_wishlist(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<LineItem>>, ApiError> {
    let items = app_state
        .wishlist_service
        .get(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/items",
    tag = "Wishlist",
    request_body = AddWishlistItemPayload,
    responses((status = 200, description = "Produto na lista (idempotente)", body = Vec<LineItem>)),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AddWishlistItemPayload>,
) -> Result<Json<Vec<LineItem>>, ApiError> {
    let items = app_state
        .wishlist_service
        .add(user.id, payload.product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(items))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/items/{product_id}",
    tag = "Wishlist",
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Produto removido da lista", body = Vec<LineItem>)),
    security(("api_jwt" = []))
)]
pub async fn remove_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<LineItem>>, ApiError> {
    let items = app_state
        .wishlist_service
        .remove(user.id, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(items))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist",
    tag = "Wishlist",
    responses((status = 204, description = "Lista esvaziada")),
    security(("api_jwt" = []))
)]
pub async fn clear_wishlist(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    app_state
        .wishlist_service
        .clear(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/wishlist/items/{product_id}/move-to-cart",
    tag = "Wishlist",
    params(("product_id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto movido para o carrinho", body = CartView),
        (status = 409, description = "Sem estoque")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_to_cart(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<CartView>, ApiError> {
    let cart = app_state
        .wishlist_service
        .move_to_cart(user.id, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cart))
}
