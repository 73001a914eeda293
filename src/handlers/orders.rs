// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
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
    models::{
        order::{Order, OrderFilter, PlaceOrderPayload, UpdateOrderStatusPayload},
        product::{Page, PageParams, PageRequest},
    },
};

// ---
// Comprador
// ---

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = PlaceOrderPayload,
    responses(
        (status = 201, description = "Pedido criado a partir do carrinho", body = Order),
        (status = 400, description = "Carrinho vazio ou dados inválidos"),
        (status = 402, description = "Pagamento não concluído"),
        (status = 409, description = "Estoque insuficiente ou pagamento já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn place_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<PlaceOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .place_order(user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/orders/mine",
    tag = "Orders",
    params(PageParams),
    responses((status = 200, description = "Pedidos do usuário", body = Page<Order>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Order>>, ApiError> {
    let orders = app_state
        .order_service
        .list_mine(user.id, PageRequest::new(params.page, params.limit))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido", body = Order),
        (status = 403, description = "Pedido de outro usuário"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = app_state
        .order_service
        .get_for(&user, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/cancel",
    tag = "Orders",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido cancelado; estoque devolvido", body = Order),
        (status = 409, description = "Pedido já saiu de PENDING")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = app_state
        .order_service
        .cancel(&user, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}/invoice",
    tag = "Orders",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, description = "Nota do pedido em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn download_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = app_state
        .order_service
        .get_for(&user, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .generate_invoice_pdf(&order, &app_state.config.currency)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"order_{}.pdf\"", order.display_id),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}

// ---
// Back-office
// ---

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "Admin",
    params(OrderFilter),
    responses((status = 200, description = "Todos os pedidos", body = Page<Order>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Page<Order>>, ApiError> {
    let orders = app_state
        .order_service
        .list_all(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{order_id}/status",
    tag = "Admin",
    request_body = UpdateOrderStatusPayload,
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Status atualizado", body = Order),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusPayload>,
) -> Result<Json<Order>, ApiError> {
    let order = app_state
        .order_service
        .update_status(order_id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{order_id}/paid",
    tag = "Admin",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, description = "Pagamento registrado (pagamento na entrega)", body = Order)),
    security(("api_jwt" = []))
)]
pub async fn mark_order_paid(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = app_state
        .order_service
        .mark_paid(order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{order_id}",
    tag = "Admin",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 204, description = "Pedido removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(order_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .order_service
        .delete(order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
