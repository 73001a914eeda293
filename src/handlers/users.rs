// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
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
    models::{
        auth::{ChangePasswordPayload, CreateAdminPayload, SetActivePayload, UpdateProfilePayload, User, UserFilter},
        product::{Page, PageRequest},
    },
};

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "Usuário autenticado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses((status = 200, description = "Perfil atualizado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn update_me(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<User>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .user_service
        .update_profile(user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

#[utoipa::path(
    put,
    path = "/api/users/me/password",
    tag = "Users",
    request_body = ChangePasswordPayload,
    responses(
        (status = 204, description = "Senha alterada"),
        (status = 401, description = "Senha atual incorreta")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<StatusCode, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .user_service
        .change_password(&user, &payload.current_password, &payload.new_password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Back-office
// ---

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(UserFilter),
    responses((status = 200, description = "Usuários paginados", body = Page<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Page<User>>, ApiError> {
    let page = PageRequest::new(filter.page, filter.limit);
    let users = app_state
        .user_service
        .list_users(filter.role, page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Admin",
    request_body = CreateAdminPayload,
    responses(
        (status = 201, description = "Administrador criado", body = User),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let admin = app_state
        .user_service
        .create_admin(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(admin)))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}/active",
    tag = "Admin",
    request_body = SetActivePayload,
    params(("user_id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Situação da conta alterada", body = User),
        (status = 403, description = "Não é possível alterar a própria conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_active(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetActivePayload>,
) -> Result<Json<User>, ApiError> {
    let user = app_state
        .user_service
        .set_active(&admin, user_id, payload.active)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    tag = "Admin",
    params(("user_id" = Uuid, Path, description = "ID do usuário")),
    responses((status = 204, description = "Usuário removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .user_service
        .delete_user(&admin, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
