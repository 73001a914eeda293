// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::SESSION_COOKIE, i18n::Locale},
    models::auth::{AuthResponse, GoogleSignInPayload, SignInPayload, SignUpPayload, User},
};

// Cookie de sessão HttpOnly (sem max-age: dura enquanto o navegador estiver aberto)
fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn signed_in(jar: CookieJar, app_state: &AppState, token: String, user: User) -> (CookieJar, Json<AuthResponse>) {
    let jar = jar.add(session_cookie(token.clone(), app_state.config.cookie_secure));
    (jar, Json(AuthResponse { token, user }))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Conta criada; cookie de sessão definido", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn signup(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<SignUpPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (token, user) = app_state
        .auth_service
        .register_user(&payload.email, &payload.password, &payload.first_name, &payload.last_name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, signed_in(jar, &app_state, token, user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "Auth",
    request_body = SignInPayload,
    responses(
        (status = 200, description = "Sessão iniciada", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Conta desativada")
    )
)]
pub async fn signin(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<SignInPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (token, user) = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(signed_in(jar, &app_state, token, user))
}

#[utoipa::path(
    post,
    path = "/api/auth/google",
    tag = "Auth",
    request_body = GoogleSignInPayload,
    responses(
        (status = 200, description = "Sessão iniciada com a conta Google", body = AuthResponse),
        (status = 401, description = "Token do provedor inválido")
    )
)]
pub async fn google(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<GoogleSignInPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let profile = app_state
        .oauth_service
        .fetch_profile(&payload.access_token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let (token, user) = app_state
        .auth_service
        .google_login(&profile)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(signed_in(jar, &app_state, token, user))
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    tag = "Auth",
    responses((status = 204, description = "Cookie de sessão removido"))
)]
pub async fn signout(jar: CookieJar) -> impl IntoResponse {
    (StatusCode::NO_CONTENT, jar.remove(Cookie::build(SESSION_COOKIE).path("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("abc".into(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.max_age().is_none());
    }

    #[tokio::test]
    async fn signed_in_sets_cookie_and_returns_same_token() {
        let state = crate::config::tests::test_state();
        let now = chrono::Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4(),
            role: crate::models::auth::UserRole::Buyer,
            email: "ana@example.com".into(),
            password_hash: None,
            google_id: None,
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            phone: None,
            address: None,
            city: None,
            postal_code: None,
            country: None,
            avatar_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let (jar, Json(body)) = signed_in(CookieJar::new(), &state, "tok".into(), user);
        drop(state);

        assert_eq!(jar.get(SESSION_COOKIE).map(|c| c.value().to_string()), Some("tok".to_string()));
        assert_eq!(body.token, "tok");
        assert_eq!(body.user.email, "ana@example.com");
    }
}
