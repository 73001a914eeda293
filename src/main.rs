//src/main.rs

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::common::error::ApiError;
use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, i18n::Locale};
use crate::services::image_service::MAX_IMAGE_BYTES;

// Folga para os demais campos do formulário multipart
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    bootstrap_admin(&app_state).await?;
    spawn_promotion_refresher(app_state.clone());

    let addr = app_state.config.bind_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// Cria o primeiro administrador a partir do ambiente (ADMIN_EMAIL / ADMIN_PASSWORD)
async fn bootstrap_admin(app_state: &AppState) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (
        app_state.config.admin_email.as_deref(),
        app_state.config.admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    let created = app_state
        .auth_service
        .ensure_admin_account(email, password)
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao criar o administrador inicial: {e}"))?;
    if created {
        tracing::info!("👤 Administrador inicial criado: {}", email);
    }
    Ok(())
}

// Recalcula periodicamente quais promoções estão vigentes.
// O primeiro tick do intervalo é imediato, então a ativação também roda no boot.
fn spawn_promotion_refresher(app_state: AppState) {
    let period = Duration::from_secs(app_state.config.promotion_refresh_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = app_state.promotion_service.refresh_activation().await {
                tracing::error!("Falha ao recalcular promoções: {}", e);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de desligamento: {}", e);
    }
    tracing::info!("Desligando o servidor...");
}

async fn health() -> &'static str {
    "OK"
}

async fn route_not_found(State(app_state): State<AppState>, locale: Locale) -> ApiError {
    let message = app_state.i18n_store.translate(&locale.0, "error.route_not_found", &[]);
    ApiError::new(StatusCode::NOT_FOUND, message)
}

fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("💥 Pânico ao processar a requisição");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.").into_response()
}

fn cors_layer(config: &Config) -> CorsLayer {
    // Lista separada por vírgulas; com credenciais não dá para usar "*"
    let origins: Vec<HeaderValue> = config
        .cors_origin
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT_LANGUAGE])
}

fn build_router(app_state: AppState) -> Router {
    // Rotas públicas: vitrine e autenticação
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/signin", post(handlers::auth::signin))
        .route("/api/auth/google", post(handlers::auth::google))
        .route("/api/auth/signout", post(handlers::auth::signout))
        .route("/api/products", get(handlers::products::list_products))
        .route("/api/products/{product_id}", get(handlers::products::get_product))
        .route(
            "/api/products/reference/{reference}",
            get(handlers::products::get_product_by_reference),
        )
        .route("/api/products/{product_id}/reviews", get(handlers::reviews::list_for_product))
        .route("/api/categories", get(handlers::categories::list_categories))
        .route("/api/categories/{category_id}", get(handlers::categories::get_category))
        .route("/api/tags", get(handlers::tags::list_tags))
        .route("/api/promotions", get(handlers::promotions::list_active))
        .route("/api/promotions/{promotion_id}", get(handlers::promotions::get_promotion))
        .route(
            "/api/promotions/{promotion_id}/products",
            get(handlers::promotions::promotion_products),
        );

    // Rotas do comprador (exigem sessão)
    let user_routes = Router::new()
        .route(
            "/api/users/me",
            get(handlers::users::get_me).put(handlers::users::update_me),
        )
        .route("/api/users/me/password", put(handlers::users::change_password))
        .route(
            "/api/cart",
            get(handlers::cart::get_cart).delete(handlers::cart::clear_cart),
        )
        .route("/api/cart/items", post(handlers::cart::add_item))
        .route(
            "/api/cart/items/{product_id}",
            put(handlers::cart::set_quantity).delete(handlers::cart::remove_item),
        )
        .route("/api/cart/merge", post(handlers::cart::merge_cart))
        .route(
            "/api/wishlist",
            get(handlers::wishlist::get_wishlist).delete(handlers::wishlist::clear_wishlist),
        )
        .route("/api/wishlist/items", post(handlers::wishlist::add_item))
        .route("/api/wishlist/items/{product_id}", delete(handlers::wishlist::remove_item))
        .route(
            "/api/wishlist/items/{product_id}/move-to-cart",
            post(handlers::wishlist::move_to_cart),
        )
        .route("/api/payments/intent", post(handlers::payments::create_intent))
        .route("/api/orders", post(handlers::orders::place_order))
        .route("/api/orders/mine", get(handlers::orders::list_my_orders))
        .route("/api/orders/{order_id}", get(handlers::orders::get_order))
        .route("/api/orders/{order_id}/cancel", post(handlers::orders::cancel_order))
        .route("/api/orders/{order_id}/invoice", get(handlers::orders::download_invoice))
        .route("/api/reviews", post(handlers::reviews::create_review))
        .route("/api/reviews/mine", get(handlers::reviews::list_mine))
        .route(
            "/api/reviews/{review_id}",
            put(handlers::reviews::update_review).delete(handlers::reviews::delete_review),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Back-office: sessão + papel ADMIN (checado pelo extrator RequireRole em cada handler)
    let admin_routes = Router::new()
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_admin),
        )
        .route("/users/{user_id}", delete(handlers::users::delete_user))
        .route("/users/{user_id}/active", put(handlers::users::set_active))
        .route("/products", post(handlers::products::create_product))
        .route(
            "/products/{product_id}",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route("/products/{product_id}/stock", patch(handlers::products::update_stock))
        .route(
            "/products/{product_id}/images",
            post(handlers::products::upload_product_image)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
                .delete(handlers::products::remove_product_image),
        )
        .route("/categories", post(handlers::categories::create_category))
        .route(
            "/categories/{category_id}",
            put(handlers::categories::update_category).delete(handlers::categories::delete_category),
        )
        .route(
            "/categories/{category_id}/subcategories",
            post(handlers::categories::add_subcategory),
        )
        .route(
            "/categories/{category_id}/subcategories/{name}",
            delete(handlers::categories::remove_subcategory),
        )
        .route("/tags", post(handlers::tags::create_tag))
        .route(
            "/tags/{tag_id}",
            put(handlers::tags::rename_tag).delete(handlers::tags::delete_tag),
        )
        .route(
            "/promotions",
            get(handlers::promotions::list_all).post(handlers::promotions::create_promotion),
        )
        .route("/promotions/refresh", post(handlers::promotions::refresh_promotions))
        .route(
            "/promotions/{promotion_id}",
            put(handlers::promotions::update_promotion).delete(handlers::promotions::delete_promotion),
        )
        .route(
            "/promotions/{promotion_id}/products",
            post(handlers::promotions::attach_products),
        )
        .route(
            "/promotions/{promotion_id}/products/{product_id}",
            delete(handlers::promotions::detach_product),
        )
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/{order_id}", delete(handlers::orders::delete_order))
        .route("/orders/{order_id}/status", put(handlers::orders::update_order_status))
        .route("/orders/{order_id}/paid", put(handlers::orders::mark_order_paid))
        .route("/reviews/{review_id}", delete(handlers::reviews::moderate_delete))
        .route(
            "/uploads",
            post(handlers::uploads::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let cors = cors_layer(&app_state.config);

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(user_routes)
        .nest("/api/admin", admin_routes)
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::tests::test_state;

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_check_answers_ok() {
        let response = build_router(test_state())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let (status, body) = send(Request::get("/api/cart").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_unauthorized() {
        let request = Request::get("/api/orders")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_route_without_token_is_unauthorized() {
        let (status, _) = send(Request::get("/api/admin/users").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signup_with_invalid_payload_lists_field_errors() {
        let request = Request::post("/api/auth/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT_LANGUAGE, "pt-BR")
            .body(Body::from(
                r#"{"email":"not-an-email","password":"123","firstName":"Ana","lastName":"Silva"}"#,
            ))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["email"].is_array());
        assert!(body["details"]["password"].is_array());
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let (status, body) = send(Request::get("/api/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found.");
    }

    #[tokio::test]
    async fn signout_clears_session_cookie() {
        let response = build_router(test_state())
            .oneshot(Request::post("/api/auth/signout").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("token="));
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin_with_credentials() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/products")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[test]
    fn openapi_document_lists_checkout_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/payments/intent"));
        assert!(doc.paths.paths.contains_key("/api/admin/promotions/{promotion_id}/products"));
    }
}
