// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::signup,
        handlers::auth::signin,
        handlers::auth::google,
        handlers::auth::signout,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::update_me,
        handlers::users::change_password,

        // --- Catalog ---
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::get_product_by_reference,
        handlers::categories::list_categories,
        handlers::categories::get_category,
        handlers::tags::list_tags,

        // --- Promotions ---
        handlers::promotions::list_active,
        handlers::promotions::get_promotion,
        handlers::promotions::promotion_products,

        // --- Cart ---
        handlers::cart::get_cart,
        handlers::cart::add_item,
        handlers::cart::set_quantity,
        handlers::cart::remove_item,
        handlers::cart::clear_cart,
        handlers::cart::merge_cart,

        // --- Wishlist ---
        handlers::wishlist::get_wishlist,
        handlers::wishlist::add_item,
        handlers::wishlist::remove_item,
        handlers::wishlist::clear_wishlist,
        handlers::wishlist::move_to_cart,

        // --- Checkout ---
        handlers::payments::create_intent,
        handlers::orders::place_order,
        handlers::orders::list_my_orders,
        handlers::orders::get_order,
        handlers::orders::cancel_order,
        handlers::orders::download_invoice,

        // --- Reviews ---
        handlers::reviews::list_for_product,
        handlers::reviews::list_mine,
        handlers::reviews::create_review,
        handlers::reviews::update_review,
        handlers::reviews::delete_review,

        // --- Admin ---
        handlers::users::list_users,
        handlers::users::create_admin,
        handlers::users::set_active,
        handlers::users::delete_user,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::update_stock,
        handlers::products::upload_product_image,
        handlers::products::remove_product_image,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::categories::add_subcategory,
        handlers::categories::remove_subcategory,
        handlers::tags::create_tag,
        handlers::tags::rename_tag,
        handlers::tags::delete_tag,
        handlers::promotions::list_all,
        handlers::promotions::create_promotion,
        handlers::promotions::update_promotion,
        handlers::promotions::delete_promotion,
        handlers::promotions::attach_products,
        handlers::promotions::detach_product,
        handlers::promotions::refresh_promotions,
        handlers::orders::list_orders,
        handlers::orders::update_order_status,
        handlers::orders::mark_order_paid,
        handlers::orders::delete_order,
        handlers::reviews::moderate_delete,
        handlers::uploads::upload_image,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::SignUpPayload,
            models::auth::SignInPayload,
            models::auth::GoogleSignInPayload,
            models::auth::AuthResponse,
            models::auth::UpdateProfilePayload,
            models::auth::ChangePasswordPayload,
            models::auth::CreateAdminPayload,
            models::auth::SetActivePayload,

            // --- Catalog ---
            models::product::Product,
            models::product::ProductSort,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,
            models::product::UpdateStockPayload,
            models::product::ImageUrlPayload,
            models::category::Category,
            models::category::SubcategoryGroup,
            models::category::CreateCategoryPayload,
            models::category::UpdateCategoryPayload,
            models::tag::ProductTag,
            models::tag::TagPayload,

            // --- Promotions ---
            models::promotion::Promotion,
            models::promotion::CreatePromotionPayload,
            models::promotion::UpdatePromotionPayload,
            models::promotion::AttachProductsPayload,
            models::promotion::RefreshReport,

            // --- Cart / Wishlist ---
            models::cart::LineItem,
            models::cart::CartView,
            models::cart::AddCartItemPayload,
            models::cart::UpdateCartItemPayload,
            models::cart::MergeCartPayload,
            models::wishlist::AddWishlistItemPayload,

            // --- Orders / Payments ---
            models::order::OrderStatus,
            models::order::PaymentMethod,
            models::order::PaymentStatus,
            models::order::ShippingInfo,
            models::order::Order,
            models::order::PlaceOrderPayload,
            models::order::UpdateOrderStatusPayload,
            services::payment_service::PaymentIntentResponse,

            // --- Reviews ---
            models::review::Review,
            models::review::RatingSummary,
            models::review::ProductReviews,
            models::review::CreateReviewPayload,
            models::review::UpdateReviewPayload,

            // --- Uploads ---
            handlers::uploads::UploadResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro, login e sessão"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Catalog", description = "Produtos, categorias e tags"),
        (name = "Promotions", description = "Promoções vigentes"),
        (name = "Cart", description = "Carrinho de compras"),
        (name = "Wishlist", description = "Lista de desejos"),
        (name = "Payments", description = "Intenções de pagamento com cartão"),
        (name = "Orders", description = "Checkout e pedidos do comprador"),
        (name = "Reviews", description = "Avaliações de produtos"),
        (name = "Admin", description = "Back-office (somente ADMIN)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
