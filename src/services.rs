pub mod auth;
pub mod cart_service;
pub mod catalog_service;
pub mod document_service;
pub mod image_service;
pub mod oauth_service;
pub mod order_service;
pub mod payment_service;
pub mod promotion_service;
pub mod review_service;
pub mod user_service;
pub mod wishlist_service;
