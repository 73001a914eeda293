pub mod user_repo;
pub use user_repo::UserRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod category_repo;
pub use category_repo::CategoryRepository;
pub mod tag_repo;
pub use tag_repo::TagRepository;
pub mod promotion_repo;
pub use promotion_repo::PromotionRepository;
pub mod cart_repo;
pub use cart_repo::CartRepository;
pub mod wishlist_repo;
pub use wishlist_repo::WishlistRepository;
pub mod order_repo;
pub use order_repo::{NewOrder, OrderRepository};
pub mod review_repo;
pub use review_repo::ReviewRepository;
