pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;
pub mod promotions;
pub mod reviews;
pub mod tags;
pub mod uploads;
pub mod users;
pub mod wishlist;
