pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payments;
pub mod wishlist;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use payments::PaymentGateway;
pub use wishlist::WishlistService;
