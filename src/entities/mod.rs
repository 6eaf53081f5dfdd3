pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod wishlist;
pub mod wishlist_item;

pub use cart_item::Entity as CartItem;
pub use category::Entity as Category;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use wishlist::Entity as Wishlist;
pub use wishlist_item::Entity as WishlistItem;

pub type CartItemModel = cart_item::Model;
pub type CategoryModel = category::Model;
pub type OrderModel = order::Model;
pub type OrderItemModel = order_item::Model;
pub type ProductModel = product::Model;
pub type WishlistModel = wishlist::Model;
pub type WishlistItemModel = wishlist_item::Model;
