use crate::{
    events::EventSender,
    services::{CartService, CatalogService, OrderService, PaymentGateway, WishlistService},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod common;
pub mod orders;
pub mod wishlist;

/// Service instances shared by the handlers through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub wishlist: Arc<WishlistService>,
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentGateway>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        payments: PaymentGateway,
    ) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(db.clone())),
            cart: Arc::new(CartService::new(db.clone(), event_sender.clone())),
            wishlist: Arc::new(WishlistService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(db, event_sender)),
            payments: Arc::new(payments),
        }
    }
}
