use crate::{
    entities::{
        order, order_item, product, Order, OrderItem, OrderItemModel, OrderModel, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::cart::{CartService, CartView},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;
use validator::Validate;

/// Shipping details captured at checkout. Stored verbatim on the order as a
/// snapshot; later profile edits never touch placed orders.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct ShippingDetails {
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 30))]
    pub phone: String,
}

/// An order with its line items.
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

/// Order placement and history. Placement runs the whole
/// cart-to-order workflow in a single transaction so a failure at any step
/// leaves the cart and stock untouched.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Places an order after a confirmed payment.
    ///
    /// Within one transaction: snapshot the cart, write the order and its
    /// items at the cart's current prices, decrement stock per line, and
    /// clear the cart. The stock decrement is a conditional update
    /// (`stock >= quantity`) so two concurrent placements can never oversell;
    /// the loser rolls back with `InsufficientStock`.
    ///
    /// Replays are idempotent on `payment_id`: if this user already has an
    /// order with this payment id it is returned unchanged. A payment id
    /// recorded for a different user is a `Conflict`, never that user's
    /// order.
    #[instrument(skip(self, shipping))]
    pub async fn place_order(
        &self,
        user_id: Uuid,
        payment_id: &str,
        shipping: ShippingDetails,
    ) -> Result<OrderModel, ServiceError> {
        shipping.validate()?;

        if payment_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "payment id must not be empty".to_string(),
            ));
        }

        if let Some(existing) = self.existing_order_for_payment(user_id, payment_id).await? {
            return Ok(existing);
        }

        let txn = self.db.begin().await?;

        let cart = Self::snapshot_cart(&txn, user_id).await?;
        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            full_name: Set(shipping.full_name),
            email: Set(shipping.email),
            address: Set(shipping.address),
            city: Set(shipping.city),
            state: Set(shipping.state),
            zip_code: Set(shipping.zip_code),
            phone: Set(shipping.phone),
            total_amount: Set(cart.total),
            payment_id: Set(payment_id.to_string()),
            payment_status: Set(true),
            status: Set(order::OrderStatus::Processing),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&txn)
        .await;

        let order = match order {
            Ok(order) => order,
            Err(e) => {
                // Two replays can both miss the pre-check; the unique index
                // on payment_id catches the loser here.
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    txn.rollback().await?;
                    if let Some(existing) =
                        self.existing_order_for_payment(user_id, payment_id).await?
                    {
                        return Ok(existing);
                    }
                }
                return Err(e.into());
            }
        };

        for line in &cart.lines {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(line.product.id),
                price: Set(line.product.price),
                quantity: Set(line.item.quantity),
            }
            .insert(&txn)
            .await?;

            Self::decrement_stock(&txn, line.product.id, line.item.quantity).await?;
        }

        CartService::clear_cart(&txn, user_id).await?;

        if let Err(e) = txn.commit().await {
            // The payment already went through; log the id so the charge can
            // be traced and refunded by hand.
            error!(payment_id, error = %e, "order placement commit failed after payment");
            return Err(e.into());
        }

        self.event_sender
            .send_or_log(Event::CartCleared { user_id })
            .await;
        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id: order.id,
                user_id,
                total_amount: order.total_amount,
            })
            .await;

        Ok(order)
    }

    /// Looks up the order already recorded for a payment id. A payment id
    /// bound to a different user's order is a conflict, not a replay.
    async fn existing_order_for_payment(
        &self,
        user_id: Uuid,
        payment_id: &str,
    ) -> Result<Option<OrderModel>, ServiceError> {
        let existing = Order::find()
            .filter(order::Column::PaymentId.eq(payment_id))
            .one(&*self.db)
            .await?;

        match existing {
            Some(order) if order.user_id == user_id => Ok(Some(order)),
            Some(_) => Err(ServiceError::Conflict(format!(
                "Payment {} already belongs to another order",
                payment_id
            ))),
            None => Ok(None),
        }
    }

    /// The user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderModel>, ServiceError> {
        Ok(Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// One order with its items, only if it belongs to the user.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;

        Ok(OrderWithItems { order, items })
    }

    async fn snapshot_cart(
        txn: &DatabaseTransaction,
        user_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        use crate::entities::{cart_item, CartItem};
        use rust_decimal::Decimal;

        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::AddedAt)
            .find_also_related(Product)
            .all(txn)
            .await?;

        let mut lines = Vec::with_capacity(rows.len());
        let mut total = Decimal::ZERO;
        for (item, product) in rows {
            let product = product.ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product for cart item {} no longer exists",
                    item.id
                ))
            })?;
            let line_total = product.price * Decimal::from(item.quantity);
            total += line_total;
            lines.push(crate::services::cart::CartLine {
                item,
                product,
                line_total,
            });
        }

        Ok(CartView { lines, total })
    }

    /// Conditionally decrements stock. Zero rows updated means another
    /// placement got there first and the remaining stock no longer covers
    /// this line.
    async fn decrement_stock<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let updated = Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Stock.gte(quantity))
            .exec(conn)
            .await?;

        if updated.rows_affected == 0 {
            let name = Product::find_by_id(product_id)
                .one(conn)
                .await?
                .map(|p| p.name)
                .unwrap_or_else(|| product_id.to_string());
            return Err(ServiceError::InsufficientStock(format!(
                "Not enough stock for '{}'",
                name
            )));
        }

        // Products sold down to zero drop out of the storefront.
        Product::update_many()
            .col_expr(product::Column::Available, Expr::value(false))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Stock.lte(0))
            .exec(conn)
            .await?;

        Ok(())
    }
}
