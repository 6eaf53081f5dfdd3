use crate::{
    entities::{cart_item, CartItem, CartItemModel, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Direction for a cart quantity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Increase,
    Decrease,
}

/// One cart line with its product and line total.
#[derive(Debug, Serialize)]
pub struct CartLine {
    pub item: CartItemModel,
    pub product: ProductModel,
    pub line_total: Decimal,
}

/// The full cart view for a user.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Per-user shopping cart. Lines are keyed by (user, product); adding an
/// already-carted product bumps its quantity instead of creating a second
/// line.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Adds one unit of a product to the user's cart. If the product is
    /// already in the cart the existing line's quantity is incremented. The
    /// stock bound is enforced at increase-time and at placement, not here.
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<CartItemModel, ServiceError> {
        let txn = self.db.begin().await?;

        Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        let item = match existing {
            Some(item) => {
                let new_quantity = item.quantity + 1;
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(new_quantity);
                active.update(&txn).await?
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    product_id: Set(product_id),
                    quantity: Set(1),
                    added_at: Set(chrono::Utc::now()),
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id,
                product_id,
            })
            .await;

        Ok(item)
    }

    /// Adjusts a cart line's quantity. Increasing is capped at the product's
    /// current stock (silently). Decreasing a line already at quantity one
    /// removes it. Returns the updated line, or `None` when the line was
    /// removed.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        action: CartAction,
    ) -> Result<Option<CartItemModel>, ServiceError> {
        let txn = self.db.begin().await?;

        let (item, product) = self.find_owned_line(&txn, user_id, item_id).await?;

        let result = match action {
            CartAction::Increase => {
                // Silently capped at current stock, matching add_to_cart.
                let new_quantity = if item.quantity < product.stock {
                    item.quantity + 1
                } else {
                    item.quantity
                };
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(new_quantity);
                Some(active.update(&txn).await?)
            }
            CartAction::Decrease => {
                if item.quantity <= 1 {
                    let item_id = item.id;
                    CartItem::delete_by_id(item_id).exec(&txn).await?;
                    None
                } else {
                    let new_quantity = item.quantity - 1;
                    let mut active: cart_item::ActiveModel = item.into();
                    active.quantity = Set(new_quantity);
                    Some(active.update(&txn).await?)
                }
            }
        };

        txn.commit().await?;

        match &result {
            Some(_) => {
                self.event_sender
                    .send_or_log(Event::CartItemUpdated { user_id, item_id })
                    .await
            }
            None => {
                self.event_sender
                    .send_or_log(Event::CartItemRemoved { user_id, item_id })
                    .await
            }
        }

        Ok(result)
    }

    /// Removes a cart line regardless of its quantity.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let item = CartItem::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .filter(|item| item.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        CartItem::delete_by_id(item.id).exec(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved { user_id, item_id })
            .await;

        Ok(())
    }

    /// The user's cart with per-line and grand totals.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::AddedAt)
            .find_also_related(Product)
            .all(&*self.db)
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
            lines.push(CartLine {
                item,
                product,
                line_total,
            });
        }

        Ok(CartView { lines, total })
    }

    /// Deletes every line in the user's cart. Used by order placement after
    /// the order has been written.
    pub(crate) async fn clear_cart<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn find_owned_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<(CartItemModel, ProductModel), ServiceError> {
        let (item, product) = CartItem::find_by_id(item_id)
            .find_also_related(Product)
            .one(conn)
            .await?
            .filter(|(item, _)| item.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let product = product.ok_or_else(|| {
            ServiceError::NotFound(format!("Product for cart item {} no longer exists", item_id))
        })?;

        Ok((item, product))
    }
}
