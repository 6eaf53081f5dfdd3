use crate::{
    entities::{
        wishlist, wishlist_item, Product, ProductModel, Wishlist, WishlistItem,
        WishlistItemModel, WishlistModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Result of a wishlist add. `created` is false when the product was already
/// wishlisted, so callers can phrase their response accordingly.
#[derive(Debug, Serialize)]
pub struct WishlistAdd {
    pub item: WishlistItemModel,
    pub created: bool,
}

/// A wishlist with its items and their products.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub wishlist: WishlistModel,
    pub items: Vec<WishlistEntry>,
}

#[derive(Debug, Serialize)]
pub struct WishlistEntry {
    pub item: WishlistItemModel,
    pub product: ProductModel,
}

/// Per-user wishlist. The wishlist row itself is created lazily on first
/// use; adds are idempotent per (wishlist, product).
#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl WishlistService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Adds a product to the user's wishlist, creating the wishlist if the
    /// user does not have one yet. Adding a product that is already
    /// wishlisted returns the existing item with `created: false`.
    #[instrument(skip(self))]
    pub async fn add_to_wishlist(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<WishlistAdd, ServiceError> {
        let txn = self.db.begin().await?;

        Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let wishlist = Self::get_or_create_wishlist(&txn, user_id).await?;

        let existing = WishlistItem::find()
            .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        let result = match existing {
            Some(item) => WishlistAdd {
                item,
                created: false,
            },
            None => {
                let item = wishlist_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    wishlist_id: Set(wishlist.id),
                    product_id: Set(product_id),
                    added_at: Set(chrono::Utc::now()),
                }
                .insert(&txn)
                .await?;
                WishlistAdd {
                    item,
                    created: true,
                }
            }
        };

        txn.commit().await?;

        if result.created {
            self.event_sender
                .send_or_log(Event::WishlistItemAdded {
                    user_id,
                    product_id,
                })
                .await;
        }

        Ok(result)
    }

    /// Removes a wishlist item, verifying it belongs to the user's wishlist.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<(), ServiceError> {
        let row = WishlistItem::find_by_id(item_id)
            .find_also_related(Wishlist)
            .one(&*self.db)
            .await?;

        let item = match row {
            Some((item, Some(wishlist))) if wishlist.user_id == user_id => item,
            _ => {
                return Err(ServiceError::NotFound(format!(
                    "Wishlist item {} not found",
                    item_id
                )))
            }
        };

        WishlistItem::delete_by_id(item.id).exec(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::WishlistItemRemoved { user_id, item_id })
            .await;

        Ok(())
    }

    /// Whether the given product is on the user's wishlist. Users without a
    /// wishlist simply get `false`.
    pub async fn is_in_wishlist(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let wishlist = Wishlist::find()
            .filter(wishlist::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;

        let Some(wishlist) = wishlist else {
            return Ok(false);
        };

        let item = WishlistItem::find()
            .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;

        Ok(item.is_some())
    }

    /// The user's wishlist with items and products. Creates the wishlist
    /// lazily so the first view of an empty wishlist succeeds.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self, user_id: Uuid) -> Result<WishlistView, ServiceError> {
        let txn = self.db.begin().await?;
        let wishlist = Self::get_or_create_wishlist(&txn, user_id).await?;
        txn.commit().await?;

        let rows = WishlistItem::find()
            .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
            .order_by_asc(wishlist_item::Column::AddedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for (item, product) in rows {
            let product = product.ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product for wishlist item {} no longer exists",
                    item.id
                ))
            })?;
            items.push(WishlistEntry { item, product });
        }

        Ok(WishlistView { wishlist, items })
    }

    async fn get_or_create_wishlist<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<WishlistModel, ServiceError> {
        let existing = Wishlist::find()
            .filter(wishlist::Column::UserId.eq(user_id))
            .one(conn)
            .await?;

        match existing {
            Some(wishlist) => Ok(wishlist),
            None => Ok(wishlist::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                created_at: Set(chrono::Utc::now()),
            }
            .insert(conn)
            .await?),
        }
    }
}
