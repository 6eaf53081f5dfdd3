mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::errors::ServiceError;
use uuid::Uuid;

#[tokio::test]
async fn first_add_creates_the_wishlist_lazily() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;
    let wishlist = app.state.services.wishlist.clone();
    let user = app.user_id();

    let added = wishlist
        .add_to_wishlist(user, product.id)
        .await
        .expect("add to wishlist");
    assert!(added.created);

    let view = wishlist.get_wishlist(user).await.expect("wishlist view");
    assert_eq!(view.wishlist.user_id, user);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product.id, product.id);
}

#[tokio::test]
async fn repeat_adds_are_idempotent() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;
    let wishlist = app.state.services.wishlist.clone();
    let user = app.user_id();

    let first = wishlist
        .add_to_wishlist(user, product.id)
        .await
        .expect("first add");
    let second = wishlist
        .add_to_wishlist(user, product.id)
        .await
        .expect("second add");

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.item.id, second.item.id);

    let view = wishlist.get_wishlist(user).await.expect("wishlist view");
    assert_eq!(view.items.len(), 1);
}

#[tokio::test]
async fn unknown_products_cannot_be_wishlisted() {
    let app = TestApp::new().await;
    let wishlist = app.state.services.wishlist.clone();

    assert!(matches!(
        wishlist.add_to_wishlist(app.user_id(), Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn remove_checks_ownership() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;
    let wishlist = app.state.services.wishlist.clone();
    let owner = app.user_id();
    let stranger = Uuid::new_v4();

    let added = wishlist
        .add_to_wishlist(owner, product.id)
        .await
        .expect("add");

    assert!(matches!(
        wishlist.remove_from_wishlist(stranger, added.item.id).await,
        Err(ServiceError::NotFound(_))
    ));

    wishlist
        .remove_from_wishlist(owner, added.item.id)
        .await
        .expect("owner removes");

    let view = wishlist.get_wishlist(owner).await.expect("wishlist view");
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn is_in_wishlist_reflects_membership() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;
    let wishlist = app.state.services.wishlist.clone();
    let user = app.user_id();

    // No wishlist row yet.
    assert!(!wishlist
        .is_in_wishlist(user, product.id)
        .await
        .expect("membership check"));

    wishlist.add_to_wishlist(user, product.id).await.expect("add");
    assert!(wishlist
        .is_in_wishlist(user, product.id)
        .await
        .expect("membership check"));
}
