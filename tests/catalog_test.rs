mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::errors::ServiceError;
use storefront_api::services::catalog::ProductFilter;

#[tokio::test]
async fn listing_pages_hold_twelve_products() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    for i in 0..15 {
        app.seed_product(cat.id, &format!("Book {i}"), &format!("book-{i}"), dec!(9.99), 5)
            .await;
    }

    let catalog = app.state.services.catalog.clone();

    let first = catalog
        .list_products(ProductFilter {
            page: 1,
            ..Default::default()
        })
        .await
        .expect("first page");
    assert_eq!(first.products.len(), 12);
    assert_eq!(first.total, 15);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.per_page, 12);

    let second = catalog
        .list_products(ProductFilter {
            page: 2,
            ..Default::default()
        })
        .await
        .expect("second page");
    assert_eq!(second.products.len(), 3);
}

#[tokio::test]
async fn category_filter_restricts_listing_and_unknown_slug_is_not_found() {
    let app = TestApp::new().await;
    let books = app.seed_category("Books", "books").await;
    let games = app.seed_category("Games", "games").await;
    app.seed_product(books.id, "Novel", "novel", dec!(12.00), 3).await;
    app.seed_product(games.id, "Chess", "chess", dec!(30.00), 3).await;

    let catalog = app.state.services.catalog.clone();

    let page = catalog
        .list_products(ProductFilter {
            category: Some("books".to_string()),
            page: 1,
            ..Default::default()
        })
        .await
        .expect("filtered page");
    assert_eq!(page.products.len(), 1);
    assert_eq!(page.products[0].slug, "novel");
    assert_eq!(
        page.current_category.as_ref().map(|c| c.slug.as_str()),
        Some("books")
    );

    let missing = catalog
        .list_products(ProductFilter {
            category: Some("does-not-exist".to_string()),
            page: 1,
            ..Default::default()
        })
        .await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn search_is_case_insensitive_and_covers_category_names() {
    let app = TestApp::new().await;
    let books = app.seed_category("Science Fiction", "sci-fi").await;
    let games = app.seed_category("Games", "games").await;
    app.seed_product(books.id, "Dune", "dune", dec!(15.00), 3).await;
    app.seed_product(games.id, "Chess Set", "chess-set", dec!(30.00), 3)
        .await;

    let catalog = app.state.services.catalog.clone();

    // Product name, different case.
    let by_name = catalog
        .list_products(ProductFilter {
            q: Some("dUnE".to_string()),
            page: 1,
            ..Default::default()
        })
        .await
        .expect("search by name");
    assert_eq!(by_name.products.len(), 1);
    assert_eq!(by_name.products[0].slug, "dune");

    // Category name matches pull in that category's products.
    let by_category_name = catalog
        .list_products(ProductFilter {
            q: Some("science".to_string()),
            page: 1,
            ..Default::default()
        })
        .await
        .expect("search by category name");
    assert_eq!(by_category_name.products.len(), 1);
    assert_eq!(by_category_name.products[0].slug, "dune");

    // Product description matches too (seeded as "<name> description").
    let by_description = catalog
        .list_products(ProductFilter {
            q: Some("SET DESCRIPTION".to_string()),
            page: 1,
            ..Default::default()
        })
        .await
        .expect("search by description");
    assert_eq!(by_description.products.len(), 1);

    let none = catalog
        .list_products(ProductFilter {
            q: Some("zzz-no-such-product".to_string()),
            page: 1,
            ..Default::default()
        })
        .await
        .expect("empty search result");
    assert!(none.products.is_empty());
    assert_eq!(none.total, 0);
}

#[tokio::test]
async fn product_detail_includes_up_to_four_related_products() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let main = app.seed_product(cat.id, "Main", "main", dec!(10.00), 3).await;
    for i in 0..6 {
        app.seed_product(cat.id, &format!("Other {i}"), &format!("other-{i}"), dec!(8.00), 3)
            .await;
    }

    let detail = app
        .state
        .services
        .catalog
        .get_product_by_slug("main")
        .await
        .expect("product detail");

    assert_eq!(detail.product.id, main.id);
    assert_eq!(detail.category.id, cat.id);
    assert_eq!(detail.related_products.len(), 4);
    assert!(detail.related_products.iter().all(|p| p.id != main.id));

    let missing = app
        .state
        .services
        .catalog
        .get_product_by_slug("nope")
        .await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn home_page_limits_featured_products_and_categories() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    for i in 0..8 {
        app.seed_product_full(
            cat.id,
            &format!("Feat {i}"),
            &format!("feat-{i}"),
            dec!(5.00),
            3,
            true,
        )
        .await;
    }
    app.seed_product(cat.id, "Plain", "plain", dec!(5.00), 3).await;

    let home = app
        .state
        .services
        .catalog
        .home_page()
        .await
        .expect("home page");

    assert_eq!(home.featured_products.len(), 6);
    assert!(home.featured_products.iter().all(|p| p.featured));
    assert_eq!(home.categories.len(), 1);
}
