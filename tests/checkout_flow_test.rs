mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn shipping_body(payment_intent_id: &str) -> serde_json::Value {
    json!({
        "payment_intent_id": payment_intent_id,
        "full_name": "Jordan Doe",
        "email": "jordan@example.com",
        "address": "1 Main St",
        "city": "Springfield",
        "state": "IL",
        "zip_code": "62701",
        "phone": "+1 555 0100"
    })
}

#[tokio::test]
async fn protected_routes_reject_anonymous_callers() {
    let app = TestApp::new().await;

    for uri in ["/cart", "/wishlist", "/checkout", "/orders"] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {}", uri);
    }

    let response = app
        .request(Method::GET, "/cart", None, Some("garbage-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn browsing_is_open_to_everyone() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    app.seed_product_full(cat.id, "Novel", "novel", dec!(12.50), 5, true)
        .await;

    let home = app.request(Method::GET, "/", None, None).await;
    let body = assert_status(home, StatusCode::OK).await;
    assert_eq!(body["featured_products"].as_array().unwrap().len(), 1);

    let listing = app
        .request(Method::GET, "/products?category=books", None, None)
        .await;
    let body = assert_status(listing, StatusCode::OK).await;
    assert_eq!(body["products"].as_array().unwrap().len(), 1);

    let detail = app.request(Method::GET, "/products/novel", None, None).await;
    let body = assert_status(detail, StatusCode::OK).await;
    assert_eq!(body["product"]["slug"], "novel");
    assert_eq!(body["in_wishlist"], false);

    let missing = app.request(Method::GET, "/products/nope", None, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cart_endpoints_drive_the_cart() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;

    let add = app
        .request_authenticated(Method::POST, &format!("/cart/add/{}", product.id), None)
        .await;
    let added = assert_status(add, StatusCode::CREATED).await;
    let item_id = added["id"].as_str().expect("item id").to_string();

    let update = app
        .request_authenticated(
            Method::POST,
            &format!("/cart/update/{}", item_id),
            Some(json!({ "action": "increase" })),
        )
        .await;
    let body = assert_status(update, StatusCode::OK).await;
    assert_eq!(body["in_cart"], true);
    assert_eq!(body["item"]["quantity"], 2);

    let cart = app.request_authenticated(Method::GET, "/cart", None).await;
    let body = assert_status(cart, StatusCode::OK).await;
    assert_eq!(body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], "25.00");

    let remove = app
        .request_authenticated(Method::POST, &format!("/cart/remove/{}", item_id), None)
        .await;
    assert_eq!(remove.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn create_intent_calls_the_provider_with_the_cart_total() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(wiremock::matchers::body_string_contains("amount=2500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_flow_123",
            "client_secret": "pi_flow_123_secret"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_payment_base(Some(server.uri())).await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;

    // Empty cart first: no intent gets created.
    let empty = app
        .request_authenticated(Method::POST, "/payment/create-intent", None)
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        let add = app
            .request_authenticated(Method::POST, &format!("/cart/add/{}", product.id), None)
            .await;
        assert_eq!(add.status(), StatusCode::CREATED);
    }

    let checkout = app.request_authenticated(Method::GET, "/checkout", None).await;
    let body = assert_status(checkout, StatusCode::OK).await;
    assert_eq!(body["payment_public_key"], "pk_test_123");
    assert_eq!(body["total"], "25.00");

    let intent = app
        .request_authenticated(Method::POST, "/payment/create-intent", None)
        .await;
    let body = assert_status(intent, StatusCode::OK).await;
    assert_eq!(body["client_secret"], "pi_flow_123_secret");
}

#[tokio::test]
async fn confirmed_payment_places_the_order_end_to_end() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;

    let add = app
        .request_authenticated(Method::POST, &format!("/cart/add/{}", product.id), None)
        .await;
    assert_eq!(add.status(), StatusCode::CREATED);

    let placed = app
        .request_authenticated(
            Method::POST,
            "/payment/success",
            Some(shipping_body("pi_http_123")),
        )
        .await;
    let body = assert_status(placed, StatusCode::CREATED).await;
    let order_id = body["order_id"].as_str().expect("order id").to_string();

    // Replay returns the same order.
    let replay = app
        .request_authenticated(
            Method::POST,
            "/payment/success",
            Some(shipping_body("pi_http_123")),
        )
        .await;
    let body = assert_status(replay, StatusCode::CREATED).await;
    assert_eq!(body["order_id"], order_id.as_str());

    let complete = app
        .request_authenticated(Method::GET, &format!("/order-complete/{}", order_id), None)
        .await;
    let body = assert_status(complete, StatusCode::OK).await;
    assert_eq!(body["order"]["payment_id"], "pi_http_123");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let history = app.request_authenticated(Method::GET, "/orders", None).await;
    let body = assert_status(history, StatusCode::OK).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Another user cannot see the order.
    let stranger = app.issue_token_for(uuid::Uuid::new_v4());
    let foreign = app
        .request(
            Method::GET,
            &format!("/order-complete/{}", order_id),
            None,
            Some(&stranger),
        )
        .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_shipping_details_are_a_bad_request() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;

    let add = app
        .request_authenticated(Method::POST, &format!("/cart/add/{}", product.id), None)
        .await;
    assert_eq!(add.status(), StatusCode::CREATED);

    let mut body = shipping_body("pi_bad");
    body["email"] = json!("not-an-email");
    let response = app
        .request_authenticated(Method::POST, "/payment/success", Some(body))
        .await;
    let body = assert_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn wishlist_endpoints_round_trip() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books", "books").await;
    let product = app.seed_product(cat.id, "Novel", "novel", dec!(12.50), 5).await;

    let add = app
        .request_authenticated(Method::POST, &format!("/wishlist/add/{}", product.id), None)
        .await;
    let body = assert_status(add, StatusCode::CREATED).await;
    assert_eq!(body["created"], true);
    let item_id = body["item"]["id"].as_str().expect("item id").to_string();

    // Second add is a no-op and reports 200.
    let again = app
        .request_authenticated(Method::POST, &format!("/wishlist/add/{}", product.id), None)
        .await;
    let body = assert_status(again, StatusCode::OK).await;
    assert_eq!(body["created"], false);

    // Signed-in product detail reflects membership.
    let detail = app.request_authenticated(Method::GET, "/products/novel", None).await;
    let body = assert_status(detail, StatusCode::OK).await;
    assert_eq!(body["in_wishlist"], true);

    let remove = app
        .request_authenticated(Method::POST, &format!("/wishlist/remove/{}", item_id), None)
        .await;
    assert_eq!(remove.status(), StatusCode::NO_CONTENT);

    let view = app.request_authenticated(Method::GET, "/wishlist", None).await;
    let body = assert_status(view, StatusCode::OK).await;
    assert!(body["items"].as_array().unwrap().is_empty());
}
