use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use storefront_api::{
    auth::AuthService,
    config::AppConfig,
    db,
    entities::{category, product, CategoryModel, ProductModel},
    events::{self, EventSender},
    handlers::AppServices,
    services::{payments::PaymentGatewayConfig, PaymentGateway},
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_32ch";

/// Test harness: full application state over a fresh in-memory SQLite
/// database, plus a signed-in default user.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    user_id: Uuid,
    token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_payment_base(None).await
    }

    /// Builds the app with the payment provider pointed at a custom base URL
    /// (a wiremock server in practice).
    pub async fn with_payment_base(payment_api_base: Option<String>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "sk_test_123".to_string(),
            "pk_test_123".to_string(),
        );
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        if let Some(base) = payment_api_base {
            cfg.payment_api_base = base;
        }

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(&cfg.jwt_secret, cfg.jwt_expiration_secs));
        let payments = PaymentGateway::new(PaymentGatewayConfig::from(&cfg))
            .expect("failed to build payment gateway for tests");
        let services = AppServices::new(db_arc.clone(), event_sender.clone(), payments);

        let user_id = Uuid::new_v4();
        let token = auth.issue_token(user_id).expect("issue test token");

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            auth,
        };

        let router = storefront_api::app_router(state.clone());

        Self {
            router,
            state,
            user_id,
            token,
            _event_task: event_task,
        }
    }

    /// The default signed-in user.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Bearer token for the default user.
    #[allow(dead_code)]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Token for some other user, e.g. for ownership checks.
    #[allow(dead_code)]
    pub fn issue_token_for(&self, user_id: Uuid) -> String {
        self.state
            .auth
            .issue_token(user_id)
            .expect("issue test token")
    }

    #[allow(dead_code)]
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    #[allow(dead_code)]
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(&self.token)).await
    }

    pub async fn seed_category(&self, name: &str, slug: &str) -> CategoryModel {
        category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            description: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed category")
    }

    pub async fn seed_product(
        &self,
        category_id: Uuid,
        name: &str,
        slug: &str,
        price: Decimal,
        stock: i32,
    ) -> ProductModel {
        self.seed_product_full(category_id, name, slug, price, stock, false)
            .await
    }

    pub async fn seed_product_full(
        &self,
        category_id: Uuid,
        name: &str,
        slug: &str,
        price: Decimal,
        stock: i32,
        featured: bool,
    ) -> ProductModel {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            category_id: Set(category_id),
            description: Set(format!("{} description", name)),
            price: Set(price),
            stock: Set(stock),
            available: Set(true),
            featured: Set(featured),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads a response body as JSON.
#[allow(dead_code)]
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body should be json")
}

/// Asserts a status code with the body in the failure message.
#[allow(dead_code)]
pub async fn assert_status(response: axum::response::Response, expected: StatusCode) -> Value {
    let status = response.status();
    let body = response_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {}", body);
    body
}
