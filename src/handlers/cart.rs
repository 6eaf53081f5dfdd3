use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    handlers::common::{no_content_response, success_response},
    services::cart::CartAction,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add/:product_id", post(add_to_cart))
        .route("/update/:item_id", post(update_cart_item))
        .route("/remove/:item_id", post(remove_from_cart))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCartRequest {
    pub action: CartAction,
}

/// The caller's cart with line and grand totals.
#[utoipa::path(
    get,
    path = "/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart contents"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_cart(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.cart.get_cart(user_id).await?;
    Ok(success_response(cart))
}

/// Adds one unit of a product to the cart.
#[utoipa::path(
    post,
    path = "/cart/add/{product_id}",
    tag = "cart",
    security(("bearer_auth" = [])),
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 201, description = "Line created or quantity bumped"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.cart.add_to_cart(user_id, product_id).await?;
    Ok((axum::http::StatusCode::CREATED, Json(item)))
}

/// Increases or decreases a cart line's quantity.
#[utoipa::path(
    post,
    path = "/cart/update/{item_id}",
    tag = "cart",
    security(("bearer_auth" = [])),
    params(("item_id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Line updated or removed"),
        (status = 404, description = "Cart item not found or not yours")
    )
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(item_id): Path<Uuid>,
    Json(body): Json<UpdateCartRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .cart
        .update_quantity(user_id, item_id, body.action)
        .await?;

    Ok(success_response(serde_json::json!({
        "in_cart": updated.is_some(),
        "item": updated,
    })))
}

/// Removes a cart line entirely.
#[utoipa::path(
    post,
    path = "/cart/remove/{item_id}",
    tag = "cart",
    security(("bearer_auth" = [])),
    params(("item_id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Cart item not found or not yours")
    )
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.cart.remove_from_cart(user_id, item_id).await?;
    Ok(no_content_response())
}
