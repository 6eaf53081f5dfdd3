use crate::{
    auth::AuthenticatedUser, errors::ServiceError, handlers::common::success_response, AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:order_id", get(get_order))
}

/// The caller's order history, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orders, newest first"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.list_orders(user_id).await?;
    Ok(success_response(orders))
}

/// One order with its items.
#[utoipa::path(
    get,
    path = "/orders/{order_id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items"),
        (status = 404, description = "Order not found or not yours")
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.get_order(user_id, order_id).await?;
    Ok(success_response(order))
}
