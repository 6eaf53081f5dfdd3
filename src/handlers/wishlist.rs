use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    handlers::common::{no_content_response, success_response},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wishlist))
        .route("/add/:product_id", post(add_to_wishlist))
        .route("/remove/:item_id", post(remove_from_wishlist))
}

/// The caller's wishlist with products.
#[utoipa::path(
    get,
    path = "/wishlist",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wishlist contents"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let wishlist = state.services.wishlist.get_wishlist(user_id).await?;
    Ok(success_response(wishlist))
}

/// Adds a product to the wishlist; repeat adds are no-ops.
#[utoipa::path(
    post,
    path = "/wishlist/add/{product_id}",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Already wishlisted"),
        (status = 201, description = "Added"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let added = state
        .services
        .wishlist
        .add_to_wishlist(user_id, product_id)
        .await?;

    let status = if added.created {
        axum::http::StatusCode::CREATED
    } else {
        axum::http::StatusCode::OK
    };

    Ok((status, axum::Json(added)))
}

/// Removes a wishlist item.
#[utoipa::path(
    post,
    path = "/wishlist/remove/{item_id}",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    params(("item_id" = Uuid, Path, description = "Wishlist item id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Item not found or not yours")
    )
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .wishlist
        .remove_from_wishlist(user_id, item_id)
        .await?;
    Ok(no_content_response())
}
