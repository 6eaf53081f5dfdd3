use crate::{
    auth::MaybeAuthenticatedUser,
    errors::ServiceError,
    handlers::common::success_response,
    services::catalog::{ProductDetail, ProductFilter},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:slug", get(get_product))
}

pub fn categories_routes() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

/// Query string accepted by the product listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListParams {
    /// Restrict to one category by slug
    pub category: Option<String>,
    /// Case-insensitive search over product and category text
    pub q: Option<String>,
    /// 1-based page number
    pub page: Option<u64>,
}

impl From<ProductListParams> for ProductFilter {
    fn from(params: ProductListParams) -> Self {
        ProductFilter {
            category: params.category,
            q: params.q,
            page: params.page.unwrap_or(1),
        }
    }
}

/// Product detail plus the caller-specific wishlist flag.
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub detail: ProductDetail,
    pub in_wishlist: bool,
}

/// Home page: featured products and categories.
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Featured products and categories")
    )
)]
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.catalog.home_page().await?;
    Ok(success_response(page))
}

/// Paginated product listing with optional category and search filters.
#[utoipa::path(
    get,
    path = "/products",
    tag = "catalog",
    params(ProductListParams),
    responses(
        (status = 200, description = "One page of products"),
        (status = 404, description = "Unknown category slug")
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.catalog.list_products(params.into()).await?;
    Ok(success_response(page))
}

/// Product detail by slug, with related products and (for signed-in callers)
/// whether it is on their wishlist.
#[utoipa::path(
    get,
    path = "/products/{slug}",
    tag = "catalog",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product detail"),
        (status = 404, description = "Unknown product slug")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    MaybeAuthenticatedUser(user): MaybeAuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.catalog.get_product_by_slug(&slug).await?;

    let in_wishlist = match user {
        Some(user_id) => {
            state
                .services
                .wishlist
                .is_in_wishlist(user_id, detail.product.id)
                .await?
        }
        None => false,
    };

    Ok(success_response(ProductDetailResponse {
        detail,
        in_wishlist,
    }))
}

/// All categories.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    responses(
        (status = 200, description = "All categories")
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(categories))
}
