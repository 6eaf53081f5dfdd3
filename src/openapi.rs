use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = "E-commerce storefront backend: catalog, cart, wishlist, checkout and orders"
    ),
    modifiers(&BearerAuth),
    paths(
        crate::handlers::catalog::home,
        crate::handlers::catalog::list_products,
        crate::handlers::catalog::get_product,
        crate::handlers::catalog::list_categories,
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_to_cart,
        crate::handlers::cart::update_cart_item,
        crate::handlers::cart::remove_from_cart,
        crate::handlers::wishlist::get_wishlist,
        crate::handlers::wishlist::add_to_wishlist,
        crate::handlers::wishlist::remove_from_wishlist,
        crate::handlers::checkout::checkout,
        crate::handlers::checkout::create_payment_intent,
        crate::handlers::checkout::payment_success,
        crate::handlers::checkout::order_complete,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::cart::CartAction,
        crate::services::orders::ShippingDetails,
        crate::handlers::cart::UpdateCartRequest,
        crate::handlers::checkout::PaymentSuccessRequest,
    )),
    tags(
        (name = "catalog", description = "Browsing: home page, products, categories"),
        (name = "cart", description = "Per-user shopping cart"),
        (name = "wishlist", description = "Per-user wishlist"),
        (name = "checkout", description = "Payment intents and order placement"),
        (name = "orders", description = "Order history")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
