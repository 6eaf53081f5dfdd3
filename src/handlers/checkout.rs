use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    events::Event,
    handlers::common::{created_response, success_response, validate_input},
    services::cart::CartView,
    services::orders::ShippingDetails,
    services::payments::to_minor_units,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(checkout))
        .route("/payment/create-intent", post(create_payment_intent))
        .route("/payment/success", post(payment_success))
        .route("/order-complete/:order_id", get(order_complete))
}

/// Checkout summary: cart contents plus the publishable payment key the
/// frontend needs to collect card details.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    #[serde(flatten)]
    pub cart: CartView,
    pub payment_public_key: String,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

/// Confirmed-payment order placement request.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct PaymentSuccessRequest {
    #[validate(length(min = 1))]
    pub payment_intent_id: String,
    #[validate]
    #[serde(flatten)]
    pub shipping: ShippingDetails,
}

#[derive(Debug, Serialize)]
pub struct PaymentSuccessResponse {
    pub order_id: Uuid,
}

/// Checkout page data for the signed-in user.
#[utoipa::path(
    get,
    path = "/checkout",
    tag = "checkout",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart summary and publishable key"),
        (status = 400, description = "Cart is empty"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.cart.get_cart(user_id).await?;
    if cart.is_empty() {
        return Err(ServiceError::EmptyCart);
    }
    Ok(success_response(CheckoutView {
        cart,
        payment_public_key: state.services.payments.public_key().to_string(),
    }))
}

/// Creates a payment intent for the caller's current cart total and returns
/// its client secret.
#[utoipa::path(
    post,
    path = "/payment/create-intent",
    tag = "checkout",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Client secret for the new intent"),
        (status = 400, description = "Cart is empty"),
        (status = 402, description = "Payment provider rejected the request"),
        (status = 502, description = "Payment provider unreachable")
    )
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.cart.get_cart(user_id).await?;
    if cart.is_empty() {
        return Err(ServiceError::EmptyCart);
    }

    let currency = state.config.currency.clone();
    let intent = state
        .services
        .payments
        .create_payment_intent(cart.total, &currency, user_id)
        .await?;

    state
        .event_sender
        .send_or_log(Event::PaymentIntentCreated {
            user_id,
            amount_minor: to_minor_units(cart.total)?,
            currency,
        })
        .await;

    Ok(success_response(CreateIntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// Places the order once the frontend reports a confirmed payment.
#[utoipa::path(
    post,
    path = "/payment/success",
    tag = "checkout",
    security(("bearer_auth" = [])),
    request_body = PaymentSuccessRequest,
    responses(
        (status = 201, description = "Order placed (or already placed for this payment)"),
        (status = 400, description = "Cart is empty or details invalid"),
        (status = 409, description = "Payment id belongs to another order"),
        (status = 422, description = "Insufficient stock")
    )
)]
pub async fn payment_success(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(body): Json<PaymentSuccessRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&body)?;

    let order = state
        .services
        .orders
        .place_order(user_id, &body.payment_intent_id, body.shipping)
        .await?;

    Ok(created_response(PaymentSuccessResponse {
        order_id: order.id,
    }))
}

/// Order confirmation: the placed order with its items.
#[utoipa::path(
    get,
    path = "/order-complete/{order_id}",
    tag = "checkout",
    security(("bearer_auth" = [])),
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items"),
        (status = 404, description = "Order not found or not yours")
    )
)]
pub async fn order_complete(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.get_order(user_id, order_id).await?;
    Ok(success_response(order))
}
