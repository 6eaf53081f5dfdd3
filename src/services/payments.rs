use crate::{config::AppConfig, errors::ServiceError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

/// A created payment intent. Only the fields the storefront needs are
/// deserialized; the provider returns many more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct PaymentGatewayConfig {
    pub secret_key: String,
    pub public_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl From<&AppConfig> for PaymentGatewayConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            secret_key: cfg.payment_secret_key.clone(),
            public_key: cfg.payment_public_key.clone(),
            api_base: cfg.payment_api_base.clone(),
            timeout: Duration::from_secs(cfg.payment_timeout_secs),
        }
    }
}

/// HTTP client for the payment provider. Creates payment intents; charge
/// capture and confirmation happen on the client side against the provider
/// directly, the backend only learns the resulting intent id.
#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    config: PaymentGatewayConfig,
}

impl PaymentGateway {
    pub fn new(config: PaymentGatewayConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build payment client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// The publishable key the frontend needs to collect card details.
    pub fn public_key(&self) -> &str {
        &self.config.public_key
    }

    /// Creates a payment intent for the given amount. The amount is converted
    /// to minor units (cents) before it is sent.
    #[instrument(skip(self))]
    pub async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
        user_id: Uuid,
    ) -> Result<PaymentIntent, ServiceError> {
        let amount_minor = to_minor_units(amount)?;

        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!(
                    "payment provider unreachable: {}",
                    e
                ))
            })?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!(
                "payment provider returned invalid body: {}",
                e
            ))
        })?;

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("payment provider rejected the request");
            return Err(ServiceError::PaymentFailed(message.to_string()));
        }

        serde_json::from_value(body).map_err(|e| {
            ServiceError::ExternalServiceError(format!(
                "payment provider response missing fields: {}",
                e
            ))
        })
    }
}

/// Converts a decimal currency amount to integer minor units (cents).
/// Fractions below one cent are truncated. Negative amounts are rejected.
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    if amount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "amount must not be negative".to_string(),
        ));
    }

    (amount * Decimal::from(100))
        .trunc()
        .to_i64()
        .ok_or_else(|| ServiceError::ValidationError("amount out of range".to_string()))
}
