//! Payment-intent creation against the external card gateway.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Deserialize;

use bookstore_kernel::settings::PaymentSettings;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent and return its client secret
    async fn create_intent(&self, amount_minor: i64, currency: &str) -> anyhow::Result<String>;
}

/// Convert a decimal price into integer minor units (cents).
///
/// `None` for prices that are not finite or not positive.
pub fn to_minor_units(price: f64) -> Option<i64> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let cents = (price * 100.0).round();
    (cents >= 1.0 && cents <= i64::MAX as f64).then_some(cents as i64)
}

/// Stripe `payment_intents` client
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: GatewayError,
}

#[derive(Debug, Deserialize)]
struct GatewayError {
    message: Option<String>,
}

impl StripeGateway {
    pub fn from_settings(settings: &PaymentSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("failed to build payment gateway client")?;

        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            secret_key: settings.secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, amount_minor: i64, currency: &str) -> anyhow::Result<String> {
        let amount = amount_minor.to_string();
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("payment_method_types[]", "card"),
            ])
            .send()
            .await
            .context("payment gateway request failed")?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<GatewayErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| "no error message".to_string());
            return Err(anyhow!("payment gateway returned {status}: {message}"));
        }

        let intent: IntentResponse = response
            .json()
            .await
            .context("payment gateway returned an unexpected body")?;

        tracing::info!(amount_minor, currency, "payment intent created");
        Ok(intent.client_secret)
    }
}
