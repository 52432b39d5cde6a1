use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::*;
use reqwest::Client;
use serde_json::json;
use sf_common::{Money, Secret};
use storefront_engine::{
    db_types::PaymentMethod,
    processors::{
        CheckoutOptions,
        PaymentProcessor,
        PaymentProcessorError,
        PaymentSession,
        PaymentVerification,
        RefundOutcome,
    },
};
use tokio::sync::Mutex;

use crate::{
    api::{endpoint, http_client, rest_query},
    config::PaypalConfig,
    data_objects::{PaypalOrder, PaypalRefund, PaypalToken},
    GatewayApiError,
};

/// Tokens are renewed this many seconds before PayPal says they expire.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    token: Secret<String>,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn from_response(response: PaypalToken, now: DateTime<Utc>) -> Self {
        let expires_at = now + Duration::seconds(response.expires_in - TOKEN_EXPIRY_MARGIN_SECS);
        Self { token: Secret::new(response.access_token), expires_at }
    }

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Takes payments through PayPal Orders v2.
#[derive(Clone)]
pub struct PaypalProcessor {
    config: PaypalConfig,
    client: Arc<Client>,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl PaypalProcessor {
    pub fn new(config: PaypalConfig) -> Result<Self, PaymentProcessorError> {
        if config.client_id.is_empty() || config.client_secret.is_unset() {
            return Err(PaymentProcessorError::Configuration("PayPal client credentials are empty".into()));
        }
        let client = http_client()?;
        Ok(Self { config, client: Arc::new(client), token: Arc::new(Mutex::new(None)) })
    }

    pub fn from_env() -> Result<Self, PaymentProcessorError> {
        Self::new(PaypalConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.config.api_url, path)
    }

    /// Returns a valid OAuth access token, requesting a new one if the cached token is missing or about to expire.
    async fn access_token(&self) -> Result<Secret<String>, GatewayApiError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid_at(now)) {
            return Ok(token.token.clone());
        }
        trace!("💳️ Requesting a new PayPal access token");
        let req = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.config.client_id, Some(self.config.client_secret.reveal()))
            .form(&[("grant_type", "client_credentials")]);
        let response = rest_query::<PaypalToken>(req).await?;
        let token = CachedToken::from_response(response, now);
        debug!("💳️ New PayPal access token valid until {}", token.expires_at);
        let secret = token.token.clone();
        *cached = Some(token);
        Ok(secret)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, GatewayApiError> {
        let token = self.access_token().await?;
        let req = self.client.post(self.url(path)).bearer_auth(token.reveal()).json(body);
        rest_query(req).await
    }

    pub async fn fetch_order(&self, order_id: &str) -> Result<PaypalOrder, GatewayApiError> {
        let token = self.access_token().await?;
        let req = self.client.get(self.url(&format!("/v2/checkout/orders/{order_id}"))).bearer_auth(token.reveal());
        rest_query(req).await
    }

    /// Captures an approved order. An order that was captured before is fetched instead.
    pub async fn capture_order(&self, order_id: &str) -> Result<PaypalOrder, GatewayApiError> {
        let path = format!("/v2/checkout/orders/{order_id}/capture");
        match self.post_json::<PaypalOrder>(&path, &json!({})).await {
            Err(GatewayApiError::QueryError { status: 422, message }) if message.contains("ORDER_ALREADY_CAPTURED") => {
                debug!("💳️ PayPal order {order_id} was already captured");
                self.fetch_order(order_id).await
            },
            result => result,
        }
    }
}

/// The request body for creating a PayPal order.
pub fn order_request(options: &CheckoutOptions) -> serde_json::Value {
    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "reference_id": options.order_number,
            "custom_id": options.product_id,
            "description": options.product_name,
            "amount": {
                "currency_code": options.currency.to_ascii_uppercase(),
                "value": options.amount.to_string(),
            },
        }],
        "application_context": {
            "return_url": options.success_url,
            "cancel_url": options.cancel_url,
            "user_action": "PAY_NOW",
        },
    })
}

/// Interprets a captured (or fetched) PayPal order.
pub fn verification_from_order(order: &PaypalOrder) -> PaymentVerification {
    if order.status != "COMPLETED" {
        return PaymentVerification::failed(format!("PayPal order {} is {}", order.id, order.status));
    }
    match order.completed_capture() {
        Some(capture) => PaymentVerification::paid(order.custom_id(), capture.id.clone()),
        None => PaymentVerification::failed(format!("PayPal order {} has no completed capture", order.id)),
    }
}

#[async_trait]
impl PaymentProcessor for PaypalProcessor {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Paypal
    }

    async fn create_checkout_session(&self, options: &CheckoutOptions) -> Result<PaymentSession, PaymentProcessorError> {
        if options.recurring.is_some() {
            return Err(PaymentProcessorError::UnsupportedMethod("recurring payments via paypal".into()));
        }
        let order = self.post_json::<PaypalOrder>("/v2/checkout/orders", &order_request(options)).await?;
        let checkout_url = order.approval_url().ok_or(GatewayApiError::MissingField("approval link"))?.to_string();
        debug!("💳️ PayPal order {} created for order {}", order.id, options.order_number);
        Ok(PaymentSession { session_id: order.id, checkout_url })
    }

    async fn verify_payment(&self, session_id: &str) -> PaymentVerification {
        match self.capture_order(session_id).await {
            Ok(order) => verification_from_order(&order),
            Err(e) => {
                warn!("💳️ Could not capture PayPal order {session_id}. {e}");
                PaymentVerification::failed(e.to_string())
            },
        }
    }

    /// Refunds the whole capture. PayPal refunds the captured amount when no amount is given, which is always the
    /// order total.
    async fn refund(&self, payment_reference: &str, amount: Money) -> Result<RefundOutcome, PaymentProcessorError> {
        let path = format!("/v2/payments/captures/{payment_reference}/refund");
        let refund = self.post_json::<PaypalRefund>(&path, &json!({})).await?;
        info!("💳️ PayPal refund {} of {amount} for capture {payment_reference} is {}", refund.id, refund.status);
        Ok(RefundOutcome::Refunded { refund_id: refund.id })
    }
}
