use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use reqwest::Client;
use sf_common::Money;
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

use crate::{
    api::{endpoint, http_client, rest_query},
    config::StripeConfig,
    data_objects::{StripeCheckoutSession, StripeRefund},
    GatewayApiError,
};

/// Takes payments through Stripe Checkout.
#[derive(Clone)]
pub struct StripeProcessor {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeProcessor {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentProcessorError> {
        if config.secret_key.is_unset() {
            return Err(PaymentProcessorError::Configuration("Stripe secret key is empty".into()));
        }
        let client = http_client()?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn from_env() -> Result<Self, PaymentProcessorError> {
        Self::new(StripeConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.config.api_url, path)
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, GatewayApiError> {
        let req = self.client.post(self.url(path)).basic_auth(self.config.secret_key.reveal(), Option::<&str>::None);
        rest_query(req.form(params)).await
    }

    pub async fn fetch_session(&self, session_id: &str) -> Result<StripeCheckoutSession, GatewayApiError> {
        let path = format!("/v1/checkout/sessions/{session_id}");
        let req = self.client.get(self.url(&path)).basic_auth(self.config.secret_key.reveal(), Option::<&str>::None);
        rest_query(req).await
    }
}

/// The form parameters for a Checkout Session with a single inline-priced line item.
pub fn checkout_session_params(options: &CheckoutOptions) -> Vec<(String, String)> {
    let mode = if options.recurring.is_some() { "subscription" } else { "payment" };
    let mut params = vec![
        ("mode".to_string(), mode.to_string()),
        ("success_url".to_string(), options.success_url.clone()),
        ("cancel_url".to_string(), options.cancel_url.clone()),
        ("client_reference_id".to_string(), options.order_number.clone()),
        ("customer_email".to_string(), options.customer_email.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("line_items[0][price_data][currency]".to_string(), options.currency.to_ascii_lowercase()),
        ("line_items[0][price_data][unit_amount]".to_string(), options.amount.value().to_string()),
        ("line_items[0][price_data][product_data][name]".to_string(), options.product_name.clone()),
        ("metadata[product_id]".to_string(), options.product_id.clone()),
        ("metadata[order_number]".to_string(), options.order_number.clone()),
    ];
    if let Some(interval) = options.recurring {
        params.push(("line_items[0][price_data][recurring][interval]".to_string(), interval.as_str().to_string()));
        params.push(("subscription_data[metadata][product_id]".to_string(), options.product_id.clone()));
    }
    params
}

/// Interprets a retrieved Checkout Session.
pub fn verification_from_session(session: &StripeCheckoutSession) -> PaymentVerification {
    if !session.is_paid() {
        return PaymentVerification::failed(format!(
            "Stripe session {} is not paid (payment status: {})",
            session.id, session.payment_status
        ));
    }
    let product_id = session.metadata.get("product_id").cloned();
    let verification = match session.payment_intent.clone() {
        Some(reference) => PaymentVerification::paid(product_id, reference),
        None => PaymentVerification { success: true, product_id, ..Default::default() },
    };
    if session.is_subscription() {
        verification.with_subscription(session.subscription.clone())
    } else {
        verification
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Stripe
    }

    async fn create_checkout_session(&self, options: &CheckoutOptions) -> Result<PaymentSession, PaymentProcessorError> {
        let params = checkout_session_params(options);
        let session = self.post_form::<StripeCheckoutSession>("/v1/checkout/sessions", &params).await?;
        let checkout_url = session.url.clone().ok_or(GatewayApiError::MissingField("url"))?;
        debug!("💳️ Stripe session {} opened for order {}", session.id, options.order_number);
        Ok(PaymentSession { session_id: session.id, checkout_url })
    }

    async fn verify_payment(&self, session_id: &str) -> PaymentVerification {
        match self.fetch_session(session_id).await {
            Ok(session) => verification_from_session(&session),
            Err(e) => {
                warn!("💳️ Could not retrieve Stripe session {session_id}. {e}");
                PaymentVerification::failed(e.to_string())
            },
        }
    }

    async fn refund(&self, payment_reference: &str, amount: Money) -> Result<RefundOutcome, PaymentProcessorError> {
        let params = vec![
            ("payment_intent".to_string(), payment_reference.to_string()),
            ("amount".to_string(), amount.value().to_string()),
        ];
        let refund = self.post_form::<StripeRefund>("/v1/refunds", &params).await?;
        info!("💳️ Stripe refund {} for {payment_reference} is {}", refund.id, refund.status);
        Ok(RefundOutcome::Refunded { refund_id: refund.id })
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use storefront_engine::processors::RecurringInterval;

    use super::*;

    fn options() -> CheckoutOptions {
        CheckoutOptions {
            order_number: "SF-1".into(),
            product_id: "course-1".into(),
            product_name: "Rust course".into(),
            amount: Money::from(4900),
            currency: "EUR".into(),
            customer_email: "anna@example.com".into(),
            success_url: "https://shop.example/ok".into(),
            cancel_url: "https://shop.example/cancel".into(),
            recurring: None,
        }
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn one_off_payments() {
        let params = checkout_session_params(&options());
        assert_eq!(param(&params, "mode"), Some("payment"));
        assert_eq!(param(&params, "line_items[0][price_data][unit_amount]"), Some("4900"));
        assert_eq!(param(&params, "line_items[0][price_data][currency]"), Some("eur"));
        assert_eq!(param(&params, "metadata[product_id]"), Some("course-1"));
        assert!(param(&params, "line_items[0][price_data][recurring][interval]").is_none());
    }

    #[test]
    fn subscriptions() {
        let opts = CheckoutOptions { recurring: Some(RecurringInterval::Month), ..options() };
        let params = checkout_session_params(&opts);
        assert_eq!(param(&params, "mode"), Some("subscription"));
        assert_eq!(param(&params, "line_items[0][price_data][recurring][interval]"), Some("month"));
    }

    #[test]
    fn verification() {
        let mut metadata = HashMap::new();
        metadata.insert("product_id".to_string(), "course-1".to_string());
        let mut session = StripeCheckoutSession {
            id: "cs_1".into(),
            mode: "payment".into(),
            payment_status: "unpaid".into(),
            payment_intent: Some("pi_1".into()),
            metadata,
            ..Default::default()
        };
        let v = verification_from_session(&session);
        assert!(!v.success);
        assert!(v.error.unwrap().contains("cs_1"));

        session.payment_status = "paid".into();
        let v = verification_from_session(&session);
        assert!(v.success);
        assert_eq!(v.product_id.as_deref(), Some("course-1"));
        assert_eq!(v.payment_reference.as_deref(), Some("pi_1"));
        assert!(!v.is_subscription);

        session.mode = "subscription".into();
        session.payment_status = "no_payment_required".into();
        session.payment_intent = None;
        session.subscription = Some("sub_1".into());
        let v = verification_from_session(&session);
        assert!(v.success);
        assert!(v.is_subscription);
        assert_eq!(v.subscription_id.as_deref(), Some("sub_1"));
        assert!(v.payment_reference.is_none());
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = StripeProcessor::new(StripeConfig::default()).err().unwrap();
        assert!(matches!(err, PaymentProcessorError::Configuration(_)));
    }
}
