use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Money, PaymentMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Day,
    Week,
    Month,
    Year,
}

impl RecurringInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringInterval::Day => "day",
            RecurringInterval::Week => "week",
            RecurringInterval::Month => "month",
            RecurringInterval::Year => "year",
        }
    }
}

/// Everything a gateway needs to open a checkout session for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    pub order_number: String,
    /// The main product of the order. It is carried through the gateway and handed back on verification.
    pub product_id: String,
    pub product_name: String,
    /// The amount to charge, in minor units.
    pub amount: Money,
    pub currency: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    /// When set, the customer is signed up for a recurring charge rather than a one-off payment.
    pub recurring: Option<RecurringInterval>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub session_id: String,
    /// Where to send the customer to complete the payment.
    pub checkout_url: String,
}

/// The outcome of asking a gateway whether a checkout session has been paid.
///
/// Verification never fails with an error. Gateway problems are reported as an unsuccessful verification with the
/// reason in `error`, so callers always have a value to branch on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub success: bool,
    pub product_id: Option<String>,
    pub is_subscription: bool,
    pub subscription_id: Option<String>,
    /// The gateway's reference for the settled payment. Refunds are issued against it.
    pub payment_reference: Option<String>,
    pub error: Option<String>,
}

impl PaymentVerification {
    pub fn paid<S: Into<String>>(product_id: Option<String>, payment_reference: S) -> Self {
        Self {
            success: true,
            product_id,
            payment_reference: Some(payment_reference.into()),
            ..Default::default()
        }
    }

    pub fn failed<S: Into<String>>(reason: S) -> Self {
        Self { success: false, error: Some(reason.into()), ..Default::default() }
    }

    pub fn with_subscription(mut self, subscription_id: Option<String>) -> Self {
        self.is_subscription = true;
        self.subscription_id = subscription_id;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RefundOutcome {
    /// The gateway accepted the refund.
    Refunded { refund_id: String },
    /// The gateway cannot refund automatically. Someone has to return the funds by hand.
    ManualActionRequired { reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum PaymentProcessorError {
    #[error("Payment processor is misconfigured: {0}")]
    Configuration(String),
    #[error("Payment method {0} is not supported")]
    UnsupportedMethod(String),
    #[error("The payment gateway rejected the request: {0}")]
    GatewayError(String),
    #[error("Could not reach the payment gateway: {0}")]
    NetworkError(String),
    #[error("The payment gateway sent an unexpected response: {0}")]
    InvalidResponse(String),
}

/// The behaviour every payment gateway integration provides.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    fn method(&self) -> PaymentMethod;

    /// Opens a checkout session with the gateway.
    async fn create_checkout_session(&self, options: &CheckoutOptions) -> Result<PaymentSession, PaymentProcessorError>;

    /// Asks the gateway whether the session has been paid.
    async fn verify_payment(&self, session_id: &str) -> PaymentVerification;

    /// Returns `amount` of the payment identified by `payment_reference` to the customer.
    async fn refund(&self, payment_reference: &str, amount: Money) -> Result<RefundOutcome, PaymentProcessorError>;
}
