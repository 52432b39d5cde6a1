use async_trait::async_trait;
use log::*;
use reqwest::Url;
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

use crate::config::MoneroConfig;

/// Monero payments are settled by hand. The customer is shown the wallet address and a payment id, and the shop owner
/// confirms receipt in the admin area by completing the order.
#[derive(Debug, Clone)]
pub struct MoneroProcessor {
    config: MoneroConfig,
}

impl MoneroProcessor {
    pub fn new(config: MoneroConfig) -> Result<Self, PaymentProcessorError> {
        if config.address.is_empty() {
            return Err(PaymentProcessorError::Configuration("Monero wallet address is empty".into()));
        }
        Url::parse(&config.payment_page).map_err(|e| {
            PaymentProcessorError::Configuration(format!("Invalid Monero payment page '{}': {e}", config.payment_page))
        })?;
        Ok(Self { config })
    }

    pub fn from_env() -> Result<Self, PaymentProcessorError> {
        Self::new(MoneroConfig::from_env()?)
    }

    fn checkout_url(&self, payment_id: &str, options: &CheckoutOptions) -> Result<String, PaymentProcessorError> {
        let amount = options.amount.to_string();
        let params = [
            ("payment_id", payment_id),
            ("amount", amount.as_str()),
            ("currency", options.currency.as_str()),
            ("address", self.config.address.as_str()),
        ];
        let url = Url::parse_with_params(&self.config.payment_page, &params)
            .map_err(|e| PaymentProcessorError::Configuration(e.to_string()))?;
        Ok(url.to_string())
    }
}

/// 16 random bytes, hex encoded.
pub fn new_payment_id() -> String {
    rand::random::<[u8; 16]>().iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl PaymentProcessor for MoneroProcessor {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Monero
    }

    async fn create_checkout_session(&self, options: &CheckoutOptions) -> Result<PaymentSession, PaymentProcessorError> {
        if options.recurring.is_some() {
            return Err(PaymentProcessorError::UnsupportedMethod("recurring payments via monero".into()));
        }
        let payment_id = new_payment_id();
        let checkout_url = self.checkout_url(&payment_id, options)?;
        debug!("💳️ Monero payment id {payment_id} issued for order {}", options.order_number);
        Ok(PaymentSession { session_id: payment_id, checkout_url })
    }

    async fn verify_payment(&self, session_id: &str) -> PaymentVerification {
        PaymentVerification::failed(format!(
            "Monero payment {session_id} is awaiting manual confirmation by the shop owner"
        ))
    }

    async fn refund(&self, payment_reference: &str, amount: Money) -> Result<RefundOutcome, PaymentProcessorError> {
        warn!("💳️ Monero payment {payment_reference} must be refunded by hand ({amount})");
        Ok(RefundOutcome::ManualActionRequired {
            reason: format!("Monero refunds are manual. Return {amount} for payment {payment_reference} from the wallet."),
        })
    }
}
