//! # Gateway clients
//!
//! Concrete [`PaymentProcessor`](storefront_engine::processors::PaymentProcessor) implementations for the payment
//! gateways the storefront supports:
//! * [`StripeProcessor`] talks to Stripe Checkout.
//! * [`PaypalProcessor`] talks to PayPal Orders v2.
//! * [`MoneroProcessor`] issues payment ids for manually settled Monero payments.
//!
//! Each processor reads its credentials from the environment when built through `from_env`.
//! [`register_default_processors`] registers all three with a
//! [`ProcessorRegistry`](storefront_engine::processors::ProcessorRegistry), so that each is only constructed (and
//! its configuration only checked) the first time it is used.
mod api;
mod config;
mod error;
mod monero;
mod paypal;
mod stripe;

pub mod data_objects;

use std::sync::Arc;

pub use config::{MoneroConfig, PaypalConfig, StripeConfig, DEFAULT_PAYPAL_API_URL, DEFAULT_STRIPE_API_URL};
pub use error::GatewayApiError;
pub use monero::{new_payment_id, MoneroProcessor};
pub use paypal::{order_request, verification_from_order, PaypalProcessor};
pub use stripe::{checkout_session_params, verification_from_session, StripeProcessor};
use storefront_engine::{
    db_types::PaymentMethod,
    processors::{PaymentProcessor, ProcessorRegistry},
};

/// Registers env-configured factories for Stripe, PayPal and Monero.
pub fn register_default_processors(registry: &mut ProcessorRegistry) {
    registry
        .register_factory(PaymentMethod::Stripe, || Ok(Arc::new(StripeProcessor::from_env()?) as Arc<dyn PaymentProcessor>))
        .register_factory(PaymentMethod::Paypal, || Ok(Arc::new(PaypalProcessor::from_env()?) as Arc<dyn PaymentProcessor>))
        .register_factory(PaymentMethod::Monero, || Ok(Arc::new(MoneroProcessor::from_env()?) as Arc<dyn PaymentProcessor>));
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_processors_are_supported() {
        let mut registry = ProcessorRegistry::new();
        register_default_processors(&mut registry);
        for method in PaymentMethod::ALL {
            assert!(registry.supports(method));
        }
    }
}
