use log::*;
use sf_common::{helpers::non_empty_env, Secret};
use storefront_engine::processors::PaymentProcessorError;

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
pub const DEFAULT_PAYPAL_API_URL: &str = "https://api-m.sandbox.paypal.com";

fn required(key: &str) -> Result<String, PaymentProcessorError> {
    non_empty_env(key).ok_or_else(|| PaymentProcessorError::Configuration(format!("{key} is not set")))
}

fn with_default(key: &str, default: &str) -> String {
    non_empty_env(key).unwrap_or_else(|| {
        debug!("🪛️ {key} not set, using {default}");
        default.to_string()
    })
}

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub api_url: String,
}

impl StripeConfig {
    pub fn new<S: Into<String>>(secret_key: S) -> Self {
        Self { secret_key: Secret::new(secret_key.into()), api_url: DEFAULT_STRIPE_API_URL.to_string() }
    }

    /// Reads `SF_STRIPE_SECRET_KEY` and `SF_STRIPE_API_URL`. A missing secret key is a configuration error.
    pub fn from_env() -> Result<Self, PaymentProcessorError> {
        let secret_key = Secret::new(required("SF_STRIPE_SECRET_KEY")?);
        let api_url = with_default("SF_STRIPE_API_URL", DEFAULT_STRIPE_API_URL);
        Ok(Self { secret_key, api_url })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaypalConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub api_url: String,
}

impl PaypalConfig {
    pub fn new<S: Into<String>>(client_id: S, client_secret: S) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret.into()),
            api_url: DEFAULT_PAYPAL_API_URL.to_string(),
        }
    }

    /// Reads `SF_PAYPAL_CLIENT_ID`, `SF_PAYPAL_CLIENT_SECRET` and `SF_PAYPAL_API_URL`. Without an explicit API URL,
    /// the PayPal sandbox is used.
    pub fn from_env() -> Result<Self, PaymentProcessorError> {
        let client_id = required("SF_PAYPAL_CLIENT_ID")?;
        let client_secret = Secret::new(required("SF_PAYPAL_CLIENT_SECRET")?);
        let api_url = non_empty_env("SF_PAYPAL_API_URL").unwrap_or_else(|| {
            warn!("🪛️ SF_PAYPAL_API_URL not set. Payments will go to the PayPal sandbox at {DEFAULT_PAYPAL_API_URL}");
            DEFAULT_PAYPAL_API_URL.to_string()
        });
        Ok(Self { client_id, client_secret, api_url })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MoneroConfig {
    /// The wallet address customers pay into.
    pub address: String,
    /// The page that shows payment instructions to the customer.
    pub payment_page: String,
}

impl MoneroConfig {
    pub fn new<S: Into<String>>(address: S, payment_page: S) -> Self {
        Self { address: address.into(), payment_page: payment_page.into() }
    }

    pub fn from_env() -> Result<Self, PaymentProcessorError> {
        let address = required("SF_MONERO_ADDRESS")?;
        let payment_page = required("SF_MONERO_PAYMENT_PAGE")?;
        Ok(Self { address, payment_page })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_keys_are_configuration_errors() {
        std::env::remove_var("SF_MONERO_ADDRESS");
        std::env::set_var("SF_MONERO_PAYMENT_PAGE", "https://shop.example/pay");
        let err = MoneroConfig::from_env().unwrap_err();
        assert!(matches!(err, PaymentProcessorError::Configuration(msg) if msg.contains("SF_MONERO_ADDRESS")));
    }

    #[test]
    fn stripe_defaults_to_live_api() {
        std::env::set_var("SF_STRIPE_SECRET_KEY", "sk_test_123");
        std::env::remove_var("SF_STRIPE_API_URL");
        let config = StripeConfig::from_env().unwrap();
        assert_eq!(config.api_url, DEFAULT_STRIPE_API_URL);
        assert_eq!(config.secret_key.reveal(), "sk_test_123");
        assert_eq!(format!("{:?}", config.secret_key), "****");
    }
}
