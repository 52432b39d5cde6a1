use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use sf_common::{helpers::non_empty_env, Secret};

const DEFAULT_SF_HOST: &str = "127.0.0.1";
const DEFAULT_SF_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8480";
const DEFAULT_EMAIL_FROM: &str = "Storefront <shop@example.com>";
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("{other} is not a valid environment")),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EmailConfig {
    /// The sender of every email, e.g. `Shop <shop@example.com>`
    pub from: String,
    /// Outside production, all email is sent here instead of to the customer.
    pub dev_email: Option<String>,
    /// Email is only logged when no Resend key is configured.
    pub resend_api_key: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub environment: Environment,
    /// Requests to `/api` must carry this value in the `sf_admin_key` header.
    pub admin_api_key: Secret<String>,
    /// The public base URL of the shop. Used for links in emails.
    pub public_url: String,
    pub email: EmailConfig,
    /// How often the subscription expiry worker runs.
    pub subscription_sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SF_HOST.to_string(),
            port: DEFAULT_SF_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            environment: Environment::default(),
            admin_api_key: Secret::default(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            email: EmailConfig { from: DEFAULT_EMAIL_FROM.to_string(), ..Default::default() },
            subscription_sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SF_HOST").ok().unwrap_or_else(|| DEFAULT_SF_HOST.into());
        let port = env::var("SF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for SF_PORT. {e} Using the default, {DEFAULT_SF_PORT}, instead.");
                    DEFAULT_SF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SF_PORT);
        let database_url = non_empty_env("SF_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ SF_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let environment = non_empty_env("SF_ENVIRONMENT")
            .map(|s| {
                s.parse::<Environment>().unwrap_or_else(|e| {
                    error!("🪛️ {e}. SF_ENVIRONMENT must be 'development' or 'production'. Using development.");
                    Environment::Development
                })
            })
            .unwrap_or_default();
        let admin_api_key = Secret::new(non_empty_env("SF_ADMIN_API_KEY").unwrap_or_else(|| {
            warn!("🪛️ SF_ADMIN_API_KEY is not set. All admin API requests will be rejected.");
            String::default()
        }));
        let public_url = non_empty_env("SF_PUBLIC_URL").unwrap_or_else(|| {
            warn!("🪛️ SF_PUBLIC_URL is not set. Links in emails will point to {DEFAULT_PUBLIC_URL}");
            DEFAULT_PUBLIC_URL.to_string()
        });
        let email = EmailConfig::from_env_or_default(environment);
        let subscription_sweep_interval = non_empty_env("SF_SUBSCRIPTION_SWEEP_INTERVAL")
            .map(|s| {
                s.parse::<u64>().map(Duration::from_secs).unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid value for SF_SUBSCRIPTION_SWEEP_INTERVAL. {e} Using the default, {} \
                         seconds, instead.",
                        DEFAULT_SWEEP_INTERVAL.as_secs()
                    );
                    DEFAULT_SWEEP_INTERVAL
                })
            })
            .unwrap_or(DEFAULT_SWEEP_INTERVAL);
        Self {
            host,
            port,
            database_url,
            environment,
            admin_api_key,
            public_url,
            email,
            subscription_sweep_interval,
        }
    }
}

impl EmailConfig {
    pub fn from_env_or_default(environment: Environment) -> Self {
        let from = non_empty_env("SF_EMAIL_FROM").unwrap_or_else(|| {
            warn!("🪛️ SF_EMAIL_FROM is not set. Using {DEFAULT_EMAIL_FROM}");
            DEFAULT_EMAIL_FROM.to_string()
        });
        let dev_email = non_empty_env("SF_DEV_EMAIL");
        if dev_email.is_none() && !environment.is_production() {
            warn!("🪛️ SF_DEV_EMAIL is not set. Outside production, email will only be logged.");
        }
        let resend_api_key = Secret::new(non_empty_env("SF_RESEND_API_KEY").unwrap_or_else(|| {
            info!("🪛️ SF_RESEND_API_KEY is not set. Email will be logged instead of sent.");
            String::default()
        }));
        Self { from, dev_email, resend_api_key }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn environments() {
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
        assert!(!Environment::default().is_production());
    }

    #[test]
    fn config_from_env() {
        env::set_var("SF_PORT", "9001");
        env::set_var("SF_SUBSCRIPTION_SWEEP_INTERVAL", "not-a-number");
        env::set_var("SF_ADMIN_API_KEY", "letmein");
        let config = ServerConfig::from_env_or_default();
        assert_eq!(config.port, 9001);
        assert_eq!(config.subscription_sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert_eq!(config.admin_api_key.reveal(), "letmein");
        assert_eq!(format!("{:?}", config.admin_api_key), "****");
    }
}
