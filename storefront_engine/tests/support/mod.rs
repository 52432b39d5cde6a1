#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use async_trait::async_trait;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use storefront_engine::{
    db_types::{Money, PaymentMethod},
    events::EventProducers,
    processors::{
        CheckoutOptions,
        PaymentProcessor,
        PaymentProcessorError,
        PaymentSession,
        PaymentVerification,
        ProcessorRegistry,
        RefundOutcome,
    },
    OrderApi,
    SqliteDatabase,
    StorefrontDatabase,
};

pub fn random_db_url() -> String {
    format!("sqlite://{}/sf_it_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

/// A fresh database with the full schema.
pub async fn fresh_db() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_url();
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.migrate().await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

pub fn order_api(db: &SqliteDatabase, processors: Arc<ProcessorRegistry>) -> OrderApi<SqliteDatabase> {
    OrderApi::new(db.clone(), EventProducers::default(), processors)
}

/// A gateway double that pays every session unless told otherwise, and counts the calls made to it.
#[derive(Default)]
pub struct FakeProcessor {
    method: Option<PaymentMethod>,
    pub sessions: AtomicUsize,
    pub refunds: AtomicUsize,
    pub decline: std::sync::atomic::AtomicBool,
    pub offline: std::sync::atomic::AtomicBool,
    pub last_options: Mutex<Option<CheckoutOptions>>,
}

impl FakeProcessor {
    pub fn new(method: PaymentMethod) -> Arc<Self> {
        Arc::new(Self { method: Some(method), ..Default::default() })
    }

    pub fn decline_payments(&self) {
        self.decline.store(true, Ordering::SeqCst);
    }

    /// Every new checkout session fails as if the gateway could not be reached.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }

    pub fn last_amount(&self) -> Option<Money> {
        self.last_options.lock().unwrap().as_ref().map(|o| o.amount)
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    fn method(&self) -> PaymentMethod {
        self.method.unwrap_or(PaymentMethod::Stripe)
    }

    async fn create_checkout_session(&self, options: &CheckoutOptions) -> Result<PaymentSession, PaymentProcessorError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PaymentProcessorError::NetworkError("connection refused".into()));
        }
        let n = self.sessions.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        Ok(PaymentSession {
            session_id: format!("sess_{n}_{}", options.order_number),
            checkout_url: format!("https://pay.example.com/{n}"),
        })
    }

    async fn verify_payment(&self, session_id: &str) -> PaymentVerification {
        if self.decline.load(Ordering::SeqCst) {
            return PaymentVerification::failed("Card declined");
        }
        let product = self.last_options.lock().unwrap().as_ref().map(|o| o.product_id.clone());
        PaymentVerification::paid(product, format!("pi_{session_id}"))
    }

    async fn refund(&self, payment_reference: &str, _amount: Money) -> Result<RefundOutcome, PaymentProcessorError> {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        Ok(RefundOutcome::Refunded { refund_id: format!("re_{payment_reference}") })
    }
}

pub fn registry_with(processor: Arc<FakeProcessor>) -> Arc<ProcessorRegistry> {
    let registry = ProcessorRegistry::new();
    registry.register_instance(processor);
    Arc::new(registry)
}
