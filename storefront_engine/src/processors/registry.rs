use std::{collections::HashMap, fmt::Debug, sync::Arc};

use dashmap::{mapref::entry::Entry, DashMap};
use log::*;

use crate::{
    db_types::PaymentMethod,
    processors::{PaymentProcessor, PaymentProcessorError},
};

pub type ProcessorFactory =
    Box<dyn Fn() -> Result<Arc<dyn PaymentProcessor>, PaymentProcessorError> + Send + Sync>;

/// Hands out one processor per payment method, constructing each lazily on first use.
///
/// Constructing a processor can fail (e.g. when its credentials are not configured). A failed construction is not
/// cached, so the next request tries again.
#[derive(Default)]
pub struct ProcessorRegistry {
    factories: HashMap<PaymentMethod, ProcessorFactory>,
    instances: DashMap<PaymentMethod, Arc<dyn PaymentProcessor>>,
}

impl Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods = self.factories.keys().map(|m| m.as_str()).collect::<Vec<_>>();
        write!(f, "ProcessorRegistry({methods:?})")
    }
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constructor for `method`. Replaces any earlier factory, but not an already-built instance.
    pub fn register_factory<F>(&mut self, method: PaymentMethod, factory: F) -> &mut Self
    where F: Fn() -> Result<Arc<dyn PaymentProcessor>, PaymentProcessorError> + Send + Sync + 'static {
        self.factories.insert(method, Box::new(factory));
        self
    }

    /// Installs a ready-made processor, bypassing the factory.
    pub fn register_instance(&self, processor: Arc<dyn PaymentProcessor>) {
        let method = processor.method();
        self.instances.insert(method, processor);
        debug!("💳️ Processor instance for {method} installed");
    }

    /// Returns the processor for `method`, constructing it if this is the first request.
    pub fn get(&self, method: PaymentMethod) -> Result<Arc<dyn PaymentProcessor>, PaymentProcessorError> {
        if let Some(processor) = self.instances.get(&method) {
            return Ok(Arc::clone(processor.value()));
        }
        let factory =
            self.factories.get(&method).ok_or_else(|| PaymentProcessorError::UnsupportedMethod(method.to_string()))?;
        // The entry holds the shard lock, so concurrent callers cannot both construct
        match self.instances.entry(method) {
            Entry::Occupied(built) => Ok(Arc::clone(built.get())),
            Entry::Vacant(slot) => {
                let processor = factory().map_err(|e| {
                    warn!("💳️ Could not construct the {method} processor: {e}");
                    e
                })?;
                info!("💳️ {method} payment processor initialised");
                slot.insert(Arc::clone(&processor));
                Ok(processor)
            },
        }
    }

    pub fn supports(&self, method: PaymentMethod) -> bool {
        self.factories.contains_key(&method) || self.instances.contains_key(&method)
    }

    /// Drops every constructed processor. The next `get` constructs afresh.
    pub fn reset(&self) {
        self.instances.clear();
        debug!("💳️ Processor registry reset");
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        db_types::Money,
        processors::{CheckoutOptions, PaymentSession, PaymentVerification, RefundOutcome},
    };

    struct NullProcessor;

    #[async_trait]
    impl PaymentProcessor for NullProcessor {
        fn method(&self) -> PaymentMethod {
            PaymentMethod::Monero
        }

        async fn create_checkout_session(&self, _: &CheckoutOptions) -> Result<PaymentSession, PaymentProcessorError> {
            Ok(PaymentSession { session_id: "s".into(), checkout_url: "u".into() })
        }

        async fn verify_payment(&self, _: &str) -> PaymentVerification {
            PaymentVerification::failed("never")
        }

        async fn refund(&self, _: &str, _: Money) -> Result<RefundOutcome, PaymentProcessorError> {
            Ok(RefundOutcome::ManualActionRequired { reason: "manual".into() })
        }
    }

    #[test]
    fn constructs_once_per_method() {
        let count = Arc::new(AtomicUsize::new(0));
        let c2 = Arc::clone(&count);
        let mut registry = ProcessorRegistry::new();
        registry.register_factory(PaymentMethod::Monero, move || {
            c2.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullProcessor) as Arc<dyn PaymentProcessor>)
        });
        let a = registry.get(PaymentMethod::Monero).unwrap();
        let b = registry.get(PaymentMethod::Monero).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        registry.reset();
        let _ = registry.get(PaymentMethod::Monero).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_methods_are_unsupported() {
        let registry = ProcessorRegistry::new();
        assert!(!registry.supports(PaymentMethod::Stripe));
        let err = registry.get(PaymentMethod::Stripe).err().unwrap();
        assert!(matches!(err, PaymentProcessorError::UnsupportedMethod(m) if m == "stripe"));
    }

    #[test]
    fn failed_construction_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let a2 = Arc::clone(&attempts);
        let mut registry = ProcessorRegistry::new();
        registry.register_factory(PaymentMethod::Stripe, move || {
            a2.fetch_add(1, Ordering::SeqCst);
            Err(PaymentProcessorError::Configuration("SF_STRIPE_SECRET_KEY is not set".into()))
        });
        assert!(registry.get(PaymentMethod::Stripe).is_err());
        assert!(registry.get(PaymentMethod::Stripe).is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn injected_instances_win() {
        let registry = ProcessorRegistry::new();
        registry.register_instance(Arc::new(NullProcessor));
        assert!(registry.supports(PaymentMethod::Monero));
        assert_eq!(registry.get(PaymentMethod::Monero).unwrap().method(), PaymentMethod::Monero);
    }
}
