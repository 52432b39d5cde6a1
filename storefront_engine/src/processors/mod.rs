//! # Payment processors
//!
//! Every payment gateway the storefront can take money through implements [`PaymentProcessor`]. The engine only ever
//! talks to gateways through this trait; concrete implementations live in the `gateway_clients` crate.
//!
//! Processors are obtained from a [`ProcessorRegistry`], which constructs each one lazily the first time it is
//! needed and then hands out the same instance for the lifetime of the registry.
mod processor;
mod registry;

pub use processor::{
    CheckoutOptions,
    PaymentProcessor,
    PaymentProcessorError,
    PaymentSession,
    PaymentVerification,
    RecurringInterval,
    RefundOutcome,
};
pub use registry::{ProcessorFactory, ProcessorRegistry};
