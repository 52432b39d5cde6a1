use std::fmt::Display;

use thiserror::Error;

use crate::{db_types::OrderStatusType, processors::PaymentProcessorError, traits::StoreError};

#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("Order {0} does not exist")]
    NotFound(String),
    #[error("Invalid order: {0}")]
    Validation(String),
    #[error("The requested order change would result in a no-op.")]
    NoOp,
    #[error("Changing an order from {from} to {to} is forbidden.")]
    TransitionForbidden { from: OrderStatusType, to: OrderStatusType },
    #[error("Order {0} has already been refunded.")]
    AlreadyRefunded(String),
    #[error("Order {0} must be archived before it can be deleted.")]
    NotArchived(String),
    #[error("Order {0} is completed and must stay archived.")]
    CompletedOrderMustStayArchived(String),
    #[error("{0}")]
    PaymentProcessor(#[from] PaymentProcessorError),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

/// Which funnel operation a validation message belongs to. The operation name prefixes every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelAction {
    Create,
    Update,
}

impl Display for FunnelAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunnelAction::Create => f.write_str("Fehler beim Erstellen des Funnels"),
            FunnelAction::Update => f.write_str("Fehler beim Aktualisieren des Funnels"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum FunnelError {
    #[error("{0}: {1}")]
    Invalid(FunnelAction, String),
    #[error("{0}: URL-Pfad wird bereits verwendet")]
    SlugTaken(FunnelAction),
    #[error("Funnel {0} does not exist")]
    NotFound(String),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum MembershipError {
    #[error("Invalid membership data: {0}")]
    Validation(String),
    #[error("Membership {0} does not exist")]
    MembershipNotFound(i64),
    #[error("Subscription {0} does not exist")]
    SubscriptionNotFound(i64),
    #[error("Membership page {0} does not exist")]
    PageNotFound(String),
    #[error("Membership {0} is not active and cannot be subscribed to")]
    MembershipInactive(i64),
    #[error("Subscription {0} has already ended")]
    SubscriptionEnded(i64),
    #[error("A membership page with the slug '{0}' already exists")]
    DuplicateSlug(String),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum CourseError {
    #[error("Invalid course data: {0}")]
    Validation(String),
    #[error("Course {0} does not exist")]
    CourseNotFound(i64),
    #[error("Course {course_id} has no content item {item_id}")]
    UnknownItem { course_id: i64, item_id: String },
    #[error("Content item {0} is not a quiz")]
    NotAQuiz(String),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum ProductError {
    #[error("Invalid product data: {0}")]
    Validation(String),
    #[error("Product {0} does not exist")]
    NotFound(String),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Invalid checkout request: {0}")]
    Validation(String),
    #[error("Funnel {0} does not exist")]
    FunnelNotFound(String),
    #[error("Funnel {0} is not active")]
    FunnelInactive(String),
    #[error("The offer is not available at this time")]
    WindowClosed { redirect_url: Option<String> },
    #[error("Order {0} has no open checkout session")]
    NoSession(String),
    #[error("Order {0} has already been paid")]
    AlreadyCompleted(String),
    #[error("Order {order_number} is {status} and can no longer be paid")]
    NotPayable { order_number: String, status: OrderStatusType },
    #[error("Product {0} is not for sale")]
    UnknownProduct(String),
    #[error("{0}")]
    Order(#[from] OrderError),
    #[error("{0}")]
    Funnel(#[from] FunnelError),
    #[error("{0}")]
    Membership(#[from] MembershipError),
    #[error("{0}")]
    Product(#[from] ProductError),
    #[error("{0}")]
    PaymentProcessor(#[from] PaymentProcessorError),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}
