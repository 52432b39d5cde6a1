use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Membership, Order, OrderStatusType, Subscription},
    processors::RefundOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when an order reaches `Completed`, whether through checkout or by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRefundedEvent {
    pub order: Order,
    /// `None` when there was no gateway payment to refund.
    pub outcome: Option<RefundOutcome>,
}

impl OrderRefundedEvent {
    pub fn new(order: Order, outcome: Option<RefundOutcome>) -> Self {
        Self { order, outcome }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionActivatedEvent {
    pub subscription: Subscription,
    pub membership: Membership,
}

impl SubscriptionActivatedEvent {
    pub fn new(subscription: Subscription, membership: Membership) -> Self {
        Self { subscription, membership }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderPaid(OrderPaidEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OrderRefunded(OrderRefundedEvent),
    SubscriptionActivated(SubscriptionActivatedEvent),
}
