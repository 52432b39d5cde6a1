use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    OrderPaidEvent,
    OrderRefundedEvent,
    OrderStatusChangedEvent,
    SubscriptionActivatedEvent,
};

pub type BoxedHookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The sending halves of the event channels. APIs hold a clone and publish through it.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub order_refunded_producer: Vec<EventProducer<OrderRefundedEvent>>,
    pub subscription_activated_producer: Vec<EventProducer<SubscriptionActivatedEvent>>,
}

impl EventProducers {
    pub async fn publish_order_created(&self, event: OrderCreatedEvent) {
        for emitter in &self.order_created_producer {
            trace!("📬️ Notifying order created hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for emitter in &self.order_paid_producer {
            trace!("📬️ Notifying order paid hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_status_changed(&self, event: OrderStatusChangedEvent) {
        for emitter in &self.order_status_changed_producer {
            trace!("📬️ Notifying order status changed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_refunded(&self, event: OrderRefundedEvent) {
        for emitter in &self.order_refunded_producer {
            trace!("📬️ Notifying order refunded hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_subscription_activated(&self, event: SubscriptionActivatedEvent) {
        for emitter in &self.subscription_activated_producer {
            trace!("📬️ Notifying subscription activated hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

/// The receiving halves of the event channels, one per registered hook.
pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_order_refunded: Option<EventHandler<OrderRefundedEvent>>,
    pub on_subscription_activated: Option<EventHandler<SubscriptionActivatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_created: hooks.on_order_created.map(|f| EventHandler::new("OrderCreated", buffer_size, f)),
            on_order_paid: hooks.on_order_paid.map(|f| EventHandler::new("OrderPaid", buffer_size, f)),
            on_order_status_changed: hooks
                .on_order_status_changed
                .map(|f| EventHandler::new("OrderStatusChanged", buffer_size, f)),
            on_order_refunded: hooks.on_order_refunded.map(|f| EventHandler::new("OrderRefunded", buffer_size, f)),
            on_subscription_activated: hooks
                .on_subscription_activated
                .map(|f| EventHandler::new("SubscriptionActivated", buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_refunded {
            result.order_refunded_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_subscription_activated {
            result.subscription_activated_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per registered handler.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_refunded {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_subscription_activated {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_order_refunded: Option<Handler<OrderRefundedEvent>>,
    pub on_subscription_activated: Option<Handler<SubscriptionActivatedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_order_refunded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderRefundedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_order_refunded = Some(Arc::new(f));
        self
    }

    pub fn on_subscription_activated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SubscriptionActivatedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_subscription_activated = Some(Arc::new(f));
        self
    }
}
