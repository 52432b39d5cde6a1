use futures::future::BoxFuture;
use log::*;
use storefront_engine::{
    db_types::OrderStatusType,
    events::{EventHandlers, EventHooks, OrderStatusChangedEvent},
};

use crate::email::{EmailMessage, EmailService};

pub const EMAIL_EVENT_BUFFER_SIZE: usize = 25;

/// Customers are emailed about these status changes. Completion is covered by the payment receipt.
const NOTIFIED_STATUSES: [OrderStatusType; 4] =
    [OrderStatusType::OnHold, OrderStatusType::Cancelled, OrderStatusType::Refunded, OrderStatusType::Failed];

pub fn notifies_customer(status: OrderStatusType) -> bool {
    NOTIFIED_STATUSES.contains(&status)
}

/// Assigns the transactional email handlers.
///
/// 1. OrderCreatedEvent - an order confirmation goes to the customer.
/// 2. OrderPaidEvent - a payment receipt goes to the customer.
/// 3. OrderStatusChangedEvent - a status update, but only for the statuses in [`notifies_customer`].
/// 4. SubscriptionActivatedEvent - the member is welcomed to their membership.
///
/// Email failures are logged and never affect the order flow.
pub fn create_email_event_handlers(service: EmailService) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let svc = service.clone();
    hooks.on_order_created(move |ev| send(svc.clone(), EmailMessage::OrderConfirmation { order: ev.order }));
    let svc = service.clone();
    hooks.on_order_paid(move |ev| send(svc.clone(), EmailMessage::PaymentReceipt { order: ev.order }));
    let svc = service.clone();
    hooks.on_order_status_changed(move |ev| {
        let OrderStatusChangedEvent { old_status, order } = ev;
        if !notifies_customer(order.status) {
            trace!("📧️ Order {} moved to {}. No email is sent for this status.", order.order_number, order.status);
            return no_op();
        }
        send(svc.clone(), EmailMessage::StatusUpdate { order, old_status })
    });
    hooks.on_subscription_activated(move |ev| {
        send(service.clone(), EmailMessage::MembershipActivation {
            subscription: ev.subscription,
            membership: ev.membership,
        })
    });
    EventHandlers::new(EMAIL_EVENT_BUFFER_SIZE, hooks)
}

fn send(service: EmailService, message: EmailMessage) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        match service.send(&message).await {
            Ok(Some(id)) => info!("📧️ {} sent to {}. Message id: {id}", message.template(), message.recipient()),
            Ok(None) => {},
            Err(e) => error!("📧️ Could not send {} to {}. {e}", message.template(), message.recipient()),
        }
    })
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use storefront_engine::events::{OrderPaidEvent, OrderStatusChangedEvent};

    use super::*;
    use crate::{
        config::{EmailConfig, Environment},
        email::{fixtures::order, RecordingTransport},
    };

    #[test]
    fn only_customer_facing_statuses_are_notified() {
        assert!(notifies_customer(OrderStatusType::Cancelled));
        assert!(notifies_customer(OrderStatusType::OnHold));
        assert!(!notifies_customer(OrderStatusType::Processing));
        assert!(!notifies_customer(OrderStatusType::Completed));
    }

    #[tokio::test]
    async fn events_turn_into_email() {
        let transport = Arc::new(RecordingTransport::default());
        let config = EmailConfig { from: "shop@example.com".into(), ..Default::default() };
        let service = EmailService::new(transport.clone(), &config, Environment::Production, "https://shop.example");
        let handlers = create_email_event_handlers(service);
        assert!(handlers.on_order_refunded.is_none());
        let producers = handlers.producers();
        handlers.start_handlers().await;

        producers.publish_order_paid(OrderPaidEvent::new(order())).await;
        let mut processing = order();
        processing.status = OrderStatusType::Processing;
        producers.publish_order_status_changed(OrderStatusChangedEvent::new(OrderStatusType::Pending, processing)).await;
        let mut cancelled = order();
        cancelled.status = OrderStatusType::Cancelled;
        producers.publish_order_status_changed(OrderStatusChangedEvent::new(OrderStatusType::Pending, cancelled)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|e| e.subject.starts_with("Zahlungsbestätigung")));
        assert!(sent.iter().any(|e| e.subject.starts_with("Statusänderung")));
    }
}
