use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;

use crate::{
    cache::OrderCache,
    db_types::{NewOrder, Order, OrderStatusType, PaymentMethod},
    events::{EventProducers, OrderCreatedEvent, OrderPaidEvent, OrderRefundedEvent, OrderStatusChangedEvent},
    helpers::generate_order_number,
    processors::{PaymentSession, PaymentVerification, ProcessorRegistry},
    sf_api::{
        errors::OrderError,
        order_objects::{OrderPage, OrderQuery, OrderStats, OrderUpdate, Pagination, RefundResult},
    },
    traits::OrderManagement,
};

/// `OrderApi` is the entry point for everything that reads or changes orders.
///
/// Listings and statistics are served from an [`OrderCache`]. Every successful write made through this API clears
/// the cache, so a listing never shows data older than the last write made by this server.
pub struct OrderApi<B> {
    db: B,
    producers: EventProducers,
    cache: OrderCache,
    processors: Arc<ProcessorRegistry>,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B: Clone> Clone for OrderApi<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            producers: self.producers.clone(),
            cache: self.cache.clone(),
            processors: Arc::clone(&self.processors),
        }
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B, producers: EventProducers, processors: Arc<ProcessorRegistry>) -> Self {
        Self::new_with_cache(db, producers, processors, OrderCache::default())
    }

    pub fn new_with_cache(
        db: B,
        producers: EventProducers,
        processors: Arc<ProcessorRegistry>,
        cache: OrderCache,
    ) -> Self {
        Self { db, producers, cache, processors }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    pub(crate) fn processor_registry(&self) -> &Arc<ProcessorRegistry> {
        &self.processors
    }

    pub(crate) fn producers(&self) -> &EventProducers {
        &self.producers
    }

    /// Drops every cached listing and statistics result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl<B> OrderApi<B>
where B: OrderManagement
{
    /// Stores a new order with status `Pending` and a freshly generated order number.
    ///
    /// The order is validated first: it must have a customer email, at least one item, positive quantities, and
    /// totals that add up.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderError> {
        order.validate().map_err(OrderError::Validation)?;
        let order_number = generate_order_number(Utc::now());
        let order = self.db.insert_order(&order_number, order).await?;
        self.cache.clear();
        debug!("📦️ Order {} created for {} ({} {})", order.order_number, order.customer_email, order.total, order.currency);
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(order)
    }

    /// Returns the page of orders matching `query`. Results are cached per query for two minutes.
    pub async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, OrderError> {
        let key = query.cache_key();
        if let Some(page) = self.cache.listing(&key) {
            return Ok(page);
        }
        trace!("📦️ Searching orders: {query}");
        let page = self.db.search_orders(query).await?;
        self.cache.store_listing(key, page.clone());
        Ok(page)
    }

    /// Every order that still needs attention, i.e. anything that is not `Completed`, newest first.
    pub async fn active_orders(&self, pagination: Pagination) -> Result<OrderPage, OrderError> {
        let query = OrderQuery::default().excluding_completed().paged(pagination);
        self.list_orders(&query).await
    }

    /// Order counts and revenue figures. Results are cached for five minutes.
    pub async fn order_stats(&self) -> Result<OrderStats, OrderError> {
        if let Some(stats) = self.cache.stats() {
            return Ok(stats);
        }
        let stats = self.db.order_stats().await?;
        self.cache.store_stats(stats.clone());
        Ok(stats)
    }

    pub async fn fetch_order(&self, id: i64) -> Result<Option<Order>, OrderError> {
        Ok(self.db.fetch_order(id).await?)
    }

    pub async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, OrderError> {
        Ok(self.db.fetch_order_by_number(order_number).await?)
    }

    async fn existing_order(&self, id: i64) -> Result<Order, OrderError> {
        self.db.fetch_order(id).await?.ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    async fn apply_update(&self, id: i64, update: OrderUpdate) -> Result<Order, OrderError> {
        let order = self.db.update_order(id, update).await?.ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        self.cache.clear();
        Ok(order)
    }

    /// Changes the status of an order.
    ///
    /// | Current status | New status | Result                                                               |
    /// |----------------|------------|----------------------------------------------------------------------|
    /// | any            | same       | [`OrderError::NoOp`]                                                 |
    /// | `Refunded`     | any        | [`OrderError::TransitionForbidden`]                                  |
    /// | any            | `Refunded` | [`OrderError::TransitionForbidden`]. Use [`Self::refund_order`]      |
    /// | any            | `Completed`| Allowed. Stamps `date_paid`, archives the order, emits `OrderPaid`   |
    /// | any            | other      | Allowed                                                              |
    ///
    /// Every successful change emits an `OrderStatusChanged` event.
    pub async fn update_status(&self, id: i64, new_status: OrderStatusType) -> Result<Order, OrderError> {
        let order = self.existing_order(id).await?;
        let old_status = order.status;
        if old_status == new_status {
            return Err(OrderError::NoOp);
        }
        if old_status == OrderStatusType::Refunded || new_status == OrderStatusType::Refunded {
            return Err(OrderError::TransitionForbidden { from: old_status, to: new_status });
        }
        let mut update = OrderUpdate::status(new_status);
        if new_status == OrderStatusType::Completed {
            update = update.with_archived(true).with_date_paid(order.date_paid.unwrap_or_else(Utc::now));
        }
        let updated = self.apply_update(id, update).await?;
        info!("📦️ Order {} changed from {old_status} to {new_status}", updated.order_number);
        if new_status == OrderStatusType::Completed {
            self.producers.publish_order_paid(OrderPaidEvent::new(updated.clone())).await;
        }
        self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(old_status, updated.clone())).await;
        Ok(updated)
    }

    /// Archives or un-archives an order. Completed orders are always archived, so un-archiving them is rejected.
    pub async fn set_archived(&self, id: i64, archived: bool) -> Result<Order, OrderError> {
        let order = self.existing_order(id).await?;
        if !archived && order.status == OrderStatusType::Completed {
            return Err(OrderError::CompletedOrderMustStayArchived(order.order_number));
        }
        if order.is_archived == archived {
            return Err(OrderError::NoOp);
        }
        let order = self.apply_update(id, OrderUpdate::archived(archived)).await?;
        debug!("📦️ Order {} archived: {archived}", order.order_number);
        Ok(order)
    }

    /// Refunds an order.
    ///
    /// When the order was paid through a gateway and carries a payment reference, the full order total is refunded
    /// through that gateway first. Orders without a payment reference are marked as refunded without contacting any
    /// gateway. A gateway failure leaves the order untouched.
    pub async fn refund_order(&self, id: i64) -> Result<RefundResult, OrderError> {
        let order = self.existing_order(id).await?;
        if order.status == OrderStatusType::Refunded {
            return Err(OrderError::AlreadyRefunded(order.order_number));
        }
        let outcome = match (order.payment_method, order.payment_reference()) {
            (Some(method), Some(reference)) => {
                let processor = self.processors.get(method)?;
                let outcome = processor.refund(reference, order.total).await.map_err(|e| {
                    warn!("📦️💳️ Refund of order {} through {method} failed. {e}", order.order_number);
                    e
                })?;
                info!("📦️💳️ Refund of {} {} for order {} via {method}: {outcome:?}", order.total, order.currency, order.order_number);
                Some(outcome)
            },
            _ => {
                debug!("📦️ Order {} has no payment reference. No gateway refund is issued.", order.order_number);
                None
            },
        };
        let updated = match self.apply_update(id, OrderUpdate::status(OrderStatusType::Refunded)).await {
            Ok(o) => o,
            Err(e) => {
                if outcome.is_some() {
                    error!(
                        "📦️💳️ Order {} was refunded by the gateway ({outcome:?}) but could not be marked as refunded. {e}",
                        order.order_number
                    );
                }
                return Err(e);
            },
        };
        self.producers.publish_order_refunded(OrderRefundedEvent::new(updated.clone(), outcome.clone())).await;
        self.producers
            .publish_order_status_changed(OrderStatusChangedEvent::new(order.status, updated.clone()))
            .await;
        Ok(RefundResult { order: updated, outcome })
    }

    /// Deletes an order. Only archived orders can be deleted.
    pub async fn delete_order(&self, id: i64) -> Result<Order, OrderError> {
        let order = self.existing_order(id).await?;
        if !order.is_archived {
            return Err(OrderError::NotArchived(order.order_number));
        }
        if !self.db.delete_order(id).await? {
            return Err(OrderError::NotFound(id.to_string()));
        }
        self.cache.clear();
        info!("📦️ Order {} deleted", order.order_number);
        Ok(order)
    }

    /// Records that a checkout session was opened with a gateway and moves the order to `Processing`.
    pub(crate) async fn start_payment(
        &self,
        order: &Order,
        method: PaymentMethod,
        session: &PaymentSession,
    ) -> Result<Order, OrderError> {
        let mut gateway = order.gateway.clone();
        gateway.set_session_id(method, session.session_id.clone());
        let update = OrderUpdate::status(OrderStatusType::Processing).with_payment_method(method).with_gateway(gateway);
        let updated = self.apply_update(order.id, update).await?;
        debug!("📦️💳️ Order {} is awaiting payment via {method}", updated.order_number);
        if order.status != OrderStatusType::Processing {
            self.producers
                .publish_order_status_changed(OrderStatusChangedEvent::new(order.status, updated.clone()))
                .await;
        }
        Ok(updated)
    }

    /// Marks an order as paid after a successful gateway verification.
    pub(crate) async fn mark_paid(&self, order: &Order, verification: &PaymentVerification) -> Result<Order, OrderError> {
        if order.status == OrderStatusType::Refunded {
            return Err(OrderError::TransitionForbidden { from: order.status, to: OrderStatusType::Completed });
        }
        let mut gateway = order.gateway.clone();
        if let Some(method) = order.payment_method {
            if let Some(reference) = &verification.payment_reference {
                gateway.set_payment_reference(method, reference.clone());
            }
            if method == PaymentMethod::Stripe && verification.subscription_id.is_some() {
                gateway.stripe_subscription_id = verification.subscription_id.clone();
            }
        }
        let update = OrderUpdate::status(OrderStatusType::Completed)
            .with_archived(true)
            .with_date_paid(order.date_paid.unwrap_or_else(Utc::now))
            .with_gateway(gateway);
        let updated = self.apply_update(order.id, update).await?;
        info!("📦️💳️ Order {} has been paid", updated.order_number);
        self.producers.publish_order_paid(OrderPaidEvent::new(updated.clone())).await;
        self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(order.status, updated.clone())).await;
        Ok(updated)
    }
}
