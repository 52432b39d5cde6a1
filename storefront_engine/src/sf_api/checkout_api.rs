use std::{collections::BTreeSet, fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;

use crate::{
    countdown::CountdownState,
    db_types::{Funnel, NewOrder, Order, OrderStatusType, Subscription},
    processors::{CheckoutOptions, ProcessorRegistry},
    sf_api::{
        checkout_objects::{CheckoutOutcome, CheckoutRequest, CheckoutStarted, ListPrice},
        errors::{CheckoutError, OrderError},
        FunnelApi,
        MembershipApi,
        OrderApi,
        ProductApi,
    },
    traits::{FunnelManagement, MembershipManagement, OrderManagement, ProductManagement},
};

/// Drives a purchase from the customer's checkout request through to a paid order and any memberships it grants.
///
/// 1. [`Self::start_checkout`] prices the requested products from the catalogue, stores the order, opens a session
///    with the chosen gateway and moves the order to `Processing`. The customer is then sent to the session's
///    checkout URL. Products that are not in the catalogue are priced by the membership they grant.
/// 2. When the customer comes back, [`Self::complete_checkout`] asks the gateway whether the session was paid. If it
///    was, the order is completed and the customer is subscribed to every membership the purchased products grant.
pub struct CheckoutApi<B> {
    orders: OrderApi<B>,
    funnels: FunnelApi<B>,
    memberships: MembershipApi<B>,
    products: ProductApi<B>,
    processors: Arc<ProcessorRegistry>,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B: Clone> Clone for CheckoutApi<B> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            funnels: self.funnels.clone(),
            memberships: self.memberships.clone(),
            products: self.products.clone(),
            processors: Arc::clone(&self.processors),
        }
    }
}

impl<B: Clone> CheckoutApi<B> {
    /// Builds a checkout API that shares its database, event producers, order cache and processors with `orders`.
    pub fn new(orders: OrderApi<B>) -> Self {
        let db = orders.db().clone();
        let funnels = FunnelApi::new(db.clone());
        let products = ProductApi::new(db.clone());
        let memberships = MembershipApi::new(db, orders.producers().clone());
        let processors = Arc::clone(orders.processor_registry());
        Self { orders, funnels, memberships, products, processors }
    }
}

impl<B> CheckoutApi<B>
where B: OrderManagement + FunnelManagement + MembershipManagement + ProductManagement
{
    async fn open_funnel(&self, slug: &str) -> Result<Funnel, CheckoutError> {
        let funnel = self
            .funnels
            .fetch_funnel_by_slug(slug)
            .await?
            .ok_or_else(|| CheckoutError::FunnelNotFound(slug.to_string()))?;
        if !funnel.is_active {
            return Err(CheckoutError::FunnelInactive(slug.to_string()));
        }
        if let Some(countdown) = &funnel.countdown {
            let state = countdown.state_at(Utc::now());
            if state != CountdownState::Active {
                debug!("🎯️ Checkout through /{slug} refused. The offer window is {state:?}");
                return Err(CheckoutError::WindowClosed { redirect_url: countdown.redirect_url.clone() });
            }
        }
        Ok(funnel)
    }

    /// Looks up what `product_id` costs. Active catalogue products come first, then the membership the product
    /// grants.
    async fn list_price(&self, product_id: &str) -> Result<ListPrice, CheckoutError> {
        if let Some(product) = self.products.fetch_product(product_id).await? {
            if !product.is_active {
                return Err(CheckoutError::UnknownProduct(product_id.to_string()));
            }
            return Ok(ListPrice { name: product.name, price: product.price });
        }
        match self.memberships.membership_for_product(product_id).await? {
            Some(m) => Ok(ListPrice { name: m.name, price: m.price }),
            None => Err(CheckoutError::UnknownProduct(product_id.to_string())),
        }
    }

    pub async fn start_checkout(&self, request: CheckoutRequest) -> Result<CheckoutStarted, CheckoutError> {
        if request.items.is_empty() {
            return Err(CheckoutError::Validation("At least one product is required".into()));
        }
        if let Some(item) = request.items.iter().find(|i| i.quantity <= 0) {
            return Err(CheckoutError::Validation(format!(
                "Product {} has an invalid quantity of {}",
                item.product_id, item.quantity
            )));
        }
        let funnel = match &request.funnel_slug {
            Some(slug) => Some(self.open_funnel(slug).await?),
            None => None,
        };
        let processor = self.processors.get(request.payment_method)?;
        let mut items = Vec::with_capacity(request.items.len());
        for item in request.items {
            let price = self.list_price(&item.product_id).await?;
            let discount = funnel.as_ref().map(|f| f.discount_for(&item.product_id)).unwrap_or(0);
            items.push(price.line_item(item, u8::try_from(discount.clamp(0, 100)).unwrap_or(0)));
        }
        let mut new_order = NewOrder::new(request.customer_name, request.customer_email, items)
            .with_payment_method(request.payment_method);
        if let Some(currency) = request.currency {
            new_order = new_order.with_currency(currency);
        }
        if let Some(f) = &funnel {
            new_order = new_order.with_funnel_id(f.id);
        }
        let order = self.orders.create_order(new_order).await?;
        let Some(main_item) = order.items.first() else {
            return Err(CheckoutError::Validation("At least one product is required".into()));
        };
        let options = CheckoutOptions {
            order_number: order.order_number.clone(),
            product_id: main_item.product_id.clone(),
            product_name: main_item.product_name.clone(),
            amount: order.total,
            currency: order.currency.clone(),
            customer_email: order.customer_email.clone(),
            success_url: request.success_url,
            cancel_url: request.cancel_url,
            recurring: request.recurring,
        };
        let session = match processor.create_checkout_session(&options).await {
            Ok(session) => session,
            Err(e) => {
                warn!("💳️ Could not open a {} checkout session for order {}. {e}", request.payment_method, order.order_number);
                if let Err(update_err) = self.orders.update_status(order.id, OrderStatusType::Failed).await {
                    error!("💳️ Order {} could not be marked as failed. {update_err}", order.order_number);
                }
                return Err(e.into());
            },
        };
        let order = self.orders.start_payment(&order, request.payment_method, &session).await?;
        info!("💳️ Checkout for order {} started with session {}", order.order_number, session.session_id);
        Ok(CheckoutStarted { order, session })
    }

    /// Verifies the payment for an order with its gateway. Only orders that are still awaiting payment can be
    /// completed. Refunded, cancelled and failed orders are rejected.
    ///
    /// An unsuccessful verification is not an error: the order is left as it is and the verification is returned so
    /// the caller can decide what to show the customer.
    pub async fn complete_checkout(&self, order_id: i64) -> Result<CheckoutOutcome, CheckoutError> {
        let order = self
            .orders
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::Order(OrderError::NotFound(order_id.to_string())))?;
        match order.status {
            OrderStatusType::Pending | OrderStatusType::Processing | OrderStatusType::OnHold => {},
            OrderStatusType::Completed => return Err(CheckoutError::AlreadyCompleted(order.order_number)),
            status => return Err(CheckoutError::NotPayable { order_number: order.order_number, status }),
        }
        let (Some(method), Some(session_id)) = (order.payment_method, order.session_id()) else {
            return Err(CheckoutError::NoSession(order.order_number.clone()));
        };
        let processor = self.processors.get(method)?;
        let verification = processor.verify_payment(session_id).await;
        if !verification.success {
            info!(
                "💳️ Payment for order {} is not confirmed. {}",
                order.order_number,
                verification.error.as_deref().unwrap_or("No reason given")
            );
            return Ok(CheckoutOutcome { verification, order, subscriptions: vec![] });
        }
        let order = self.orders.mark_paid(&order, &verification).await?;
        let subscriptions = self.grant_memberships(&order, verification.is_subscription).await;
        Ok(CheckoutOutcome { verification, order, subscriptions })
    }

    /// Subscribes the customer to every membership granted by the products in the order.
    ///
    /// The order is already paid at this point, so failures are logged rather than returned.
    async fn grant_memberships(&self, order: &Order, auto_renew: bool) -> Vec<Subscription> {
        let products = order.items.iter().map(|i| i.product_id.as_str()).collect::<BTreeSet<&str>>();
        let mut granted = BTreeSet::new();
        let mut subscriptions = Vec::new();
        for product_id in products {
            let membership = match self.memberships.membership_for_product(product_id).await {
                Ok(Some(m)) => m,
                Ok(None) => continue,
                Err(e) => {
                    error!("🎫️ Could not look up the membership for product {product_id} in order {}. {e}", order.order_number);
                    continue;
                },
            };
            if !granted.insert(membership.id) {
                continue;
            }
            match self.memberships.subscribe(&order.customer_email, membership.id, Some(order.id), auto_renew).await {
                Ok(s) => subscriptions.push(s),
                Err(e) => error!(
                    "🎫️ Order {} is paid, but {} could not be subscribed to membership #{}. {e}",
                    order.order_number, order.customer_email, membership.id
                ),
            }
        }
        subscriptions
    }
}
