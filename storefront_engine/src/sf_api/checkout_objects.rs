use serde::{Deserialize, Serialize};

use crate::{
    db_types::{LineItem, Money, Order, PaymentMethod, Subscription},
    processors::{PaymentSession, PaymentVerification, RecurringInterval},
};

/// A product the customer wants to buy. Prices and names are taken from the catalogue, so any price the client sends
/// is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

impl CheckoutItem {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}

/// The catalogue name and list price of a product, before any funnel discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListPrice {
    pub name: String,
    pub price: Money,
}

impl ListPrice {
    pub(crate) fn line_item(self, item: CheckoutItem, discount_percent: u8) -> LineItem {
        LineItem::new(item.product_id, self.name, item.quantity, self.price.discounted(discount_percent))
    }
}

/// A customer's request to pay for one or more products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub currency: Option<String>,
    pub payment_method: PaymentMethod,
    /// The funnel the purchase is made through. Funnel discounts and countdown windows apply when set.
    #[serde(default)]
    pub funnel_slug: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(default)]
    pub recurring: Option<RecurringInterval>,
}

impl CheckoutRequest {
    pub fn new<S: Into<String>>(customer_name: S, customer_email: S, method: PaymentMethod) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            items: Vec::new(),
            currency: None,
            payment_method: method,
            funnel_slug: None,
            success_url: String::new(),
            cancel_url: String::new(),
            recurring: None,
        }
    }

    pub fn with_item(mut self, item: CheckoutItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn through_funnel<S: Into<String>>(mut self, slug: S) -> Self {
        self.funnel_slug = Some(slug.into());
        self
    }

    pub fn with_return_urls<S: Into<String>>(mut self, success_url: S, cancel_url: S) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }

    pub fn recurring(mut self, interval: RecurringInterval) -> Self {
        self.recurring = Some(interval);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutStarted {
    pub order: Order,
    pub session: PaymentSession,
}

/// The result of completing a checkout. When `verification.success` is false, the order is returned unchanged and
/// no subscriptions are created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOutcome {
    pub verification: PaymentVerification,
    pub order: Order,
    pub subscriptions: Vec<Subscription>,
}
