use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    str::FromStr,
};

use chrono::{DateTime, Duration, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use sf_common::{Money, DEFAULT_CURRENCY_CODE};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatusType {
    /// The order has been created, and no payment has been attempted yet.
    Pending,
    /// A checkout session exists with a payment gateway, and the customer has not completed it yet.
    Processing,
    /// The order has been put on hold by an admin.
    OnHold,
    /// The order has been paid in full.
    Completed,
    /// The order was cancelled by the customer or an admin.
    Cancelled,
    /// The payment for the order has been returned to the customer.
    Refunded,
    /// The payment failed.
    Failed,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 7] = [
        OrderStatusType::Pending,
        OrderStatusType::Processing,
        OrderStatusType::OnHold,
        OrderStatusType::Completed,
        OrderStatusType::Cancelled,
        OrderStatusType::Refunded,
        OrderStatusType::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Processing => "processing",
            OrderStatusType::OnHold => "on-hold",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Cancelled => "cancelled",
            OrderStatusType::Refunded => "refunded",
            OrderStatusType::Failed => "failed",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ConversionError(format!("Invalid order status: {s}")))
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Stripe,
    Paypal,
    Monero,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Stripe, PaymentMethod::Paypal, PaymentMethod::Monero];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Monero => "monero",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ConversionError(format!("Unsupported payment method: {s}")))
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl LineItem {
    pub fn new<S: Into<String>>(product_id: S, product_name: S, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            line_total: Money::default(),
        }
        .with_line_total()
    }

    /// `unit_price * quantity`, or `None` if it overflows.
    pub fn expected_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    /// Recomputes the line total. An overflowing total is left at zero, and [`NewOrder::validate`] rejects it.
    pub fn with_line_total(self) -> Self {
        let line_total = self.expected_total().unwrap_or_default();
        Self { line_total, ..self }
    }
}

//--------------------------------------      GatewayIds       ---------------------------------------------------------
/// Identifiers handed out by the payment gateways for an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayIds {
    pub stripe_session_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub paypal_order_id: Option<String>,
    pub paypal_capture_id: Option<String>,
    pub monero_payment_id: Option<String>,
}

impl GatewayIds {
    /// The id of the checkout session that was opened with the gateway for `method`.
    pub fn session_id(&self, method: PaymentMethod) -> Option<&str> {
        match method {
            PaymentMethod::Stripe => self.stripe_session_id.as_deref(),
            PaymentMethod::Paypal => self.paypal_order_id.as_deref(),
            PaymentMethod::Monero => self.monero_payment_id.as_deref(),
        }
    }

    pub fn set_session_id(&mut self, method: PaymentMethod, session_id: String) {
        match method {
            PaymentMethod::Stripe => self.stripe_session_id = Some(session_id),
            PaymentMethod::Paypal => self.paypal_order_id = Some(session_id),
            PaymentMethod::Monero => self.monero_payment_id = Some(session_id),
        }
    }

    /// The reference of the settled payment, which is what refunds are issued against. Monero payments are settled
    /// by hand, so they never carry one.
    pub fn payment_reference(&self, method: PaymentMethod) -> Option<&str> {
        match method {
            PaymentMethod::Stripe => self.stripe_payment_intent_id.as_deref(),
            PaymentMethod::Paypal => self.paypal_capture_id.as_deref(),
            PaymentMethod::Monero => None,
        }
    }

    pub fn set_payment_reference(&mut self, method: PaymentMethod, reference: String) {
        match method {
            PaymentMethod::Stripe => self.stripe_payment_intent_id = Some(reference),
            PaymentMethod::Paypal => self.paypal_capture_id = Some(reference),
            PaymentMethod::Monero => {},
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    #[sqlx(json)]
    pub items: Vec<LineItem>,
    pub total: Money,
    pub currency: String,
    pub status: OrderStatusType,
    pub payment_method: Option<PaymentMethod>,
    #[sqlx(json)]
    pub gateway: GatewayIds,
    pub is_archived: bool,
    pub date_paid: Option<DateTime<Utc>>,
    pub funnel_id: Option<i64>,
    pub woo_order_id: Option<i64>,
    pub woo_date_created: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_method.and_then(|m| self.gateway.payment_reference(m))
    }

    pub fn session_id(&self) -> Option<&str> {
        self.payment_method.and_then(|m| self.gateway.session_id(m))
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    /// The sum of the line totals. Always recomputed by [`NewOrder::new`] and [`NewOrder::with_items`].
    pub total: Money,
    pub currency: String,
    pub payment_method: Option<PaymentMethod>,
    pub funnel_id: Option<i64>,
    pub woo_order_id: Option<i64>,
    pub woo_date_created: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(customer_name: S, customer_email: S, items: Vec<LineItem>) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            items: Vec::new(),
            total: Money::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            payment_method: None,
            funnel_id: None,
            woo_order_id: None,
            woo_date_created: None,
            created_at: Utc::now(),
        }
        .with_items(items)
    }

    /// Replaces the line items, recomputing every line total and the order total.
    pub fn with_items(mut self, items: Vec<LineItem>) -> Self {
        self.items = items.into_iter().map(LineItem::with_line_total).collect();
        self.total = Money::checked_sum(self.items.iter().map(|i| i.line_total)).unwrap_or_default();
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_funnel_id(mut self, funnel_id: i64) -> Self {
        self.funnel_id = Some(funnel_id);
        self
    }

    /// Checks the order for internal consistency. Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.customer_email.trim().is_empty() {
            return Err("A customer email address is required".into());
        }
        if self.items.is_empty() {
            return Err("An order must contain at least one item".into());
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(format!("Item {} has an invalid quantity of {}", item.product_id, item.quantity));
        }
        if let Some(item) = self.items.iter().find(|i| i.unit_price.is_negative()) {
            return Err(format!("Item {} has a negative price", item.product_id));
        }
        if let Some(item) = self.items.iter().find(|i| i.expected_total().is_none()) {
            return Err(format!("Item {} costs more than can be charged in one order", item.product_id));
        }
        if self.items.iter().any(|i| i.expected_total() != Some(i.line_total)) {
            return Err("Line totals do not match quantity and unit price".into());
        }
        let Some(sum) = Money::checked_sum(self.items.iter().map(|i| i.line_total)) else {
            return Err("The order total is larger than can be charged in one order".into());
        };
        if sum != self.total {
            return Err(format!("Order total {} does not match the sum of its items ({sum})", self.total));
        }
        Ok(())
    }
}

//--------------------------------------       Product         ---------------------------------------------------------
/// A catalogue entry. Checkout prices come from here, never from the customer.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub product_id: String,
    pub name: String,
    pub price: Money,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_id: String,
    pub name: String,
    pub price: Money,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

fn active() -> bool {
    true
}

impl NewProduct {
    pub fn new<S: Into<String>>(product_id: S, name: S, price: Money) -> Self {
        Self { product_id: product_id.into(), name: name.into(), price, currency: default_currency(), is_active: true }
    }
}

//--------------------------------------      Membership       ---------------------------------------------------------
/// The longest a membership can run for, about a hundred years.
pub const MAX_MEMBERSHIP_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Membership {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub duration_days: i64,
    pub price: Money,
    pub currency: String,
    #[sqlx(json)]
    pub features: Vec<String>,
    /// Products that grant this membership when purchased.
    #[sqlx(json)]
    pub product_ids: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMembership {
    pub name: String,
    pub description: String,
    pub duration_days: i64,
    pub price: Money,
    pub currency: String,
    pub features: Vec<String>,
    pub product_ids: Vec<String>,
    pub is_active: bool,
}

impl Default for NewMembership {
    fn default() -> Self {
        Self {
            name: String::default(),
            description: String::default(),
            duration_days: 30,
            price: Money::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            features: Vec::new(),
            product_ids: Vec::new(),
            is_active: true,
        }
    }
}

//--------------------------------------  SubscriptionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Pending,
    Cancelled,
    Expired,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => f.write_str("active"),
            SubscriptionStatus::Pending => f.write_str("pending"),
            SubscriptionStatus::Cancelled => f.write_str("cancelled"),
            SubscriptionStatus::Expired => f.write_str("expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Paid => f.write_str("paid"),
            PaymentStatus::Pending => f.write_str("pending"),
            PaymentStatus::Failed => f.write_str("failed"),
            PaymentStatus::Refunded => f.write_str("refunded"),
        }
    }
}

//--------------------------------------     Subscription      ---------------------------------------------------------
/// A user's membership, valid between `start_date` and `end_date`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: String,
    pub membership_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub auto_renew: bool,
    pub payment_status: PaymentStatus,
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn grants_access_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.start_date <= now && now < self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub user_id: String,
    pub membership_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub auto_renew: bool,
    pub payment_status: PaymentStatus,
    pub order_id: Option<i64>,
}

impl NewSubscription {
    /// An active, paid subscription to `membership` starting at `start`.
    ///
    /// Returns `None` if the membership's duration does not yield a representable end date.
    pub fn for_membership(user_id: String, membership: &Membership, start: DateTime<Utc>) -> Option<Self> {
        if !(1..=MAX_MEMBERSHIP_DAYS).contains(&membership.duration_days) {
            return None;
        }
        let end_date = start.checked_add_signed(Duration::days(membership.duration_days))?;
        Some(Self {
            user_id,
            membership_id: membership.id,
            start_date: start,
            end_date,
            status: SubscriptionStatus::Active,
            auto_renew: false,
            payment_status: PaymentStatus::Paid,
            order_id: None,
        })
    }
}

//--------------------------------------    MembershipPage     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MembershipPage {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    /// Memberships that grant access to this page. An empty list means the page is open to everyone.
    #[sqlx(json)]
    pub membership_ids: Vec<i64>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMembershipPage {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub membership_ids: Vec<i64>,
    pub is_published: bool,
}

//--------------------------------------        Funnel         ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelProducts {
    pub main: String,
    pub upsells: Vec<String>,
}

/// Percentage discounts applied to funnel products at checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelDiscounts {
    pub main_percent: i64,
    pub upsell_percent: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub author: String,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Testimonials { items: Vec<Testimonial> },
    Faq { items: Vec<FaqEntry> },
    ProblemSolution { problem: String, solution: String },
    Benefits { items: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Funnel {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[sqlx(json)]
    pub products: FunnelProducts,
    #[sqlx(json)]
    pub discounts: FunnelDiscounts,
    #[sqlx(json)]
    pub countdown: Option<Countdown>,
    #[sqlx(json)]
    pub blocks: Vec<ContentBlock>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Funnel {
    /// The discount that applies to `product_id` when bought through this funnel.
    pub fn discount_for(&self, product_id: &str) -> i64 {
        if self.products.main == product_id {
            self.discounts.main_percent
        } else if self.products.upsells.iter().any(|p| p == product_id) {
            self.discounts.upsell_percent
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewFunnel {
    pub name: String,
    pub slug: String,
    pub products: FunnelProducts,
    pub discounts: FunnelDiscounts,
    pub countdown: Option<Countdown>,
    pub blocks: Vec<ContentBlock>,
    pub is_active: bool,
}

impl Default for NewFunnel {
    fn default() -> Self {
        Self {
            name: String::default(),
            slug: String::default(),
            products: FunnelProducts::default(),
            discounts: FunnelDiscounts::default(),
            countdown: None,
            blocks: Vec::new(),
            is_active: true,
        }
    }
}

//--------------------------------------        Course         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_option: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { id: String, body: String },
    VideoEmbed { id: String, url: String },
    ImageGrid { id: String, images: Vec<String> },
    Quiz { id: String, questions: Vec<QuizQuestion> },
}

impl ContentItem {
    pub fn id(&self) -> &str {
        match self {
            ContentItem::Text { id, .. } |
            ContentItem::VideoEmbed { id, .. } |
            ContentItem::ImageGrid { id, .. } |
            ContentItem::Quiz { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[sqlx(json)]
    pub chapters: Vec<Chapter>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Finds a content item and the chapter that contains it.
    pub fn find_item(&self, item_id: &str) -> Option<(&Chapter, &ContentItem)> {
        self.chapters.iter().find_map(|c| c.items.iter().find(|i| i.id() == item_id).map(|i| (c, i)))
    }

    pub fn total_items(&self) -> usize {
        self.chapters.iter().map(|c| c.items.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CourseProgress {
    pub user_id: String,
    pub course_id: i64,
    #[sqlx(json)]
    pub completed_items: BTreeSet<String>,
    #[sqlx(json)]
    pub completed_chapters: BTreeSet<String>,
    /// Quiz item id to score in percent.
    #[sqlx(json)]
    pub quiz_scores: BTreeMap<String, u8>,
    pub updated_at: DateTime<Utc>,
}

impl CourseProgress {
    pub fn new<S: Into<String>>(user_id: S, course_id: i64) -> Self {
        Self {
            user_id: user_id.into(),
            course_id,
            completed_items: BTreeSet::new(),
            completed_chapters: BTreeSet::new(),
            quiz_scores: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }
}
