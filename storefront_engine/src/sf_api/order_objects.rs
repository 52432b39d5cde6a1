use std::{collections::BTreeMap, fmt::Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{GatewayIds, Money, Order, OrderStatusType, PaymentMethod},
    processors::RefundOutcome,
};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortField {
    #[default]
    CreatedAt,
    Total,
    OrderNumber,
    Status,
}

impl OrderSortField {
    pub fn column(&self) -> &'static str {
        match self {
            OrderSortField::CreatedAt => "created_at",
            OrderSortField::Total => "total",
            OrderSortField::OrderNumber => "order_number",
            OrderSortField::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { offset: 0, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Clamps the values into a range the database will accept.
    pub fn normalized(self) -> Self {
        Self { offset: self.offset.max(0), limit: self.limit.clamp(1, MAX_PAGE_SIZE) }
    }
}

/// Filter, sort and page parameters for order listings.
///
/// Every filter is optional. An empty query returns the newest orders first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub is_archived: Option<bool>,
    /// Matched against the customer name and email, the order number and the internal id.
    pub search: Option<String>,
    pub exclude_completed: bool,
    pub sort_by: OrderSortField,
    pub direction: SortDirection,
    pub pagination: Pagination,
}

impl OrderQuery {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.is_archived = Some(archived);
        self
    }

    pub fn with_search<S: Into<String>>(mut self, term: S) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn excluding_completed(mut self) -> Self {
        self.exclude_completed = true;
        self
    }

    pub fn sorted_by(mut self, field: OrderSortField, direction: SortDirection) -> Self {
        self.sort_by = field;
        self.direction = direction;
        self
    }

    pub fn paged(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// A stable key for caching the results of this query.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
    }

    pub fn has_filters(&self) -> bool {
        self.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) ||
            self.since.is_some() ||
            self.until.is_some() ||
            self.is_archived.is_some() ||
            self.search.as_ref().map(|s| !s.trim().is_empty()).unwrap_or(false) ||
            self.exclude_completed
    }
}

impl Display for OrderQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(archived) = self.is_archived {
            write!(f, "archived: {archived}. ")?;
        }
        if let Some(search) = &self.search {
            write!(f, "search: {search}. ")?;
        }
        if self.exclude_completed {
            write!(f, "excluding completed. ")?;
        }
        write!(
            f,
            "sort: {} {}. offset {} limit {}",
            self.sort_by.column(),
            self.direction.sql(),
            self.pagination.offset,
            self.pagination.limit
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// The number of orders matching the filters, ignoring pagination.
    pub total_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub count_by_status: BTreeMap<OrderStatusType, i64>,
    /// Sum of the totals of completed orders.
    pub total_revenue: Money,
    pub average_order_value: Money,
}

/// A partial update to an order record. Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatusType>,
    pub is_archived: Option<bool>,
    pub date_paid: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub gateway: Option<GatewayIds>,
}

impl OrderUpdate {
    pub fn status(status: OrderStatusType) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn archived(archived: bool) -> Self {
        Self { is_archived: Some(archived), ..Default::default() }
    }

    pub fn with_date_paid(mut self, date_paid: DateTime<Utc>) -> Self {
        self.date_paid = Some(date_paid);
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.is_archived = Some(archived);
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_gateway(mut self, gateway: GatewayIds) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() &&
            self.is_archived.is_none() &&
            self.date_paid.is_none() &&
            self.payment_method.is_none() &&
            self.gateway.is_none()
    }
}

/// The result of a refund request: the updated order, and what the gateway did with the refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResult {
    pub order: Order,
    pub outcome: Option<RefundOutcome>,
}
