use crate::{
    db_types::{NewOrder, Order},
    sf_api::order_objects::{OrderPage, OrderQuery, OrderStats, OrderUpdate},
    traits::StoreError,
};

/// Storage for orders.
///
/// Backends only store and query. Business rules (status transitions, archiving rules, caching and events) live in
/// [`crate::OrderApi`].
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order with status `Pending` under the given order number and returns the stored record.
    ///
    /// Order numbers are unique. Re-using one fails with [`StoreError::UniqueViolation`].
    async fn insert_order(&self, order_number: &str, order: NewOrder) -> Result<Order, StoreError>;

    /// Fetches the order with the given internal id. If no order exists, `None` is returned.
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;

    /// Fetches a page of orders matching the query, along with the number of orders that match the filters
    /// irrespective of pagination.
    async fn search_orders(&self, query: &OrderQuery) -> Result<OrderPage, StoreError>;

    /// Aggregate figures over all orders.
    async fn order_stats(&self) -> Result<OrderStats, StoreError>;

    /// Applies a partial update to the order and returns the new record, or `None` if the order does not exist.
    async fn update_order(&self, id: i64, update: OrderUpdate) -> Result<Option<Order>, StoreError>;

    /// Removes the order. Returns `false` if there was nothing to delete.
    async fn delete_order(&self, id: i64) -> Result<bool, StoreError>;
}
