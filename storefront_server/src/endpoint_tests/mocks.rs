use mockall::mock;
use storefront_engine::{
    db_types::{Funnel, NewFunnel, NewOrder, Order},
    order_objects::{OrderPage, OrderQuery, OrderStats, OrderUpdate},
    FunnelManagement,
    OrderManagement,
    StoreError,
};

mock! {
    pub OrderStore {}
    impl OrderManagement for OrderStore {
        async fn insert_order(&self, order_number: &str, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StoreError>;
        async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;
        async fn search_orders(&self, query: &OrderQuery) -> Result<OrderPage, StoreError>;
        async fn order_stats(&self) -> Result<OrderStats, StoreError>;
        async fn update_order(&self, id: i64, update: OrderUpdate) -> Result<Option<Order>, StoreError>;
        async fn delete_order(&self, id: i64) -> Result<bool, StoreError>;
    }
}

mock! {
    pub FunnelStore {}
    impl FunnelManagement for FunnelStore {
        async fn insert_funnel(&self, funnel: NewFunnel) -> Result<Funnel, StoreError>;
        async fn update_funnel(&self, id: i64, funnel: NewFunnel) -> Result<Option<Funnel>, StoreError>;
        async fn delete_funnel(&self, id: i64) -> Result<bool, StoreError>;
        async fn fetch_funnel(&self, id: i64) -> Result<Option<Funnel>, StoreError>;
        async fn fetch_funnel_by_slug(&self, slug: &str) -> Result<Option<Funnel>, StoreError>;
        async fn fetch_funnels(&self) -> Result<Vec<Funnel>, StoreError>;
        async fn funnel_slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, StoreError>;
    }
}
