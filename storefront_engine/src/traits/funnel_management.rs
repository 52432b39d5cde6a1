use crate::{
    db_types::{Funnel, NewFunnel},
    traits::StoreError,
};

/// Storage for marketing funnels.
#[allow(async_fn_in_trait)]
pub trait FunnelManagement {
    async fn insert_funnel(&self, funnel: NewFunnel) -> Result<Funnel, StoreError>;

    /// Returns `None` if the funnel does not exist.
    async fn update_funnel(&self, id: i64, funnel: NewFunnel) -> Result<Option<Funnel>, StoreError>;

    async fn delete_funnel(&self, id: i64) -> Result<bool, StoreError>;

    async fn fetch_funnel(&self, id: i64) -> Result<Option<Funnel>, StoreError>;

    async fn fetch_funnel_by_slug(&self, slug: &str) -> Result<Option<Funnel>, StoreError>;

    async fn fetch_funnels(&self) -> Result<Vec<Funnel>, StoreError>;

    /// True if a funnel other than `exclude_id` already uses `slug`.
    async fn funnel_slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, StoreError>;
}
