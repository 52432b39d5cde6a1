use crate::{
    db_types::{MembershipPage, NewMembershipPage},
    traits::StoreError,
};

/// Storage for membership content pages.
#[allow(async_fn_in_trait)]
pub trait PageManagement {
    async fn insert_page(&self, page: NewMembershipPage) -> Result<MembershipPage, StoreError>;

    /// Returns `None` if the page does not exist.
    async fn update_page(&self, id: i64, page: NewMembershipPage) -> Result<Option<MembershipPage>, StoreError>;

    async fn delete_page(&self, id: i64) -> Result<bool, StoreError>;

    async fn fetch_page(&self, id: i64) -> Result<Option<MembershipPage>, StoreError>;

    async fn fetch_page_by_slug(&self, slug: &str) -> Result<Option<MembershipPage>, StoreError>;

    async fn fetch_pages(&self) -> Result<Vec<MembershipPage>, StoreError>;

    /// True if a page other than `exclude_id` already uses `slug`.
    async fn page_slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, StoreError>;
}
