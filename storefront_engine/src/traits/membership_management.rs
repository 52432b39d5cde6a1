use chrono::{DateTime, Utc};

use crate::{
    db_types::{Membership, NewMembership, NewSubscription, Subscription, SubscriptionStatus},
    traits::StoreError,
};

/// Storage for memberships and the subscriptions users hold to them.
#[allow(async_fn_in_trait)]
pub trait MembershipManagement {
    async fn insert_membership(&self, membership: NewMembership) -> Result<Membership, StoreError>;

    /// Replaces the editable fields of a membership. Returns `None` if the membership does not exist.
    async fn update_membership(&self, id: i64, membership: NewMembership) -> Result<Option<Membership>, StoreError>;

    /// Deletes a membership along with every subscription to it. Returns `false` if there was nothing to delete.
    async fn delete_membership(&self, id: i64) -> Result<bool, StoreError>;

    async fn fetch_membership(&self, id: i64) -> Result<Option<Membership>, StoreError>;

    async fn fetch_memberships(&self) -> Result<Vec<Membership>, StoreError>;

    /// Fetches the active membership that purchasing `product_id` grants, if any.
    async fn fetch_membership_for_product(&self, product_id: &str) -> Result<Option<Membership>, StoreError>;

    async fn insert_subscription(&self, subscription: NewSubscription) -> Result<Subscription, StoreError>;

    async fn fetch_subscription(&self, id: i64) -> Result<Option<Subscription>, StoreError>;

    async fn fetch_subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError>;

    async fn update_subscription_status(
        &self,
        id: i64,
        status: SubscriptionStatus,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Marks every subscription that is neither expired nor cancelled, and whose `end_date` is at or before `now`,
    /// as `Expired`. Returns the subscriptions that were changed.
    async fn expire_subscriptions(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>, StoreError>;
}
