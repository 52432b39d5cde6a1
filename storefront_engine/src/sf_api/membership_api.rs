use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{
        Membership,
        MembershipPage,
        MAX_MEMBERSHIP_DAYS,
        NewMembership,
        NewMembershipPage,
        NewSubscription,
        Subscription,
        SubscriptionStatus,
    },
    events::{EventProducers, SubscriptionActivatedEvent},
    helpers::clean_slug,
    sf_api::errors::MembershipError,
    traits::{MembershipManagement, PageManagement},
};

/// Memberships, the subscriptions users hold to them, and the pages those subscriptions unlock.
pub struct MembershipApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for MembershipApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MembershipApi")
    }
}

impl<B: Clone> Clone for MembershipApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> MembershipApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

fn check_membership(membership: &NewMembership) -> Result<(), MembershipError> {
    if membership.name.trim().is_empty() {
        return Err(MembershipError::Validation("A membership name is required".into()));
    }
    if membership.duration_days <= 0 {
        return Err(MembershipError::Validation(format!(
            "The duration must be at least one day, not {}",
            membership.duration_days
        )));
    }
    if membership.duration_days > MAX_MEMBERSHIP_DAYS {
        return Err(MembershipError::Validation(format!(
            "The duration cannot be longer than {MAX_MEMBERSHIP_DAYS} days, not {}",
            membership.duration_days
        )));
    }
    if membership.price.is_negative() {
        return Err(MembershipError::Validation("The price cannot be negative".into()));
    }
    Ok(())
}

fn check_page(page: &NewMembershipPage) -> Result<(), MembershipError> {
    if page.title.trim().is_empty() {
        return Err(MembershipError::Validation("A page title is required".into()));
    }
    if page.slug.is_empty() {
        return Err(MembershipError::Validation("A page slug is required".into()));
    }
    Ok(())
}

impl<B> MembershipApi<B>
where B: MembershipManagement
{
    pub async fn create_membership(&self, membership: NewMembership) -> Result<Membership, MembershipError> {
        check_membership(&membership)?;
        let membership = self.db.insert_membership(membership).await?;
        info!("🎫️ Membership #{} '{}' created", membership.id, membership.name);
        Ok(membership)
    }

    pub async fn update_membership(&self, id: i64, membership: NewMembership) -> Result<Membership, MembershipError> {
        check_membership(&membership)?;
        let membership =
            self.db.update_membership(id, membership).await?.ok_or(MembershipError::MembershipNotFound(id))?;
        info!("🎫️ Membership #{id} updated");
        Ok(membership)
    }

    /// Deletes a membership. Subscriptions to it are deleted along with it.
    pub async fn delete_membership(&self, id: i64) -> Result<(), MembershipError> {
        if !self.db.delete_membership(id).await? {
            return Err(MembershipError::MembershipNotFound(id));
        }
        info!("🎫️ Membership #{id} deleted");
        Ok(())
    }

    pub async fn fetch_membership(&self, id: i64) -> Result<Option<Membership>, MembershipError> {
        Ok(self.db.fetch_membership(id).await?)
    }

    pub async fn list_memberships(&self) -> Result<Vec<Membership>, MembershipError> {
        Ok(self.db.fetch_memberships().await?)
    }

    /// The active membership granted by buying `product_id`, if there is one.
    pub async fn membership_for_product(&self, product_id: &str) -> Result<Option<Membership>, MembershipError> {
        Ok(self.db.fetch_membership_for_product(product_id).await?)
    }

    /// Subscribes a user to a membership, starting now and running for the membership's duration.
    ///
    /// The new subscription is `Active` and `Paid`. A `SubscriptionActivated` event is emitted.
    pub async fn subscribe(
        &self,
        user_id: &str,
        membership_id: i64,
        order_id: Option<i64>,
        auto_renew: bool,
    ) -> Result<Subscription, MembershipError> {
        if user_id.trim().is_empty() {
            return Err(MembershipError::Validation("A user id is required".into()));
        }
        let membership =
            self.db.fetch_membership(membership_id).await?.ok_or(MembershipError::MembershipNotFound(membership_id))?;
        if !membership.is_active {
            return Err(MembershipError::MembershipInactive(membership_id));
        }
        let Some(mut new_sub) = NewSubscription::for_membership(user_id.to_string(), &membership, Utc::now()) else {
            return Err(MembershipError::Validation(format!(
                "Membership {membership_id} runs for {} days, which has no valid end date",
                membership.duration_days
            )));
        };
        new_sub.order_id = order_id;
        new_sub.auto_renew = auto_renew;
        let subscription = self.db.insert_subscription(new_sub).await?;
        info!(
            "🎫️ {user_id} subscribed to '{}' until {} (subscription #{})",
            membership.name, subscription.end_date, subscription.id
        );
        self.producers
            .publish_subscription_activated(SubscriptionActivatedEvent::new(subscription.clone(), membership))
            .await;
        Ok(subscription)
    }

    pub async fn cancel_subscription(&self, id: i64) -> Result<Subscription, MembershipError> {
        let subscription = self.db.fetch_subscription(id).await?.ok_or(MembershipError::SubscriptionNotFound(id))?;
        if matches!(subscription.status, SubscriptionStatus::Cancelled | SubscriptionStatus::Expired) {
            return Err(MembershipError::SubscriptionEnded(id));
        }
        let subscription = self
            .db
            .update_subscription_status(id, SubscriptionStatus::Cancelled)
            .await?
            .ok_or(MembershipError::SubscriptionNotFound(id))?;
        info!("🎫️ Subscription #{id} for {} cancelled", subscription.user_id);
        Ok(subscription)
    }

    pub async fn subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Subscription>, MembershipError> {
        Ok(self.db.fetch_subscriptions_for_user(user_id).await?)
    }

    /// True if the user holds a subscription to the membership that is active at `now`.
    pub async fn has_active_access(
        &self,
        user_id: &str,
        membership_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, MembershipError> {
        let subscriptions = self.db.fetch_subscriptions_for_user(user_id).await?;
        Ok(subscriptions.iter().any(|s| s.membership_id == membership_id && s.grants_access_at(now)))
    }

    /// Marks every subscription that has run out by `now` as `Expired`, and returns them.
    pub async fn expire_subscriptions(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>, MembershipError> {
        let expired = self.db.expire_subscriptions(now).await?;
        if !expired.is_empty() {
            info!("🎫️ {} subscriptions have expired", expired.len());
        }
        Ok(expired)
    }
}

impl<B> MembershipApi<B>
where B: MembershipManagement + PageManagement
{
    /// Creates a membership page. Slugs are unique across all pages, published or not.
    pub async fn create_page(&self, mut page: NewMembershipPage) -> Result<MembershipPage, MembershipError> {
        page.slug = clean_slug(&page.slug);
        check_page(&page)?;
        if self.db.page_slug_exists(&page.slug, None).await? {
            return Err(MembershipError::DuplicateSlug(page.slug));
        }
        let page = self.db.insert_page(page).await?;
        info!("🎫️ Membership page /{} created", page.slug);
        Ok(page)
    }

    pub async fn update_page(&self, id: i64, mut page: NewMembershipPage) -> Result<MembershipPage, MembershipError> {
        page.slug = clean_slug(&page.slug);
        check_page(&page)?;
        if self.db.page_slug_exists(&page.slug, Some(id)).await? {
            return Err(MembershipError::DuplicateSlug(page.slug));
        }
        let page = self.db.update_page(id, page).await?.ok_or_else(|| MembershipError::PageNotFound(id.to_string()))?;
        info!("🎫️ Membership page #{id} updated");
        Ok(page)
    }

    pub async fn delete_page(&self, id: i64) -> Result<(), MembershipError> {
        if !self.db.delete_page(id).await? {
            return Err(MembershipError::PageNotFound(id.to_string()));
        }
        info!("🎫️ Membership page #{id} deleted");
        Ok(())
    }

    pub async fn fetch_page_by_slug(&self, slug: &str) -> Result<Option<MembershipPage>, MembershipError> {
        Ok(self.db.fetch_page_by_slug(&clean_slug(slug)).await?)
    }

    pub async fn list_pages(&self) -> Result<Vec<MembershipPage>, MembershipError> {
        Ok(self.db.fetch_pages().await?)
    }

    /// Whether `user_id` may read the page at `slug`.
    ///
    /// Unpublished pages are hidden from everyone. A published page that is not tied to any membership is open to
    /// all, otherwise the user needs an active subscription to at least one of the page's memberships.
    pub async fn can_view_page(&self, user_id: &str, slug: &str, now: DateTime<Utc>) -> Result<bool, MembershipError> {
        let page = self.fetch_page_by_slug(slug).await?.ok_or_else(|| MembershipError::PageNotFound(slug.to_string()))?;
        if !page.is_published {
            return Ok(false);
        }
        if page.membership_ids.is_empty() {
            return Ok(true);
        }
        let subscriptions = self.db.fetch_subscriptions_for_user(user_id).await?;
        let allowed = subscriptions.iter().any(|s| page.membership_ids.contains(&s.membership_id) && s.grants_access_at(now));
        trace!("🎫️ {user_id} access to /{}: {allowed}", page.slug);
        Ok(allowed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::Money;

    #[test]
    fn membership_rules() {
        let ok = NewMembership { name: "Gold".into(), ..Default::default() };
        assert!(check_membership(&ok).is_ok());
        assert!(check_membership(&NewMembership::default()).is_err());
        let zero_days = NewMembership { duration_days: 0, ..ok.clone() };
        assert!(matches!(check_membership(&zero_days), Err(MembershipError::Validation(_))));
        let forever = NewMembership { duration_days: 1_000_000_000, ..ok.clone() };
        assert!(matches!(check_membership(&forever), Err(MembershipError::Validation(_))));
        let century = NewMembership { duration_days: MAX_MEMBERSHIP_DAYS, ..ok.clone() };
        assert!(check_membership(&century).is_ok());
        let negative = NewMembership { price: Money::from(-1), ..ok };
        assert!(check_membership(&negative).is_err());
    }

    #[test]
    fn page_rules() {
        let page = NewMembershipPage { title: "Welcome".into(), slug: "welcome".into(), ..Default::default() };
        assert!(check_page(&page).is_ok());
        let no_slug = NewMembershipPage { slug: String::new(), ..page };
        assert!(check_page(&no_slug).is_err());
    }
}
