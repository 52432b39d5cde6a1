mod support;

use chrono::{Duration, Utc};
use storefront_engine::{
    db_types::{Money, NewMembership, NewMembershipPage, PaymentStatus, SubscriptionStatus},
    events::EventProducers,
    MembershipApi,
    MembershipError,
};

use crate::support::{fresh_db, tear_down};

fn gold() -> NewMembership {
    NewMembership {
        name: "Gold".into(),
        description: "Everything".into(),
        duration_days: 30,
        price: Money::from(1999),
        product_ids: vec!["gold-monthly".into()],
        ..Default::default()
    }
}

fn page(slug: &str, membership_ids: Vec<i64>) -> NewMembershipPage {
    NewMembershipPage {
        title: "Members only".into(),
        slug: slug.into(),
        content: "<p>Hello</p>".into(),
        membership_ids,
        is_published: true,
    }
}

#[tokio::test]
async fn membership_crud() {
    let db = fresh_db().await;
    let api = MembershipApi::new(db.clone(), EventProducers::default());
    let m = api.create_membership(gold()).await.unwrap();
    assert_eq!(m.product_ids, vec!["gold-monthly".to_string()]);
    let found = api.membership_for_product("gold-monthly").await.unwrap().unwrap();
    assert_eq!(found.id, m.id);
    assert!(api.membership_for_product("silver").await.unwrap().is_none());

    let updated = api.update_membership(m.id, NewMembership { duration_days: 365, ..gold() }).await.unwrap();
    assert_eq!(updated.duration_days, 365);
    let err = api.update_membership(m.id, NewMembership { duration_days: 0, ..gold() }).await.unwrap_err();
    assert!(matches!(err, MembershipError::Validation(_)));

    api.delete_membership(m.id).await.unwrap();
    assert!(api.list_memberships().await.unwrap().is_empty());
    assert!(matches!(api.delete_membership(m.id).await, Err(MembershipError::MembershipNotFound(_))));
    tear_down(db).await;
}

#[tokio::test]
async fn new_memberships_can_be_subscribed_to_immediately() {
    let db = fresh_db().await;
    let api = MembershipApi::new(db.clone(), EventProducers::default());
    for i in 0..25 {
        let m = api.create_membership(gold()).await.unwrap();
        assert!(api.fetch_membership(m.id).await.unwrap().is_some(), "membership {i} was not visible after insert");
        let sub = api.subscribe(&format!("user{i}@example.com"), m.id, None, false).await.unwrap();
        assert_eq!(sub.membership_id, m.id);
    }
    tear_down(db).await;
}

#[tokio::test]
async fn subscriptions_grant_and_lose_access() {
    let db = fresh_db().await;
    let api = MembershipApi::new(db.clone(), EventProducers::default());
    let m = api.create_membership(gold()).await.unwrap();
    let sub = api.subscribe("alice@example.com", m.id, None, true).await.unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.payment_status, PaymentStatus::Paid);
    assert_eq!(sub.end_date - sub.start_date, Duration::days(30));
    assert!(sub.auto_renew);

    let now = Utc::now();
    assert!(api.has_active_access("alice@example.com", m.id, now).await.unwrap());
    assert!(!api.has_active_access("bob@example.com", m.id, now).await.unwrap());
    assert!(!api.has_active_access("alice@example.com", m.id, now + Duration::days(31)).await.unwrap());

    let cancelled = api.cancel_subscription(sub.id).await.unwrap();
    assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
    assert!(!api.has_active_access("alice@example.com", m.id, now).await.unwrap());
    assert!(matches!(api.cancel_subscription(sub.id).await, Err(MembershipError::SubscriptionEnded(_))));
    tear_down(db).await;
}

#[tokio::test]
async fn inactive_memberships_cannot_be_subscribed_to() {
    let db = fresh_db().await;
    let api = MembershipApi::new(db.clone(), EventProducers::default());
    let m = api.create_membership(NewMembership { is_active: false, ..gold() }).await.unwrap();
    let err = api.subscribe("alice@example.com", m.id, None, false).await.unwrap_err();
    assert!(matches!(err, MembershipError::MembershipInactive(_)));
    assert!(matches!(api.subscribe("alice@example.com", 999, None, false).await, Err(MembershipError::MembershipNotFound(999))));
    tear_down(db).await;
}

#[tokio::test]
async fn sweep_expires_lapsed_subscriptions() {
    let db = fresh_db().await;
    let api = MembershipApi::new(db.clone(), EventProducers::default());
    let short = api.create_membership(NewMembership { duration_days: 1, ..gold() }).await.unwrap();
    let long = api.create_membership(NewMembership { name: "Platinum".into(), duration_days: 90, ..gold() }).await.unwrap();
    let a = api.subscribe("alice@example.com", short.id, None, false).await.unwrap();
    let b = api.subscribe("alice@example.com", long.id, None, false).await.unwrap();
    let c = api.subscribe("bob@example.com", short.id, None, false).await.unwrap();
    api.cancel_subscription(c.id).await.unwrap();

    assert!(api.expire_subscriptions(Utc::now()).await.unwrap().is_empty());
    let expired = api.expire_subscriptions(Utc::now() + Duration::days(2)).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, a.id);
    assert_eq!(expired[0].status, SubscriptionStatus::Expired);
    // Already expired subscriptions are not swept twice
    assert!(api.expire_subscriptions(Utc::now() + Duration::days(2)).await.unwrap().is_empty());

    let subs = api.subscriptions_for_user("alice@example.com").await.unwrap();
    let active = subs.iter().find(|s| s.id == b.id).unwrap();
    assert_eq!(active.status, SubscriptionStatus::Active);
    tear_down(db).await;
}

#[tokio::test]
async fn page_slugs_are_unique() {
    let db = fresh_db().await;
    let api = MembershipApi::new(db.clone(), EventProducers::default());
    let first = api.create_page(page("welcome", vec![])).await.unwrap();
    let err = api.create_page(page("welcome", vec![])).await.unwrap_err();
    assert!(matches!(err, MembershipError::DuplicateSlug(ref s) if s == "welcome"));
    let err = api.create_page(NewMembershipPage { is_published: false, ..page("/welcome/", vec![]) }).await.unwrap_err();
    assert!(matches!(err, MembershipError::DuplicateSlug(_)));

    let second = api.create_page(page("bonus", vec![])).await.unwrap();
    let renamed = api.update_page(first.id, NewMembershipPage { title: "Hi".into(), ..page("welcome", vec![]) }).await.unwrap();
    assert_eq!(renamed.title, "Hi");
    let err = api.update_page(second.id, page("welcome", vec![])).await.unwrap_err();
    assert!(matches!(err, MembershipError::DuplicateSlug(_)));
    assert_eq!(api.list_pages().await.unwrap().len(), 2);
    api.delete_page(second.id).await.unwrap();
    assert!(api.fetch_page_by_slug("bonus").await.unwrap().is_none());
    tear_down(db).await;
}

#[tokio::test]
async fn page_access() {
    let db = fresh_db().await;
    let api = MembershipApi::new(db.clone(), EventProducers::default());
    let m = api.create_membership(gold()).await.unwrap();
    api.create_page(page("open", vec![])).await.unwrap();
    api.create_page(page("gold", vec![m.id])).await.unwrap();
    api.create_page(NewMembershipPage { is_published: false, ..page("draft", vec![]) }).await.unwrap();
    api.subscribe("alice@example.com", m.id, None, false).await.unwrap();
    let now = Utc::now();
    assert!(api.can_view_page("bob@example.com", "open", now).await.unwrap());
    assert!(!api.can_view_page("bob@example.com", "gold", now).await.unwrap());
    assert!(api.can_view_page("alice@example.com", "gold", now).await.unwrap());
    assert!(!api.can_view_page("alice@example.com", "draft", now).await.unwrap());
    assert!(matches!(api.can_view_page("alice@example.com", "nope", now).await, Err(MembershipError::PageNotFound(_))));
    tear_down(db).await;
}
