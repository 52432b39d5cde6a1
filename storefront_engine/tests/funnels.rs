mod support;

use chrono::{Duration, TimeZone, Utc};
use storefront_engine::{
    countdown::CountdownState,
    db_types::{Countdown, FunnelProducts, NewFunnel},
    FunnelApi,
    FunnelError,
};

use crate::support::{fresh_db, tear_down};

fn test_funnel() -> NewFunnel {
    NewFunnel {
        name: "Test Funnel".into(),
        slug: "test-funnel".into(),
        products: FunnelProducts { main: "product-1".into(), upsells: vec![] },
        ..Default::default()
    }
}

#[tokio::test]
async fn create_funnel_keeps_its_slug() {
    let db = fresh_db().await;
    let api = FunnelApi::new(db.clone());
    let funnel = api.create_funnel(test_funnel()).await.unwrap();
    assert_eq!(funnel.slug, "test-funnel");
    assert_eq!(funnel.name, "Test Funnel");
    assert!(funnel.is_active);
    let fetched = api.fetch_funnel_by_slug("/test-funnel/").await.unwrap().unwrap();
    assert_eq!(fetched.id, funnel.id);
    assert_eq!(api.list_funnels().await.unwrap().len(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn create_funnel_validation() {
    let db = fresh_db().await;
    let api = FunnelApi::new(db.clone());
    let err = api.create_funnel(NewFunnel { name: "Test Funnel".into(), ..Default::default() }).await.unwrap_err();
    assert!(err.to_string().contains("URL-Pfad ist erforderlich"));
    assert!(err.to_string().starts_with("Fehler beim Erstellen des Funnels: "));

    let countdown = Countdown::new(
        Utc.with_ymd_and_hms(2024, 2, 20, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 2, 19, 0, 0, 0).unwrap(),
    );
    let err = api.create_funnel(NewFunnel { countdown: Some(countdown), ..test_funnel() }).await.unwrap_err();
    assert!(err.to_string().contains("Startdatum muss vor dem Enddatum liegen"));
    assert!(api.list_funnels().await.unwrap().is_empty());
    tear_down(db).await;
}

#[tokio::test]
async fn slugs_are_unique() {
    let db = fresh_db().await;
    let api = FunnelApi::new(db.clone());
    let first = api.create_funnel(test_funnel()).await.unwrap();
    let err = api.create_funnel(NewFunnel { name: "Other".into(), ..test_funnel() }).await.unwrap_err();
    assert!(matches!(err, FunnelError::SlugTaken(_)));
    assert!(err.to_string().contains("URL-Pfad wird bereits verwendet"));

    let second = api.create_funnel(NewFunnel { slug: "second".into(), ..test_funnel() }).await.unwrap();
    // A funnel may keep its own slug when updated, but not take another one's
    let renamed = api.update_funnel(first.id, NewFunnel { name: "Renamed".into(), ..test_funnel() }).await.unwrap();
    assert_eq!(renamed.name, "Renamed");
    let err = api.update_funnel(second.id, test_funnel()).await.unwrap_err();
    assert_eq!(err.to_string(), "Fehler beim Aktualisieren des Funnels: URL-Pfad wird bereits verwendet");
    tear_down(db).await;
}

#[tokio::test]
async fn countdown_status_by_slug() {
    let db = fresh_db().await;
    let api = FunnelApi::new(db.clone());
    let now = Utc::now();
    let countdown = Countdown::new(now - Duration::hours(1), now + Duration::hours(1)).with_redirect("/sold-out");
    api.create_funnel(NewFunnel { countdown: Some(countdown), ..test_funnel() }).await.unwrap();
    let status = api.countdown_status("test-funnel", now).await.unwrap();
    assert_eq!(status.state, CountdownState::Active);
    assert_eq!(status.remaining_seconds, 3600);
    let later = api.countdown_status("test-funnel", now + Duration::hours(2)).await.unwrap();
    assert_eq!(later.state, CountdownState::Expired);
    assert_eq!(later.redirect_url.as_deref(), Some("/sold-out"));

    api.create_funnel(NewFunnel { slug: "evergreen".into(), ..test_funnel() }).await.unwrap();
    let open = api.countdown_status("evergreen", now).await.unwrap();
    assert_eq!(open.state, CountdownState::Active);
    assert!(matches!(api.countdown_status("missing", now).await, Err(FunnelError::NotFound(_))));
    tear_down(db).await;
}

#[tokio::test]
async fn delete_funnel() {
    let db = fresh_db().await;
    let api = FunnelApi::new(db.clone());
    let funnel = api.create_funnel(test_funnel()).await.unwrap();
    api.delete_funnel(funnel.id).await.unwrap();
    assert!(api.fetch_funnel(funnel.id).await.unwrap().is_none());
    assert!(matches!(api.delete_funnel(funnel.id).await, Err(FunnelError::NotFound(_))));
    tear_down(db).await;
}
