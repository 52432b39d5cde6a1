use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use storefront_engine::{
    db_types::{Countdown, Funnel, FunnelDiscounts, FunnelProducts, NewFunnel},
    FunnelApi,
};

use super::{
    helpers::{admin_post, send_request},
    mocks::MockFunnelStore,
};
use crate::routes::{CreateFunnelRoute, FunnelBySlugRoute, FunnelCountdownRoute};

#[actix_web::test]
async fn create_funnel_without_slug() {
    let _ = env_logger::try_init().ok();
    let req = admin_post("/funnels").set_json(serde_json::json!({ "name": "Test Funnel" }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Fehler beim Erstellen des Funnels: URL-Pfad ist erforderlich"}"#);
}

#[actix_web::test]
async fn create_funnel_with_reversed_countdown() {
    let _ = env_logger::try_init().ok();
    let req = admin_post("/funnels").set_json(serde_json::json!({
        "name": "Test Funnel",
        "slug": "test-funnel",
        "products": { "main": "product-1", "upsells": [] },
        "countdown": { "start_date": "2024-02-20T00:00:00Z", "end_date": "2024-02-19T00:00:00Z" }
    }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Startdatum muss vor dem Enddatum liegen"), "{body}");
}

#[actix_web::test]
async fn create_funnel() {
    let _ = env_logger::try_init().ok();
    let req = admin_post("/funnels").set_json(serde_json::json!({
        "name": "Test Funnel",
        "slug": "test-funnel",
        "products": { "main": "product-1", "upsells": [] }
    }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::CREATED);
    let funnel: Funnel = serde_json::from_str(&body).unwrap();
    assert_eq!(funnel.slug, "test-funnel");
    assert_eq!(funnel.products.main, "product-1");
}

#[actix_web::test]
async fn fetch_funnel_by_slug() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/funnel/spring-sale"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let funnel: Funnel = serde_json::from_str(&body).unwrap();
    assert_eq!(funnel.name, "spring-sale");

    let (status, _) = send_request(TestRequest::get().uri("/funnel/nothing-here"), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn countdown_of_an_open_funnel() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/funnel/spring-sale/countdown"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["state"], "active");
    assert!(json["remaining_seconds"].as_i64().unwrap() > 0);
}

#[actix_web::test]
async fn countdown_of_a_closed_funnel() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/funnel/last-year/countdown"), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"state":"expired","remaining_seconds":0,"redirect_url":"https://shop.example/sold-out"}"#);
}

#[actix_web::test]
async fn funnel_without_countdown_is_always_open() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/funnel/evergreen/countdown"), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"state":"active","remaining_seconds":0,"redirect_url":null}"#);
}

fn funnel(slug: &str) -> Option<Funnel> {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let countdown = match slug {
        "spring-sale" => Some(Countdown::new(created, Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap())),
        "last-year" => Some(
            Countdown::new(created, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
                .with_redirect("https://shop.example/sold-out"),
        ),
        "evergreen" => None,
        _ => return None,
    };
    Some(Funnel {
        id: 1,
        name: slug.to_string(),
        slug: slug.to_string(),
        products: FunnelProducts { main: "product-1".into(), upsells: vec![] },
        discounts: FunnelDiscounts::default(),
        countdown,
        blocks: vec![],
        is_active: true,
        created_at: created,
        updated_at: created,
    })
}

fn insert(new: NewFunnel) -> Funnel {
    let now = Utc::now();
    Funnel {
        id: 7,
        name: new.name,
        slug: new.slug,
        products: new.products,
        discounts: new.discounts,
        countdown: new.countdown,
        blocks: new.blocks,
        is_active: new.is_active,
        created_at: now,
        updated_at: now,
    }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockFunnelStore::new();
    store.expect_fetch_funnel_by_slug().returning(|slug| Ok(funnel(slug)));
    store.expect_funnel_slug_exists().returning(|_, _| Ok(false));
    store.expect_insert_funnel().returning(|new| Ok(insert(new)));
    cfg.app_data(web::Data::new(FunnelApi::new(store)))
        .service(CreateFunnelRoute::<MockFunnelStore>::new())
        .service(FunnelCountdownRoute::<MockFunnelStore>::new())
        .service(FunnelBySlugRoute::<MockFunnelStore>::new());
}
