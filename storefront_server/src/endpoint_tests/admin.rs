use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use sf_common::Secret;
use storefront_engine::{events::EventProducers, order_objects::OrderStats, processors::ProcessorRegistry, OrderApi};

use super::{
    helpers::{admin_get, send_request, ADMIN_KEY},
    mocks::MockOrderStore,
};
use crate::{
    middleware::{AdminKeyMiddlewareFactory, ADMIN_KEY_HEADER},
    routes::{health, OrderStatsRoute},
};

#[actix_web::test]
async fn admin_routes_need_the_admin_key() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/api/orders/stats"), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("The sf_admin_key header is required"), "{body}");
}

#[actix_web::test]
async fn wrong_admin_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/orders/stats").insert_header((ADMIN_KEY_HEADER, "guess"));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. Invalid admin key"}"#);
}

#[actix_web::test]
async fn correct_admin_key() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(admin_get("/api/orders/stats"), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""total_orders":3"#), "{body}");
}

#[actix_web::test]
async fn unset_admin_key_disables_the_admin_api() {
    let _ = env_logger::try_init().ok();
    let (status, _) = send_request(admin_get("/api/orders/stats"), configure_without_key).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn health_is_public() {
    let (status, body) = send_request(TestRequest::get().uri("/health"), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

fn order_api() -> OrderApi<MockOrderStore> {
    let mut store = MockOrderStore::new();
    store.expect_order_stats().returning(|| Ok(OrderStats { total_orders: 3, ..Default::default() }));
    OrderApi::new(store, EventProducers::default(), Arc::new(ProcessorRegistry::default()))
}

fn configure_with_key(cfg: &mut ServiceConfig, key: &str) {
    cfg.app_data(web::Data::new(order_api())).service(health).service(
        web::scope("/api")
            .wrap(AdminKeyMiddlewareFactory::new(Secret::new(key.to_string())))
            .service(OrderStatsRoute::<MockOrderStore>::new()),
    );
}

fn configure(cfg: &mut ServiceConfig) {
    configure_with_key(cfg, ADMIN_KEY);
}

fn configure_without_key(cfg: &mut ServiceConfig) {
    configure_with_key(cfg, "");
}
