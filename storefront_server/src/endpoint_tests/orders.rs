use std::sync::Arc;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use storefront_engine::{
    db_types::{Order, OrderStatusType},
    events::EventProducers,
    processors::ProcessorRegistry,
    OrderApi,
};

use super::{
    helpers::{admin_get, admin_post, send_request},
    mocks::MockOrderStore,
};
use crate::{
    email::fixtures,
    routes::{ArchiveOrderRoute, DeleteOrderRoute, OrderByIdRoute, RefundOrderRoute, UpdateOrderStatusRoute},
};

#[actix_web::test]
async fn fetch_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(admin_get("/order/1"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.order_number, "SF-1");
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(admin_get("/order/99"), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order 99 does not exist"}"#);
}

#[actix_web::test]
async fn refund_twice() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(admin_post("/order/2/refund"), configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"Order SF-2 has already been refunded."}"#);
}

#[actix_web::test]
async fn refund_without_payment_reference() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(admin_post("/order/1/refund"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let result: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["order"]["status"], "refunded");
    assert!(result["outcome"].is_null());
}

#[actix_web::test]
async fn same_status_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = admin_post("/order/1/status").set_json(serde_json::json!({ "status": "pending" }));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn delete_unarchived_order() {
    let _ = env_logger::try_init().ok();
    let req = admin_get("/order/1").method(actix_web::http::Method::DELETE);
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("must be archived"), "{body}");
}

#[actix_web::test]
async fn unarchive_completed_order() {
    let _ = env_logger::try_init().ok();
    let req = admin_post("/order/3/archive").set_json(serde_json::json!({ "archived": false }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("must stay archived"), "{body}");
}

fn stored_orders() -> Vec<Order> {
    let pending = fixtures::order();
    let refunded = Order { id: 2, order_number: "SF-2".into(), status: OrderStatusType::Refunded, ..fixtures::order() };
    let completed = Order {
        id: 3,
        order_number: "SF-3".into(),
        status: OrderStatusType::Completed,
        is_archived: true,
        ..fixtures::order()
    };
    vec![pending, refunded, completed]
}

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().returning(|id| Ok(stored_orders().into_iter().find(|o| o.id == id)));
    store.expect_update_order().returning(|id, update| {
        let mut order = stored_orders().into_iter().find(|o| o.id == id);
        if let (Some(order), Some(status)) = (order.as_mut(), update.status) {
            order.status = status;
        }
        Ok(order)
    });
    let api = OrderApi::new(store, EventProducers::default(), Arc::new(ProcessorRegistry::default()));
    cfg.app_data(web::Data::new(api))
        .service(OrderByIdRoute::<MockOrderStore>::new())
        .service(UpdateOrderStatusRoute::<MockOrderStore>::new())
        .service(ArchiveOrderRoute::<MockOrderStore>::new())
        .service(RefundOrderRoute::<MockOrderStore>::new())
        .service(DeleteOrderRoute::<MockOrderStore>::new());
}
