use std::str::FromStr;

use cucumber::{then, when};
use storefront_engine::{
    db_types::{FunnelProducts, LineItem, Money, NewFunnel, NewOrder, OrderStatusType},
    order_objects::OrderQuery,
    OrderError,
};

use crate::cucumber::StorefrontWorld;

fn status(s: &str) -> OrderStatusType {
    OrderStatusType::from_str(s).expect("Not a valid order status")
}

#[when(expr = "{word} places order {word} for {word} costing {int} cents")]
async fn place_order(world: &mut StorefrontWorld, customer: String, name: String, product: String, price: i64) {
    let email = format!("{}@example.com", customer.to_lowercase());
    let items = vec![LineItem::new(product.clone(), product, 1, Money::from(price))];
    let order = NewOrder::new(customer, email, items);
    let order = world.system().orders.create_order(order).await.expect("Error creating order");
    world.orders.insert(name, order);
}

#[when(expr = "order {word} is marked as {word}")]
async fn mark_order(world: &mut StorefrontWorld, name: String, new_status: String) {
    let id = world.order(&name).id;
    let result = world.system().orders.update_status(id, status(&new_status)).await;
    match result {
        Ok(order) => {
            world.orders.insert(name, order);
            world.last_order_error = None;
        },
        Err(e) => world.last_order_error = Some(e),
    }
}

#[when(expr = "order {word} is archived")]
async fn archive_order(world: &mut StorefrontWorld, name: String) {
    let id = world.order(&name).id;
    let order = world.system().orders.set_archived(id, true).await.expect("Error archiving order");
    world.orders.insert(name, order);
}

#[when(expr = "order {word} is refunded")]
async fn refund_order(world: &mut StorefrontWorld, name: String) {
    let id = world.order(&name).id;
    let result = world.system().orders.refund_order(id).await;
    match result {
        Ok(result) => {
            world.orders.insert(name, result.order);
            world.last_order_error = None;
        },
        Err(e) => world.last_order_error = Some(e),
    }
}

#[when(expr = "I delete order {word}")]
async fn delete_order(world: &mut StorefrontWorld, name: String) {
    let id = world.order(&name).id;
    let result = world.system().orders.delete_order(id).await;
    world.last_order_error = result.err();
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut StorefrontWorld, name: String, expected: String) {
    let id = world.order(&name).id;
    let order = world.system().orders.fetch_order(id).await.expect("Error fetching order").expect("Order missing");
    assert_eq!(order.status, status(&expected));
}

#[then(expr = "order {word} is archived and has a payment date")]
async fn check_archived(world: &mut StorefrontWorld, name: String) {
    let id = world.order(&name).id;
    let order = world.system().orders.fetch_order(id).await.expect("Error fetching order").expect("Order missing");
    assert!(order.is_archived, "Order is not archived");
    assert!(order.date_paid.is_some(), "Order has no payment date");
}

#[then(expr = "order {word} no longer exists")]
async fn check_deleted(world: &mut StorefrontWorld, name: String) {
    let id = world.order(&name).id;
    let order = world.system().orders.fetch_order(id).await.expect("Error fetching order");
    assert!(order.is_none(), "Order still exists");
}

#[then(expr = "the order request fails with {string}")]
async fn check_order_error(world: &mut StorefrontWorld, expected: String) {
    let err = world.last_order_error.as_ref().expect("The last order request did not fail");
    let kind = match err {
        OrderError::NotArchived(_) => "not archived",
        OrderError::AlreadyRefunded(_) => "already refunded",
        OrderError::TransitionForbidden { .. } => "forbidden transition",
        OrderError::NoOp => "no change",
        other => panic!("Unexpected error: {other}"),
    };
    assert_eq!(kind, expected);
}

#[then(expr = "there are {int} active orders")]
async fn check_active(world: &mut StorefrontWorld, count: i64) {
    let page = world.system().orders.active_orders(Default::default()).await.expect("Error listing orders");
    assert_eq!(page.total_count, count);
}

#[then(expr = "there are {int} orders with status {word}")]
async fn check_count_by_status(world: &mut StorefrontWorld, count: i64, status_name: String) {
    let query = OrderQuery::default().with_status(status(&status_name));
    let page = world.system().orders.list_orders(&query).await.expect("Error listing orders");
    assert_eq!(page.total_count, count);
}

#[when(expr = "I create a funnel named {string} at {string} selling {string}")]
async fn create_funnel(world: &mut StorefrontWorld, name: String, slug: String, product: String) {
    let products = FunnelProducts { main: product, upsells: vec![] };
    let funnel = NewFunnel { name, slug, products, ..Default::default() };
    let result = world.system().funnels.create_funnel(funnel).await;
    world.last_funnel_error = result.err().map(|e| e.to_string());
}

#[then(expr = "the funnel at {string} exists")]
async fn check_funnel(world: &mut StorefrontWorld, slug: String) {
    let funnel = world.system().funnels.fetch_funnel_by_slug(&slug).await.expect("Error fetching funnel");
    assert!(funnel.is_some(), "Funnel {slug} does not exist");
}

#[then(expr = "the funnel request fails with {string}")]
async fn check_funnel_error(world: &mut StorefrontWorld, expected: String) {
    let err = world.last_funnel_error.as_ref().expect("The last funnel request did not fail");
    assert!(err.contains(&expected), "'{err}' does not contain '{expected}'");
}
