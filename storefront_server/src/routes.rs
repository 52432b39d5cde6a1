//! Request handler definitions
//!
//! Define each route and its handler here. Handlers should do little more than unpack the request, call into the
//! storefront engine, and pack up the response. Anything longer belongs in the engine.
//!
//! Handlers are generic over the storage backend so that the endpoint tests can swap in mocks. Since actix cannot
//! register generic handlers directly, each one is wrapped with the [`route!`] macro, which generates a
//! `HttpServiceFactory` struct named after the handler, e.g. `order_by_id` becomes `OrderByIdRoute<B>`.
//!
//! All handlers are async. Never block a worker thread in a handler; use the async APIs for I/O instead.
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use storefront_engine::{
    checkout_objects::CheckoutRequest,
    db_types::{NewCourse, NewFunnel, NewMembership, NewMembershipPage, NewProduct},
    order_objects::{OrderQuery, Pagination},
    CheckoutApi,
    CourseApi,
    CourseManagement,
    FunnelApi,
    FunnelManagement,
    MembershipApi,
    MembershipManagement,
    OrderApi,
    OrderManagement,
    PageManagement,
    ProductApi,
    ProductManagement,
};

use crate::{
    data_objects::{
        ArchiveParams,
        CompleteItemParams,
        JsonResponse,
        OrderListParams,
        PageView,
        PageViewParams,
        QuizParams,
        StatusUpdateParams,
        SubscribeParams,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

fn not_found(what: &str, id: impl std::fmt::Display) -> ServerError {
    ServerError::NoRecordFound(format!("{what} {id} does not exist"))
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl OrderManagement, FunnelManagement, MembershipManagement, ProductManagement);
/// Starts a checkout. Prices come from the product catalogue. The order is stored as pending and a payment session is
/// opened with the chosen gateway. The response carries the order and the session, whose `url` the customer should
/// be sent to.
pub async fn checkout<A>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: OrderManagement + FunnelManagement + MembershipManagement + ProductManagement,
{
    let request = body.into_inner();
    debug!("💻️ POST checkout for {} via {}", request.customer_email, request.payment_method);
    let started = api.start_checkout(request).await?;
    Ok(HttpResponse::Ok().json(started))
}

route!(complete_checkout => Post "/checkout/{order_id}/complete" impl OrderManagement, FunnelManagement, MembershipManagement, ProductManagement);
/// Called when the customer returns from the gateway. The payment is verified with the gateway, and on success the
/// order is completed and any memberships bought with it are granted. Refunded, cancelled and failed orders are
/// rejected with a conflict.
pub async fn complete_checkout<A>(
    path: web::Path<i64>,
    api: web::Data<CheckoutApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: OrderManagement + FunnelManagement + MembershipManagement + ProductManagement,
{
    let order_id = path.into_inner();
    debug!("💻️ POST complete checkout for order #{order_id}");
    let outcome = api.complete_checkout(order_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

//----------------------------------------------   Funnels (public)  --------------------------------------------
route!(funnel_by_slug => Get "/funnel/{slug}" impl FunnelManagement);
pub async fn funnel_by_slug<A: FunnelManagement>(
    path: web::Path<String>,
    api: web::Data<FunnelApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let slug = path.into_inner();
    trace!("💻️ GET funnel /{slug}");
    let funnel = api.fetch_funnel_by_slug(&slug).await?.ok_or_else(|| not_found("Funnel", &slug))?;
    Ok(HttpResponse::Ok().json(funnel))
}

route!(funnel_countdown => Get "/funnel/{slug}/countdown" impl FunnelManagement);
pub async fn funnel_countdown<A: FunnelManagement>(
    path: web::Path<String>,
    api: web::Data<FunnelApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let slug = path.into_inner();
    trace!("💻️ GET countdown for funnel /{slug}");
    let status = api.countdown_status(&slug, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(status))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders => Get "/orders" impl OrderManagement);
/// Lists orders. See [`OrderListParams`] for the accepted query parameters.
pub async fn orders<A: OrderManagement>(
    query: web::Query<OrderListParams>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let query = OrderQuery::try_from(query.into_inner())?;
    debug!("💻️ GET orders. {query}");
    let page = api.list_orders(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(active_orders => Get "/orders/active" impl OrderManagement);
pub async fn active_orders<A: OrderManagement>(
    query: web::Query<Pagination>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET active orders");
    let page = api.active_orders(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(order_stats => Get "/orders/stats" impl OrderManagement);
pub async fn order_stats<A: OrderManagement>(api: web::Data<OrderApi<A>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET order stats");
    let stats = api.order_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

route!(clear_order_cache => Post "/orders/cache/clear" impl OrderManagement);
pub async fn clear_order_cache<A: OrderManagement>(api: web::Data<OrderApi<A>>) -> HttpResponse {
    info!("💻️ Clearing the order cache");
    api.clear_cache();
    HttpResponse::Ok().json(JsonResponse::success("Order cache cleared"))
}

route!(order_by_id => Get "/order/{id}" impl OrderManagement);
pub async fn order_by_id<A: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET order #{id}");
    let order = api.fetch_order(id).await?.ok_or_else(|| not_found("Order", id))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Post "/order/{id}/status" impl OrderManagement);
pub async fn update_order_status<A: OrderManagement>(
    path: web::Path<i64>,
    body: web::Json<StatusUpdateParams>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let StatusUpdateParams { status } = body.into_inner();
    info!("💻️ Changing status of order #{id} to {status}");
    let order = api.update_status(id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(archive_order => Post "/order/{id}/archive" impl OrderManagement);
pub async fn archive_order<A: OrderManagement>(
    path: web::Path<i64>,
    body: web::Json<ArchiveParams>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let archived = body.archived;
    info!("💻️ Setting archived={archived} on order #{id}");
    let order = api.set_archived(id, archived).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(refund_order => Post "/order/{id}/refund" impl OrderManagement);
/// Refunds an order. If the order was paid through a gateway, the refund is issued there first. The response carries
/// the refunded order and the gateway's answer, if any.
pub async fn refund_order<A: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ Refunding order #{id}");
    let result = api.refund_order(id).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(delete_order => Delete "/order/{id}" impl OrderManagement);
/// Deletes an order for good. Only archived orders can be deleted.
pub async fn delete_order<A: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ Deleting order #{id}");
    let order = api.delete_order(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {} deleted", order.order_number))))
}

//----------------------------------------------   Funnels (admin)  ---------------------------------------------
route!(funnels => Get "/funnels" impl FunnelManagement);
pub async fn funnels<A: FunnelManagement>(api: web::Data<FunnelApi<A>>) -> Result<HttpResponse, ServerError> {
    let funnels = api.list_funnels().await?;
    Ok(HttpResponse::Ok().json(funnels))
}

route!(create_funnel => Post "/funnels" impl FunnelManagement);
pub async fn create_funnel<A: FunnelManagement>(
    body: web::Json<NewFunnel>,
    api: web::Data<FunnelApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let funnel = api.create_funnel(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(funnel))
}

route!(update_funnel => Put "/funnel/{id}" impl FunnelManagement);
pub async fn update_funnel<A: FunnelManagement>(
    path: web::Path<i64>,
    body: web::Json<NewFunnel>,
    api: web::Data<FunnelApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let funnel = api.update_funnel(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(funnel))
}

route!(delete_funnel => Delete "/funnel/{id}" impl FunnelManagement);
pub async fn delete_funnel<A: FunnelManagement>(
    path: web::Path<i64>,
    api: web::Data<FunnelApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_funnel(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Funnel {id} deleted"))))
}

//----------------------------------------------   Products  ---------------------------------------------------
route!(products => Get "/products" impl ProductManagement);
pub async fn products<A: ProductManagement>(api: web::Data<ProductApi<A>>) -> Result<HttpResponse, ServerError> {
    let products = api.list_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(save_product => Put "/products" impl ProductManagement);
/// Adds a product to the catalogue, or replaces the product with the same `product_id`.
pub async fn save_product<A: ProductManagement>(
    body: web::Json<NewProduct>,
    api: web::Data<ProductApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.save_product(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/product/{product_id}" impl ProductManagement);
pub async fn delete_product<A: ProductManagement>(
    path: web::Path<String>,
    api: web::Data<ProductApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    info!("💻️ Removing product {product_id}");
    api.delete_product(&product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {product_id} deleted"))))
}

//----------------------------------------------   Memberships  ------------------------------------------------
route!(memberships => Get "/memberships" impl MembershipManagement);
pub async fn memberships<A: MembershipManagement>(
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let memberships = api.list_memberships().await?;
    Ok(HttpResponse::Ok().json(memberships))
}

route!(create_membership => Post "/memberships" impl MembershipManagement);
pub async fn create_membership<A: MembershipManagement>(
    body: web::Json<NewMembership>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let membership = api.create_membership(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(membership))
}

route!(update_membership => Put "/membership/{id}" impl MembershipManagement);
pub async fn update_membership<A: MembershipManagement>(
    path: web::Path<i64>,
    body: web::Json<NewMembership>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let membership = api.update_membership(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(membership))
}

route!(delete_membership => Delete "/membership/{id}" impl MembershipManagement);
pub async fn delete_membership<A: MembershipManagement>(
    path: web::Path<i64>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_membership(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Membership {id} deleted"))))
}

//----------------------------------------------   Subscriptions  ----------------------------------------------
route!(subscriptions_for_user => Get "/subscriptions/{user_id}" impl MembershipManagement);
pub async fn subscriptions_for_user<A: MembershipManagement>(
    path: web::Path<String>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    trace!("💻️ GET subscriptions for {user_id}");
    let subscriptions = api.subscriptions_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(subscriptions))
}

route!(subscribe => Post "/subscriptions" impl MembershipManagement);
/// Grants a membership by hand, e.g. for a bank transfer or a complimentary account.
pub async fn subscribe<A: MembershipManagement>(
    body: web::Json<SubscribeParams>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let SubscribeParams { user_id, membership_id, order_id, auto_renew } = body.into_inner();
    info!("💻️ Subscribing {user_id} to membership #{membership_id}");
    let subscription = api.subscribe(&user_id, membership_id, order_id, auto_renew).await?;
    Ok(HttpResponse::Created().json(subscription))
}

route!(cancel_subscription => Post "/subscription/{id}/cancel" impl MembershipManagement);
pub async fn cancel_subscription<A: MembershipManagement>(
    path: web::Path<i64>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ Cancelling subscription #{id}");
    let subscription = api.cancel_subscription(id).await?;
    Ok(HttpResponse::Ok().json(subscription))
}

//----------------------------------------------   Membership pages  -------------------------------------------
route!(pages => Get "/pages" impl MembershipManagement, PageManagement);
pub async fn pages<A>(api: web::Data<MembershipApi<A>>) -> Result<HttpResponse, ServerError>
where A: MembershipManagement + PageManagement {
    let pages = api.list_pages().await?;
    Ok(HttpResponse::Ok().json(pages))
}

route!(create_page => Post "/pages" impl MembershipManagement, PageManagement);
pub async fn create_page<A>(
    body: web::Json<NewMembershipPage>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: MembershipManagement + PageManagement,
{
    let page = api.create_page(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(page))
}

route!(update_page => Put "/page/{id}" impl MembershipManagement, PageManagement);
pub async fn update_page<A>(
    path: web::Path<i64>,
    body: web::Json<NewMembershipPage>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: MembershipManagement + PageManagement,
{
    let page = api.update_page(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(delete_page => Delete "/page/{id}" impl MembershipManagement, PageManagement);
pub async fn delete_page<A>(path: web::Path<i64>, api: web::Data<MembershipApi<A>>) -> Result<HttpResponse, ServerError>
where A: MembershipManagement + PageManagement {
    let id = path.into_inner();
    api.delete_page(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Page {id} deleted"))))
}

route!(page_by_slug => Get "/page/{slug}" impl MembershipManagement, PageManagement);
/// Fetches a membership page. With `?user_id=..`, the response says whether that user may view it, and the content
/// is withheld if not. Without a user, the full page is returned.
pub async fn page_by_slug<A>(
    path: web::Path<String>,
    query: web::Query<PageViewParams>,
    api: web::Data<MembershipApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: MembershipManagement + PageManagement,
{
    let slug = path.into_inner();
    let page = api.fetch_page_by_slug(&slug).await?.ok_or_else(|| not_found("Page", &slug))?;
    let can_view = match &query.user_id {
        Some(user_id) => api.can_view_page(user_id, &slug, Utc::now()).await?,
        None => true,
    };
    Ok(HttpResponse::Ok().json(PageView::new(page, can_view)))
}

//----------------------------------------------   Courses  ----------------------------------------------------
route!(courses => Get "/courses" impl CourseManagement);
pub async fn courses<A: CourseManagement>(api: web::Data<CourseApi<A>>) -> Result<HttpResponse, ServerError> {
    let courses = api.list_courses().await?;
    Ok(HttpResponse::Ok().json(courses))
}

route!(create_course => Post "/courses" impl CourseManagement);
pub async fn create_course<A: CourseManagement>(
    body: web::Json<NewCourse>,
    api: web::Data<CourseApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let course = api.create_course(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(course))
}

route!(course_by_id => Get "/course/{id}" impl CourseManagement);
pub async fn course_by_id<A: CourseManagement>(
    path: web::Path<i64>,
    api: web::Data<CourseApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let course = api.fetch_course(id).await?.ok_or_else(|| not_found("Course", id))?;
    Ok(HttpResponse::Ok().json(course))
}

route!(course_progress => Get "/course/{id}/progress/{user_id}" impl CourseManagement);
pub async fn course_progress<A: CourseManagement>(
    path: web::Path<(i64, String)>,
    api: web::Data<CourseApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let (course_id, user_id) = path.into_inner();
    let progress = api.progress(&user_id, course_id).await?;
    Ok(HttpResponse::Ok().json(progress))
}

route!(complete_course_item => Post "/course/{id}/progress/{user_id}/complete" impl CourseManagement);
pub async fn complete_course_item<A: CourseManagement>(
    path: web::Path<(i64, String)>,
    body: web::Json<CompleteItemParams>,
    api: web::Data<CourseApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let (course_id, user_id) = path.into_inner();
    debug!("💻️ {user_id} completed {} in course #{course_id}", body.item_id);
    let progress = api.complete_item(&user_id, course_id, &body.item_id).await?;
    Ok(HttpResponse::Ok().json(progress))
}

route!(submit_quiz => Post "/course/{id}/progress/{user_id}/quiz" impl CourseManagement);
pub async fn submit_quiz<A: CourseManagement>(
    path: web::Path<(i64, String)>,
    body: web::Json<QuizParams>,
    api: web::Data<CourseApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let (course_id, user_id) = path.into_inner();
    let QuizParams { item_id, answers } = body.into_inner();
    debug!("💻️ {user_id} submitted quiz {item_id} in course #{course_id}");
    let result = api.record_quiz_score(&user_id, course_id, &item_id, &answers).await?;
    Ok(HttpResponse::Ok().json(result))
}
