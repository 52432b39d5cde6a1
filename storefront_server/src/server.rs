use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use gateway_clients::register_default_processors;
use log::*;
use storefront_engine::{
    cache::OrderCache,
    events::EventProducers,
    processors::ProcessorRegistry,
    CheckoutApi,
    CourseApi,
    FunnelApi,
    MembershipApi,
    OrderApi,
    ProductApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    email::EmailService,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::email::create_email_event_handlers,
    middleware::AdminKeyMiddlewareFactory,
    routes::{
        health,
        ActiveOrdersRoute,
        ArchiveOrderRoute,
        CancelSubscriptionRoute,
        CheckoutRoute,
        ClearOrderCacheRoute,
        CompleteCheckoutRoute,
        CompleteCourseItemRoute,
        CourseByIdRoute,
        CourseProgressRoute,
        CoursesRoute,
        CreateCourseRoute,
        CreateFunnelRoute,
        CreateMembershipRoute,
        CreatePageRoute,
        DeleteFunnelRoute,
        DeleteMembershipRoute,
        DeleteOrderRoute,
        DeletePageRoute,
        DeleteProductRoute,
        FunnelBySlugRoute,
        FunnelCountdownRoute,
        FunnelsRoute,
        MembershipsRoute,
        OrderByIdRoute,
        OrderStatsRoute,
        OrdersRoute,
        PageBySlugRoute,
        PagesRoute,
        ProductsRoute,
        RefundOrderRoute,
        SaveProductRoute,
        SubmitQuizRoute,
        SubscribeRoute,
        SubscriptionsForUserRoute,
        UpdateFunnelRoute,
        UpdateMembershipRoute,
        UpdateOrderStatusRoute,
        UpdatePageRoute,
    },
};

const DB_MAX_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_MAX_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Database ready at {}", config.database_url);

    let mut registry = ProcessorRegistry::default();
    register_default_processors(&mut registry);
    let processors = Arc::new(registry);

    let email = EmailService::from_config(&config.email, config.environment, &config.public_url);
    let handlers = create_email_event_handlers(email);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let _worker = start_expiry_worker(db.clone(), producers.clone(), config.subscription_sweep_interval);
    info!("💻️ Starting storefront server on {}:{} ({})", config.host, config.port, config.environment);
    let srv = create_server_instance(config, db, producers, processors)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Everything the workers share. Each worker builds its APIs from a clone of this.
#[derive(Clone)]
pub struct SharedState<B> {
    db: B,
    producers: EventProducers,
    processors: Arc<ProcessorRegistry>,
    order_cache: OrderCache,
}

impl<B: Clone> SharedState<B> {
    pub fn new(db: B, producers: EventProducers, processors: Arc<ProcessorRegistry>) -> Self {
        Self { db, producers, processors, order_cache: OrderCache::default() }
    }

    /// An order API that reads and clears the same cache as every other worker's.
    pub fn order_api(&self) -> OrderApi<B> {
        OrderApi::new_with_cache(
            self.db.clone(),
            self.producers.clone(),
            Arc::clone(&self.processors),
            self.order_cache.clone(),
        )
    }
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    processors: Arc<ProcessorRegistry>,
) -> Result<Server, ServerError> {
    let state = SharedState::new(db, producers, processors);
    let srv = HttpServer::new(move || {
        let db = state.db.clone();
        let orders_api = state.order_api();
        let checkout_api = CheckoutApi::new(orders_api.clone());
        let funnel_api = FunnelApi::new(db.clone());
        let membership_api = MembershipApi::new(db.clone(), state.producers.clone());
        let course_api = CourseApi::new(db.clone());
        let product_api = ProductApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sf::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(funnel_api))
            .app_data(web::Data::new(membership_api))
            .app_data(web::Data::new(course_api))
            .app_data(web::Data::new(product_api));
        let admin_scope = web::scope("/api")
            .wrap(AdminKeyMiddlewareFactory::new(config.admin_api_key.clone()))
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(ActiveOrdersRoute::<SqliteDatabase>::new())
            .service(OrderStatsRoute::<SqliteDatabase>::new())
            .service(ClearOrderCacheRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(ArchiveOrderRoute::<SqliteDatabase>::new())
            .service(RefundOrderRoute::<SqliteDatabase>::new())
            .service(DeleteOrderRoute::<SqliteDatabase>::new())
            .service(FunnelsRoute::<SqliteDatabase>::new())
            .service(CreateFunnelRoute::<SqliteDatabase>::new())
            .service(UpdateFunnelRoute::<SqliteDatabase>::new())
            .service(DeleteFunnelRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(SaveProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(MembershipsRoute::<SqliteDatabase>::new())
            .service(CreateMembershipRoute::<SqliteDatabase>::new())
            .service(UpdateMembershipRoute::<SqliteDatabase>::new())
            .service(DeleteMembershipRoute::<SqliteDatabase>::new())
            .service(SubscriptionsForUserRoute::<SqliteDatabase>::new())
            .service(SubscribeRoute::<SqliteDatabase>::new())
            .service(CancelSubscriptionRoute::<SqliteDatabase>::new())
            .service(PagesRoute::<SqliteDatabase>::new())
            .service(CreatePageRoute::<SqliteDatabase>::new())
            .service(UpdatePageRoute::<SqliteDatabase>::new())
            .service(DeletePageRoute::<SqliteDatabase>::new())
            .service(PageBySlugRoute::<SqliteDatabase>::new())
            .service(CoursesRoute::<SqliteDatabase>::new())
            .service(CreateCourseRoute::<SqliteDatabase>::new())
            .service(CourseByIdRoute::<SqliteDatabase>::new())
            .service(CourseProgressRoute::<SqliteDatabase>::new())
            .service(CompleteCourseItemRoute::<SqliteDatabase>::new())
            .service(SubmitQuizRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(CompleteCheckoutRoute::<SqliteDatabase>::new())
            .service(FunnelBySlugRoute::<SqliteDatabase>::new())
            .service(FunnelCountdownRoute::<SqliteDatabase>::new())
            .service(admin_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

#[cfg(test)]
mod test {
    use storefront_engine::{
        db_types::{LineItem, Money, NewOrder},
        order_objects::OrderQuery,
    };

    use super::*;

    #[actix_web::test]
    async fn workers_share_the_order_cache() {
        let db = SqliteDatabase::new_with_url("sqlite::memory:", 1).await.unwrap();
        db.migrate().await.unwrap();
        let state = SharedState::new(db, EventProducers::default(), Arc::new(ProcessorRegistry::default()));
        let worker_a = state.order_api();
        let worker_b = state.clone().order_api();
        let query = OrderQuery::default();
        assert_eq!(worker_a.list_orders(&query).await.unwrap().total_count, 0);
        let items = vec![LineItem::new("p1", "Online course", 1, Money::from(4900))];
        worker_b.create_order(NewOrder::new("Anna", "anna@example.com", items)).await.unwrap();
        assert_eq!(worker_a.list_orders(&query).await.unwrap().total_count, 1);
        assert_eq!(worker_a.order_stats().await.unwrap().total_orders, 1);
    }
}
