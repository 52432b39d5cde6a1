use std::{collections::HashMap, sync::Arc};

use cucumber::World;
use log::*;
use storefront_engine::{
    db_types::Order,
    events::EventProducers,
    processors::ProcessorRegistry,
    test_utils::{create_database, random_db_path, run_migrations},
    FunnelApi,
    OrderApi,
    OrderError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<StorefrontSystem>,
    /// Orders created during the scenario, by the name the feature file gave them.
    pub orders: HashMap<String, Order>,
    pub last_order_error: Option<OrderError>,
    pub last_funnel_error: Option<String>,
}

#[derive(Debug)]
pub struct StorefrontSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderApi<SqliteDatabase>,
    pub funnels: FunnelApi<SqliteDatabase>,
}

impl StorefrontWorld {
    pub fn system(&self) -> &StorefrontSystem {
        self.system.as_ref().expect("Storefront not initialised")
    }

    pub fn order(&self, name: &str) -> &Order {
        self.orders.get(name).unwrap_or_else(|| panic!("No order called {name} in this scenario"))
    }
}

impl StorefrontSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let orders = OrderApi::new(db.clone(), EventProducers::default(), Arc::new(ProcessorRegistry::new()));
        let funnels = FunnelApi::new(db.clone());
        Self { db_path: url, db, orders, funnels }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
