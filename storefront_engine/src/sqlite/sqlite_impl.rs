//! `SqliteDatabase` is a concrete implementation of a storefront engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::db::{courses, db_url, funnels, memberships, new_pool, orders, pages, products};
use crate::{
    db_types::{
        Course,
        CourseProgress,
        Funnel,
        Membership,
        MembershipPage,
        NewCourse,
        NewFunnel,
        NewMembership,
        NewMembershipPage,
        NewOrder,
        NewProduct,
        NewSubscription,
        Order,
        Product,
        Subscription,
        SubscriptionStatus,
    },
    sf_api::order_objects::{OrderPage, OrderQuery, OrderStats, OrderUpdate},
    traits::{
        CourseManagement,
        FunnelManagement,
        MembershipManagement,
        OrderManagement,
        PageManagement,
        ProductManagement,
        StoreError,
        StorefrontDatabase,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order_number: &str, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order_number, order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(order_number, &mut conn).await
    }

    async fn search_orders(&self, query: &OrderQuery) -> Result<OrderPage, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    async fn order_stats(&self) -> Result<OrderStats, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::order_stats(&mut conn).await
    }

    async fn update_order(&self, id: i64, update: OrderUpdate) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order(id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn delete_order(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = orders::delete_order(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

impl MembershipManagement for SqliteDatabase {
    async fn insert_membership(&self, membership: NewMembership) -> Result<Membership, StoreError> {
        let mut tx = self.pool.begin().await?;
        let membership = memberships::insert_membership(membership, &mut tx).await?;
        tx.commit().await?;
        Ok(membership)
    }

    async fn update_membership(&self, id: i64, membership: NewMembership) -> Result<Option<Membership>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let membership = memberships::update_membership(id, membership, &mut tx).await?;
        tx.commit().await?;
        Ok(membership)
    }

    async fn delete_membership(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = memberships::delete_membership(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn fetch_membership(&self, id: i64) -> Result<Option<Membership>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        memberships::fetch_membership(id, &mut conn).await
    }

    async fn fetch_memberships(&self) -> Result<Vec<Membership>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        memberships::fetch_memberships(&mut conn).await
    }

    async fn fetch_membership_for_product(&self, product_id: &str) -> Result<Option<Membership>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        memberships::fetch_membership_for_product(product_id, &mut conn).await
    }

    async fn insert_subscription(&self, subscription: NewSubscription) -> Result<Subscription, StoreError> {
        let mut tx = self.pool.begin().await?;
        let subscription = memberships::insert_subscription(subscription, &mut tx).await?;
        tx.commit().await?;
        Ok(subscription)
    }

    async fn fetch_subscription(&self, id: i64) -> Result<Option<Subscription>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        memberships::fetch_subscription(id, &mut conn).await
    }

    async fn fetch_subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        memberships::fetch_subscriptions_for_user(user_id, &mut conn).await
    }

    async fn update_subscription_status(
        &self,
        id: i64,
        status: SubscriptionStatus,
    ) -> Result<Option<Subscription>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let subscription = memberships::update_subscription_status(id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(subscription)
    }

    async fn expire_subscriptions(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let expired = memberships::expire_subscriptions(now, &mut tx).await?;
        tx.commit().await?;
        Ok(expired)
    }
}

impl PageManagement for SqliteDatabase {
    async fn insert_page(&self, page: NewMembershipPage) -> Result<MembershipPage, StoreError> {
        let mut tx = self.pool.begin().await?;
        let page = pages::insert_page(page, &mut tx).await?;
        tx.commit().await?;
        Ok(page)
    }

    async fn update_page(&self, id: i64, page: NewMembershipPage) -> Result<Option<MembershipPage>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let page = pages::update_page(id, page, &mut tx).await?;
        tx.commit().await?;
        Ok(page)
    }

    async fn delete_page(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = pages::delete_page(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn fetch_page(&self, id: i64) -> Result<Option<MembershipPage>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        pages::fetch_page(id, &mut conn).await
    }

    async fn fetch_page_by_slug(&self, slug: &str) -> Result<Option<MembershipPage>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        pages::fetch_page_by_slug(slug, &mut conn).await
    }

    async fn fetch_pages(&self) -> Result<Vec<MembershipPage>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        pages::fetch_pages(&mut conn).await
    }

    async fn page_slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        pages::slug_exists(slug, exclude_id, &mut conn).await
    }
}

impl FunnelManagement for SqliteDatabase {
    async fn insert_funnel(&self, funnel: NewFunnel) -> Result<Funnel, StoreError> {
        let mut tx = self.pool.begin().await?;
        let funnel = funnels::insert_funnel(funnel, &mut tx).await?;
        tx.commit().await?;
        Ok(funnel)
    }

    async fn update_funnel(&self, id: i64, funnel: NewFunnel) -> Result<Option<Funnel>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let funnel = funnels::update_funnel(id, funnel, &mut tx).await?;
        tx.commit().await?;
        Ok(funnel)
    }

    async fn delete_funnel(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = funnels::delete_funnel(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn fetch_funnel(&self, id: i64) -> Result<Option<Funnel>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        funnels::fetch_funnel(id, &mut conn).await
    }

    async fn fetch_funnel_by_slug(&self, slug: &str) -> Result<Option<Funnel>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        funnels::fetch_funnel_by_slug(slug, &mut conn).await
    }

    async fn fetch_funnels(&self) -> Result<Vec<Funnel>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        funnels::fetch_funnels(&mut conn).await
    }

    async fn funnel_slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        funnels::slug_exists(slug, exclude_id, &mut conn).await
    }
}

impl CourseManagement for SqliteDatabase {
    async fn insert_course(&self, course: NewCourse) -> Result<Course, StoreError> {
        let mut tx = self.pool.begin().await?;
        let course = courses::insert_course(course, &mut tx).await?;
        tx.commit().await?;
        Ok(course)
    }

    async fn fetch_course(&self, id: i64) -> Result<Option<Course>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        courses::fetch_course(id, &mut conn).await
    }

    async fn fetch_courses(&self) -> Result<Vec<Course>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        courses::fetch_courses(&mut conn).await
    }

    async fn fetch_progress(&self, user_id: &str, course_id: i64) -> Result<Option<CourseProgress>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        courses::fetch_progress(user_id, course_id, &mut conn).await
    }

    async fn save_progress(&self, progress: &CourseProgress) -> Result<CourseProgress, StoreError> {
        let mut tx = self.pool.begin().await?;
        let progress = courses::upsert_progress(progress, &mut tx).await?;
        tx.commit().await?;
        Ok(progress)
    }
}

impl ProductManagement for SqliteDatabase {
    async fn upsert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await?;
        let product = products::upsert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_id, &mut conn).await
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_products(&mut conn).await
    }

    async fn delete_product(&self, product_id: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = products::delete_product(product_id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SF_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        if !Sqlite::database_exists(url).await? {
            info!("🗃️ Database {url} does not exist. Creating it.");
            Sqlite::create_database(url).await?;
        }
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Migrations that have already run are skipped.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
