use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{Membership, NewMembership, NewSubscription, Subscription, SubscriptionStatus},
    traits::StoreError,
};

pub async fn insert_membership(membership: NewMembership, conn: &mut SqliteConnection) -> Result<Membership, StoreError> {
    let now = Utc::now();
    let membership: Membership = sqlx::query_as(
        r#"
            INSERT INTO memberships (
                name,
                description,
                duration_days,
                price,
                currency,
                features,
                product_ids,
                is_active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *;
        "#,
    )
    .bind(membership.name)
    .bind(membership.description)
    .bind(membership.duration_days)
    .bind(membership.price)
    .bind(membership.currency)
    .bind(Json(membership.features))
    .bind(Json(membership.product_ids))
    .bind(membership.is_active)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Membership [{}] inserted with id {}", membership.name, membership.id);
    Ok(membership)
}

pub async fn update_membership(
    id: i64,
    membership: NewMembership,
    conn: &mut SqliteConnection,
) -> Result<Option<Membership>, StoreError> {
    let membership = sqlx::query_as(
        r#"
            UPDATE memberships SET
                name = $1,
                description = $2,
                duration_days = $3,
                price = $4,
                currency = $5,
                features = $6,
                product_ids = $7,
                is_active = $8,
                updated_at = $9
            WHERE id = $10
            RETURNING *;
        "#,
    )
    .bind(membership.name)
    .bind(membership.description)
    .bind(membership.duration_days)
    .bind(membership.price)
    .bind(membership.currency)
    .bind(Json(membership.features))
    .bind(Json(membership.product_ids))
    .bind(membership.is_active)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(membership)
}

pub async fn delete_membership(id: i64, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    sqlx::query("DELETE FROM user_memberships WHERE membership_id = $1").bind(id).execute(&mut *conn).await?;
    let result = sqlx::query("DELETE FROM memberships WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_membership(id: i64, conn: &mut SqliteConnection) -> Result<Option<Membership>, StoreError> {
    let membership = sqlx::query_as("SELECT * FROM memberships WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(membership)
}

pub async fn fetch_memberships(conn: &mut SqliteConnection) -> Result<Vec<Membership>, StoreError> {
    let memberships = sqlx::query_as("SELECT * FROM memberships ORDER BY name ASC, id ASC").fetch_all(conn).await?;
    Ok(memberships)
}

pub async fn fetch_membership_for_product(
    product_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Membership>, StoreError> {
    let membership = sqlx::query_as(
        r#"
            SELECT * FROM memberships
            WHERE is_active = TRUE AND EXISTS (SELECT 1 FROM json_each(memberships.product_ids) WHERE value = $1)
            ORDER BY id ASC
            LIMIT 1
        "#,
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(membership)
}

pub async fn insert_subscription(
    subscription: NewSubscription,
    conn: &mut SqliteConnection,
) -> Result<Subscription, StoreError> {
    let now = Utc::now();
    let subscription: Subscription = sqlx::query_as(
        r#"
            INSERT INTO user_memberships (
                user_id,
                membership_id,
                start_date,
                end_date,
                status,
                auto_renew,
                payment_status,
                order_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *;
        "#,
    )
    .bind(subscription.user_id)
    .bind(subscription.membership_id)
    .bind(subscription.start_date)
    .bind(subscription.end_date)
    .bind(subscription.status)
    .bind(subscription.auto_renew)
    .bind(subscription.payment_status)
    .bind(subscription.order_id)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!(
        "🗃️ Subscription #{} to membership {} inserted for {}",
        subscription.id, subscription.membership_id, subscription.user_id
    );
    Ok(subscription)
}

pub async fn fetch_subscription(id: i64, conn: &mut SqliteConnection) -> Result<Option<Subscription>, StoreError> {
    let sub = sqlx::query_as("SELECT * FROM user_memberships WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(sub)
}

pub async fn fetch_subscriptions_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Subscription>, StoreError> {
    let subs = sqlx::query_as("SELECT * FROM user_memberships WHERE user_id = $1 ORDER BY end_date DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(subs)
}

pub async fn update_subscription_status(
    id: i64,
    status: SubscriptionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Subscription>, StoreError> {
    let sub = sqlx::query_as("UPDATE user_memberships SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(sub)
}

pub async fn expire_subscriptions(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Subscription>, StoreError> {
    let subs: Vec<Subscription> = sqlx::query_as(
        r#"
            UPDATE user_memberships SET status = $1, updated_at = $2
            WHERE status NOT IN ($1, $3) AND end_date <= $2
            RETURNING *;
        "#,
    )
    .bind(SubscriptionStatus::Expired)
    .bind(now)
    .bind(SubscriptionStatus::Cancelled)
    .fetch_all(conn)
    .await?;
    Ok(subs)
}
