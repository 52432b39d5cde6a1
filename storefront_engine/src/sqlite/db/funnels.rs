use chrono::Utc;
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{Funnel, NewFunnel},
    traits::StoreError,
};

pub async fn insert_funnel(funnel: NewFunnel, conn: &mut SqliteConnection) -> Result<Funnel, StoreError> {
    let funnel: Funnel = sqlx::query_as(
        r#"
            INSERT INTO funnels (name, slug, products, discounts, countdown, blocks, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(funnel.name)
    .bind(funnel.slug)
    .bind(Json(funnel.products))
    .bind(Json(funnel.discounts))
    .bind(Json(funnel.countdown))
    .bind(Json(funnel.blocks))
    .bind(funnel.is_active)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Funnel [{}] inserted with id {}", funnel.slug, funnel.id);
    Ok(funnel)
}

pub async fn update_funnel(id: i64, funnel: NewFunnel, conn: &mut SqliteConnection) -> Result<Option<Funnel>, StoreError> {
    let funnel = sqlx::query_as(
        r#"
            UPDATE funnels SET
                name = $1,
                slug = $2,
                products = $3,
                discounts = $4,
                countdown = $5,
                blocks = $6,
                is_active = $7,
                updated_at = $8
            WHERE id = $9
            RETURNING *;
        "#,
    )
    .bind(funnel.name)
    .bind(funnel.slug)
    .bind(Json(funnel.products))
    .bind(Json(funnel.discounts))
    .bind(Json(funnel.countdown))
    .bind(Json(funnel.blocks))
    .bind(funnel.is_active)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(funnel)
}

pub async fn delete_funnel(id: i64, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM funnels WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_funnel(id: i64, conn: &mut SqliteConnection) -> Result<Option<Funnel>, StoreError> {
    let funnel = sqlx::query_as("SELECT * FROM funnels WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(funnel)
}

pub async fn fetch_funnel_by_slug(slug: &str, conn: &mut SqliteConnection) -> Result<Option<Funnel>, StoreError> {
    let funnel = sqlx::query_as("SELECT * FROM funnels WHERE slug = $1").bind(slug).fetch_optional(conn).await?;
    Ok(funnel)
}

pub async fn fetch_funnels(conn: &mut SqliteConnection) -> Result<Vec<Funnel>, StoreError> {
    let funnels = sqlx::query_as("SELECT * FROM funnels ORDER BY created_at DESC, id DESC").fetch_all(conn).await?;
    Ok(funnels)
}

pub async fn slug_exists(slug: &str, exclude_id: Option<i64>, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM funnels WHERE slug = $1 AND id != $2")
        .bind(slug)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}
