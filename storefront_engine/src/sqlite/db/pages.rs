use chrono::Utc;
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{MembershipPage, NewMembershipPage},
    traits::StoreError,
};

pub async fn insert_page(page: NewMembershipPage, conn: &mut SqliteConnection) -> Result<MembershipPage, StoreError> {
    let page: MembershipPage = sqlx::query_as(
        r#"
            INSERT INTO membership_pages (title, slug, content, membership_ids, is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(page.title)
    .bind(page.slug)
    .bind(page.content)
    .bind(Json(page.membership_ids))
    .bind(page.is_published)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Membership page /{} inserted with id {}", page.slug, page.id);
    Ok(page)
}

pub async fn update_page(
    id: i64,
    page: NewMembershipPage,
    conn: &mut SqliteConnection,
) -> Result<Option<MembershipPage>, StoreError> {
    let page = sqlx::query_as(
        r#"
            UPDATE membership_pages SET
                title = $1,
                slug = $2,
                content = $3,
                membership_ids = $4,
                is_published = $5,
                updated_at = $6
            WHERE id = $7
            RETURNING *;
        "#,
    )
    .bind(page.title)
    .bind(page.slug)
    .bind(page.content)
    .bind(Json(page.membership_ids))
    .bind(page.is_published)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(page)
}

pub async fn delete_page(id: i64, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM membership_pages WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_page(id: i64, conn: &mut SqliteConnection) -> Result<Option<MembershipPage>, StoreError> {
    let page = sqlx::query_as("SELECT * FROM membership_pages WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(page)
}

pub async fn fetch_page_by_slug(slug: &str, conn: &mut SqliteConnection) -> Result<Option<MembershipPage>, StoreError> {
    let page =
        sqlx::query_as("SELECT * FROM membership_pages WHERE slug = $1").bind(slug).fetch_optional(conn).await?;
    Ok(page)
}

pub async fn fetch_pages(conn: &mut SqliteConnection) -> Result<Vec<MembershipPage>, StoreError> {
    let pages = sqlx::query_as("SELECT * FROM membership_pages ORDER BY title ASC, id ASC").fetch_all(conn).await?;
    Ok(pages)
}

pub async fn slug_exists(slug: &str, exclude_id: Option<i64>, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM membership_pages WHERE slug = $1 AND id != $2")
        .bind(slug)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}
