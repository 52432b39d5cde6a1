use chrono::Utc;
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{Course, CourseProgress, NewCourse},
    traits::StoreError,
};

pub async fn insert_course(course: NewCourse, conn: &mut SqliteConnection) -> Result<Course, StoreError> {
    let course: Course = sqlx::query_as(
        r#"
            INSERT INTO courses (title, description, chapters, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *;
        "#,
    )
    .bind(course.title)
    .bind(course.description)
    .bind(Json(course.chapters))
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Course [{}] inserted with id {}", course.title, course.id);
    Ok(course)
}

pub async fn fetch_course(id: i64, conn: &mut SqliteConnection) -> Result<Option<Course>, StoreError> {
    let course = sqlx::query_as("SELECT * FROM courses WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(course)
}

pub async fn fetch_courses(conn: &mut SqliteConnection) -> Result<Vec<Course>, StoreError> {
    let courses = sqlx::query_as("SELECT * FROM courses ORDER BY title ASC, id ASC").fetch_all(conn).await?;
    Ok(courses)
}

pub async fn fetch_progress(
    user_id: &str,
    course_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CourseProgress>, StoreError> {
    let progress = sqlx::query_as("SELECT * FROM course_progress WHERE user_id = $1 AND course_id = $2")
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(conn)
        .await?;
    Ok(progress)
}

pub async fn upsert_progress(progress: &CourseProgress, conn: &mut SqliteConnection) -> Result<CourseProgress, StoreError> {
    let progress = sqlx::query_as(
        r#"
            INSERT INTO course_progress (user_id, course_id, completed_items, completed_chapters, quiz_scores, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, course_id) DO UPDATE SET
                completed_items = excluded.completed_items,
                completed_chapters = excluded.completed_chapters,
                quiz_scores = excluded.quiz_scores,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(&progress.user_id)
    .bind(progress.course_id)
    .bind(Json(&progress.completed_items))
    .bind(Json(&progress.completed_chapters))
    .bind(Json(&progress.quiz_scores))
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(progress)
}
