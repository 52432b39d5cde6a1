use crate::{
    db_types::{Course, CourseProgress, NewCourse},
    traits::StoreError,
};

/// Storage for courses and the progress users make through them.
#[allow(async_fn_in_trait)]
pub trait CourseManagement {
    async fn insert_course(&self, course: NewCourse) -> Result<Course, StoreError>;

    async fn fetch_course(&self, id: i64) -> Result<Option<Course>, StoreError>;

    async fn fetch_courses(&self) -> Result<Vec<Course>, StoreError>;

    /// Fetches the progress record for the user on the course. Users that have not started a course have no record.
    async fn fetch_progress(&self, user_id: &str, course_id: i64) -> Result<Option<CourseProgress>, StoreError>;

    /// Inserts or replaces the progress record.
    async fn save_progress(&self, progress: &CourseProgress) -> Result<CourseProgress, StoreError>;
}
