use std::fmt::Debug;

use chrono::Utc;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{ContentItem, Course, CourseProgress, NewCourse, QuizQuestion},
    sf_api::errors::CourseError,
    traits::CourseManagement,
};

/// A user's progress through a course, in a form suitable for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub course_id: i64,
    pub user_id: String,
    pub completed_items: usize,
    pub total_items: usize,
    /// Whole percent, rounded down.
    pub percent: u8,
    pub completed_chapters: Vec<String>,
}

impl ProgressSummary {
    fn new(course: &Course, progress: &CourseProgress) -> Self {
        let total_items = course.total_items();
        let completed_items =
            progress.completed_items.iter().filter(|id| course.find_item(id).is_some()).count();
        Self {
            course_id: course.id,
            user_id: progress.user_id.clone(),
            completed_items,
            total_items,
            percent: percent(completed_items, total_items),
            completed_chapters: progress.completed_chapters.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub item_id: String,
    pub correct_answers: usize,
    pub question_count: usize,
    pub score: u8,
    pub progress: ProgressSummary,
}

fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    // part <= whole, so the result is at most 100
    u8::try_from(part.min(whole) * 100 / whole).unwrap_or(100)
}

/// Scores a set of answers. `answers[i]` is the option chosen for question `i`. Missing answers count as wrong.
pub fn score_quiz(questions: &[QuizQuestion], answers: &[usize]) -> (usize, u8) {
    let correct = questions.iter().zip(answers.iter()).filter(|(q, a)| q.correct_option == **a).count();
    (correct, percent(correct, questions.len()))
}

fn check_course(course: &NewCourse) -> Result<(), CourseError> {
    if course.title.trim().is_empty() {
        return Err(CourseError::Validation("A course title is required".into()));
    }
    let mut ids = std::collections::HashSet::new();
    for item in course.chapters.iter().flat_map(|c| c.items.iter()) {
        if !ids.insert(item.id()) {
            return Err(CourseError::Validation(format!("Content item id {} is used more than once", item.id())));
        }
    }
    Ok(())
}

/// Courses, and the progress users make through them.
pub struct CourseApi<B> {
    db: B,
}

impl<B> Debug for CourseApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CourseApi")
    }
}

impl<B: Clone> Clone for CourseApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> CourseApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CourseApi<B>
where B: CourseManagement
{
    pub async fn create_course(&self, course: NewCourse) -> Result<Course, CourseError> {
        check_course(&course)?;
        let course = self.db.insert_course(course).await?;
        info!("📚️ Course #{} '{}' created with {} items", course.id, course.title, course.total_items());
        Ok(course)
    }

    pub async fn fetch_course(&self, id: i64) -> Result<Option<Course>, CourseError> {
        Ok(self.db.fetch_course(id).await?)
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, CourseError> {
        Ok(self.db.fetch_courses().await?)
    }

    async fn course_and_progress(&self, user_id: &str, course_id: i64) -> Result<(Course, CourseProgress), CourseError> {
        let course = self.db.fetch_course(course_id).await?.ok_or(CourseError::CourseNotFound(course_id))?;
        let progress =
            self.db.fetch_progress(user_id, course_id).await?.unwrap_or_else(|| CourseProgress::new(user_id, course_id));
        Ok((course, progress))
    }

    /// Marks a content item as done. When this completes every item in the item's chapter, the chapter is marked as
    /// done too. Completing an item twice is harmless.
    pub async fn complete_item(&self, user_id: &str, course_id: i64, item_id: &str) -> Result<ProgressSummary, CourseError> {
        let (course, mut progress) = self.course_and_progress(user_id, course_id).await?;
        mark_complete(&course, &mut progress, item_id)?;
        let progress = self.db.save_progress(&progress).await?;
        trace!("📚️ {user_id} completed {item_id} in course #{course_id}");
        Ok(ProgressSummary::new(&course, &progress))
    }

    /// Scores the answers to a quiz item, stores the score and marks the quiz as done.
    pub async fn record_quiz_score(
        &self,
        user_id: &str,
        course_id: i64,
        item_id: &str,
        answers: &[usize],
    ) -> Result<QuizResult, CourseError> {
        let (course, mut progress) = self.course_and_progress(user_id, course_id).await?;
        let (_, item) = course
            .find_item(item_id)
            .ok_or_else(|| CourseError::UnknownItem { course_id, item_id: item_id.to_string() })?;
        let ContentItem::Quiz { questions, .. } = item else {
            return Err(CourseError::NotAQuiz(item_id.to_string()));
        };
        if questions.is_empty() {
            return Err(CourseError::Validation(format!("Quiz {item_id} has no questions")));
        }
        let question_count = questions.len();
        let (correct_answers, score) = score_quiz(questions, answers);
        progress.quiz_scores.insert(item_id.to_string(), score);
        mark_complete(&course, &mut progress, item_id)?;
        let progress = self.db.save_progress(&progress).await?;
        debug!("📚️ {user_id} scored {score}% on quiz {item_id} in course #{course_id}");
        Ok(QuizResult {
            item_id: item_id.to_string(),
            correct_answers,
            question_count,
            score,
            progress: ProgressSummary::new(&course, &progress),
        })
    }

    pub async fn progress(&self, user_id: &str, course_id: i64) -> Result<ProgressSummary, CourseError> {
        let (course, progress) = self.course_and_progress(user_id, course_id).await?;
        Ok(ProgressSummary::new(&course, &progress))
    }
}

fn mark_complete(course: &Course, progress: &mut CourseProgress, item_id: &str) -> Result<(), CourseError> {
    let (chapter, _) = course
        .find_item(item_id)
        .ok_or_else(|| CourseError::UnknownItem { course_id: course.id, item_id: item_id.to_string() })?;
    progress.completed_items.insert(item_id.to_string());
    if chapter.items.iter().all(|i| progress.completed_items.contains(i.id())) {
        progress.completed_chapters.insert(chapter.id.clone());
    }
    progress.updated_at = Utc::now();
    Ok(())
}
