//! crates/course_search_core/src/memory.rs
//!
//! An in-memory `CourseRepository`. Backs the test suites of both crates and
//! local demos that run without a database.

use crate::domain::{contains_lower, Course, CourseProgress, Favorite};
use crate::ports::{CourseRepository, PortError, PortResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Keeps courses, progress and favorites in `Vec`s behind read-write locks.
///
/// Call counters let tests assert which lookups a pipeline performed.
#[derive(Debug, Default)]
pub struct InMemoryCourseRepository {
    courses: RwLock<Vec<Course>>,
    progress: RwLock<Vec<CourseProgress>>,
    favorites: RwLock<Vec<Favorite>>,
    unavailable: AtomicBool,
    catalog_fetches: AtomicUsize,
    lookups: AtomicUsize,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_courses(courses: Vec<Course>) -> Self {
        let repo = Self::new();
        *repo.courses.write() = courses;
        repo
    }

    pub fn insert_course(&self, course: Course) {
        self.courses.write().push(course);
    }

    pub fn record_progress(&self, progress: CourseProgress) {
        self.progress.write().push(progress);
    }

    pub fn add_favorite(&self, favorite: Favorite) {
        self.favorites.write().push(favorite);
    }

    /// Makes every subsequent call fail, as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of full-catalog reads served so far.
    pub fn catalog_fetches(&self) -> usize {
        self.catalog_fetches.load(Ordering::SeqCst)
    }

    /// Number of title/category lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> PortResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("course store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.courses.read().clone())
    }

    async fn find_by_title_or_category(
        &self,
        needle: &str,
        limit: usize,
    ) -> PortResult<Vec<Course>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let needle = needle.to_lowercase();
        Ok(self
            .courses
            .read()
            .iter()
            .filter(|c| {
                contains_lower(Some(&c.title), &needle)
                    || contains_lower(c.category.as_deref(), &needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_progress_for_user(&self, user_id: &str) -> PortResult<Vec<CourseProgress>> {
        self.check_available()?;
        Ok(self
            .progress
            .read()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_favorites_for_user(&self, user_id: &str) -> PortResult<Vec<Favorite>> {
        self.check_available()?;
        Ok(self
            .favorites
            .read()
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }
}
