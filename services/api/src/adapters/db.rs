//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `CourseRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_search_core::domain::{Course, CourseLevel, CourseProgress, Favorite};
use course_search_core::ports::{CourseRepository, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `CourseRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Escapes `ILIKE` wildcards so the needle matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const COURSE_COLUMNS: &str = "id, title, description, instructor, category, level, \
     duration_minutes, thumbnail_url, video_url, is_premium, created_at, updated_at";

#[derive(FromRow)]
struct CourseRecord {
    id: String,
    title: String,
    description: Option<String>,
    instructor: Option<String>,
    category: Option<String>,
    level: Option<String>,
    duration_minutes: Option<i32>,
    thumbnail_url: Option<String>,
    video_url: Option<String>,
    is_premium: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        let level = self.level.as_deref().and_then(|raw| {
            raw.parse::<CourseLevel>()
                .map_err(|e| warn!(course_id = %self.id, "Ignoring stored level: {}", e))
                .ok()
        });
        Course {
            id: self.id,
            title: self.title,
            description: self.description,
            instructor: self.instructor,
            category: self.category,
            level,
            duration_minutes: self.duration_minutes,
            thumbnail_url: self.thumbnail_url,
            video_url: self.video_url,
            is_premium: self.is_premium,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    user_id: String,
    course_id: String,
    progress_percentage: i32,
    is_completed: bool,
    watch_time_minutes: i32,
}
impl ProgressRecord {
    fn to_domain(self) -> CourseProgress {
        CourseProgress {
            user_id: self.user_id,
            course_id: self.course_id,
            progress_percentage: self.progress_percentage,
            is_completed: self.is_completed,
            watch_time_minutes: self.watch_time_minutes,
        }
    }
}

#[derive(FromRow)]
struct FavoriteRecord {
    user_id: String,
    course_id: String,
    created_at: DateTime<Utc>,
}
impl FavoriteRecord {
    fn to_domain(self) -> Favorite {
        Favorite {
            user_id: self.user_id,
            course_id: self.course_id,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `CourseRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CourseRepository for DbAdapter {
    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {} FROM courses ORDER BY created_at DESC",
            COURSE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn find_by_title_or_category(
        &self,
        needle: &str,
        limit: usize,
    ) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {} FROM courses WHERE title ILIKE $1 OR category ILIKE $1 \
             ORDER BY created_at DESC LIMIT $2",
            COURSE_COLUMNS
        ))
        .bind(like_pattern(needle))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn get_progress_for_user(&self, user_id: &str) -> PortResult<Vec<CourseProgress>> {
        let records = sqlx::query_as::<_, ProgressRecord>(
            "SELECT user_id, course_id, progress_percentage, is_completed, watch_time_minutes \
             FROM course_progress WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(ProgressRecord::to_domain).collect())
    }

    async fn get_favorites_for_user(&self, user_id: &str) -> PortResult<Vec<Favorite>> {
        let records = sqlx::query_as::<_, FavoriteRecord>(
            "SELECT user_id, course_id, created_at FROM user_favorites \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(FavoriteRecord::to_domain).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn record(level: Option<&str>) -> CourseRecord {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        CourseRecord {
            id: "a".to_string(),
            title: "React do Zero".to_string(),
            description: None,
            instructor: None,
            category: Some("Programação".to_string()),
            level: level.map(str::to_string),
            duration_minutes: Some(45),
            thumbnail_url: None,
            video_url: None,
            is_premium: false,
            created_at: created,
            updated_at: created,
        }
    }

    #[rstest]
    #[case(Some("beginner"), Some(CourseLevel::Beginner))]
    #[case(Some("Iniciante"), Some(CourseLevel::Beginner))]
    #[case(Some("intermediário"), Some(CourseLevel::Intermediate))]
    #[case(Some("Avançado"), Some(CourseLevel::Advanced))]
    #[case(Some("expert"), None)]
    #[case(None, None)]
    fn test_stored_level_labels_map_to_domain(
        #[case] stored: Option<&str>,
        #[case] expected: Option<CourseLevel>,
    ) {
        let course = record(stored).to_domain();
        assert_eq!(course.level, expected);
        assert_eq!(course.title, "React do Zero");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("react"), "%react%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
