//! Fixtures shared by the unit tests of this crate.

use crate::domain::{Course, CourseProgress, Favorite};
use crate::ports::{ChatCompletionService, ChatRequest, PortError, PortResult};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

pub fn course(id: &str) -> Course {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Course {
        id: id.to_string(),
        title: format!("Course {id}"),
        description: None,
        instructor: None,
        category: None,
        level: None,
        duration_minutes: None,
        thumbnail_url: None,
        video_url: None,
        is_premium: false,
        created_at: created,
        updated_at: created,
    }
}

pub fn titled(id: &str, title: &str, category: &str) -> Course {
    Course {
        title: title.to_string(),
        category: Some(category.to_string()),
        ..course(id)
    }
}

pub fn completed(user_id: &str, course_id: &str) -> CourseProgress {
    CourseProgress {
        user_id: user_id.to_string(),
        course_id: course_id.to_string(),
        progress_percentage: 100,
        is_completed: true,
        watch_time_minutes: 60,
    }
}

pub fn favorite(user_id: &str, course_id: &str) -> Favorite {
    Favorite {
        user_id: user_id.to_string(),
        course_id: course_id.to_string(),
        created_at: Utc::now(),
    }
}

/// A chat service that always answers the same way and records what it was sent.
pub struct ScriptedChat {
    outcome: Result<Option<String>, String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn reply(text: &str) -> Self {
        Self::with_outcome(Ok(Some(text.to_string())))
    }

    pub fn empty() -> Self {
        Self::with_outcome(Ok(None))
    }

    pub fn fail(error: PortError) -> Self {
        Self::with_outcome(Err(error.to_string()))
    }

    fn with_outcome(outcome: Result<Option<String>, String>) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl ChatCompletionService for ScriptedChat {
    async fn complete(&self, request: ChatRequest) -> PortResult<Option<String>> {
        self.requests.lock().push(request);
        self.outcome.clone().map_err(PortError::Unavailable)
    }
}
