//! Per-user course progress and catalogue categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, CourseId, CourseProgressId, SubSectionId, UserId};

/// Completion tracking for one (course, user) pair.
///
/// ## Invariants
/// - At most one record exists per (course, user) pair; stores enforce this
///   in `create_or_get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    /// Record identifier.
    pub id: CourseProgressId,
    /// Tracked course.
    pub course_id: CourseId,
    /// Tracked user.
    pub user_id: UserId,
    /// Sub-sections the user has finished.
    pub completed_videos: Vec<SubSectionId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CourseProgress {
    /// Fresh progress record with nothing completed.
    pub fn start(course_id: CourseId, user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: CourseProgressId::random(),
            course_id,
            user_id,
            completed_videos: Vec::new(),
            created_at,
        }
    }
}

/// Catalogue grouping of courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Member course ids.
    pub courses: Vec<CourseId>,
}
