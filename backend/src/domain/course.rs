//! Course content tree: courses, sections and sub-sections.
//!
//! A course owns an ordered list of sections and each section owns an ordered
//! list of sub-sections. Children reference their parent by id so a sweep can
//! find orphans left behind by an interrupted cascading delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, CourseId, SectionId, SubSectionId, UserId, push_unique};
use super::media::MediaUrl;

/// Publication state of a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseStatus {
    /// Visible to the instructor only.
    #[default]
    Draft,
    /// Listed in the catalogue.
    Published,
}

/// A purchasable course.
///
/// ## Invariants
/// - `students_enrolled` has set semantics: a user id appears at most once.
/// - `price` is expressed in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Course identifier.
    pub id: CourseId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Price in minor currency units.
    pub price: u64,
    /// Owning instructor.
    pub instructor: UserId,
    /// Catalogue category.
    pub category: CategoryId,
    /// Ordered section ids.
    pub content: Vec<SectionId>,
    /// Enrolled students.
    pub students_enrolled: Vec<UserId>,
    /// Thumbnail image.
    pub thumbnail: MediaUrl,
    /// Publication state.
    pub status: CourseStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Whether `user_id` is already enrolled.
    pub fn has_student(&self, user_id: &UserId) -> bool {
        self.students_enrolled.contains(user_id)
    }

    /// Enroll `user_id` unless already present. Returns whether the set changed.
    pub fn enroll_student(&mut self, user_id: UserId) -> bool {
        push_unique(&mut self.students_enrolled, user_id)
    }
}

/// A titled group of lectures inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Section identifier.
    pub id: SectionId,
    /// Parent course.
    pub course_id: CourseId,
    /// Display name.
    pub name: String,
    /// Ordered sub-section ids.
    pub sub_sections: Vec<SubSectionId>,
}

/// One lecture video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSection {
    /// Sub-section identifier.
    pub id: SubSectionId,
    /// Parent section.
    pub section_id: SectionId,
    /// Display title.
    pub title: String,
    /// Lecture video.
    pub video: MediaUrl,
    /// Video length in seconds.
    pub duration_secs: u64,
}
