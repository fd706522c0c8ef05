//! Cascade bookkeeping for course deletion.

use std::ops::AddAssign;

use serde::Serialize;

use crate::domain::{
    CategoryId, CourseId, CourseProgressId, Error, MediaUrl, SectionId, SubSectionId, UserId,
};

/// One dependent step of the deletion cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum CascadeStep {
    /// Pull the course from a student's enrollment lists.
    #[serde(rename_all = "camelCase")]
    WithdrawStudent { user_id: UserId },
    /// Look up a student's progress record for the course.
    #[serde(rename_all = "camelCase")]
    LoadProgress { user_id: UserId },
    /// Delete a student's progress record for the course.
    #[serde(rename_all = "camelCase")]
    DeleteProgress { progress_id: CourseProgressId },
    /// Pull the course from the instructor's course list.
    #[serde(rename_all = "camelCase")]
    DetachInstructor { user_id: UserId },
    /// Pull the course from its catalogue category.
    #[serde(rename_all = "camelCase")]
    DetachCategory { category_id: CategoryId },
    /// Remove a thumbnail or lecture video from the media store.
    DeleteMedia { url: MediaUrl },
    /// Load a section to discover its sub-sections.
    #[serde(rename_all = "camelCase")]
    LoadSection { section_id: SectionId },
    /// Delete a section record.
    #[serde(rename_all = "camelCase")]
    DeleteSection { section_id: SectionId },
    /// Load a sub-section to discover its video.
    #[serde(rename_all = "camelCase")]
    LoadSubSection { sub_section_id: SubSectionId },
    /// Delete a sub-section record.
    #[serde(rename_all = "camelCase")]
    DeleteSubSection { sub_section_id: SubSectionId },
}

/// A dependent step that failed without stopping the cascade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeFailure {
    /// What was being removed.
    pub step: CascadeStep,
    /// Caller-safe reason.
    pub error: Error,
}

/// Running totals for a slice of the cascade.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CascadeTally {
    pub students_withdrawn: usize,
    pub progress_records_deleted: usize,
    pub media_deleted: usize,
    pub sections_deleted: usize,
    pub sub_sections_deleted: usize,
    pub failures: Vec<CascadeFailure>,
}

impl CascadeTally {
    pub(crate) fn fail(&mut self, step: CascadeStep, error: Error) {
        self.failures.push(CascadeFailure { step, error });
    }
}

impl AddAssign for CascadeTally {
    fn add_assign(&mut self, other: Self) {
        self.students_withdrawn += other.students_withdrawn;
        self.progress_records_deleted += other.progress_records_deleted;
        self.media_deleted += other.media_deleted;
        self.sections_deleted += other.sections_deleted;
        self.sub_sections_deleted += other.sub_sections_deleted;
        self.failures.extend(other.failures);
    }
}

/// Result of a completed course deletion.
///
/// The course record itself is gone whenever a report is returned; the
/// counts and failures describe its dependents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDeletionReport {
    /// Deleted course.
    pub course_id: CourseId,
    /// Students whose enrollment lists no longer reference the course.
    pub students_withdrawn: usize,
    /// Progress records removed.
    pub progress_records_deleted: usize,
    /// Thumbnail and video objects removed.
    pub media_deleted: usize,
    /// Section records removed.
    pub sections_deleted: usize,
    /// Sub-section records removed.
    pub sub_sections_deleted: usize,
    /// Dependent steps that failed and may need a sweep.
    pub failures: Vec<CascadeFailure>,
}

impl CourseDeletionReport {
    pub(crate) fn from_tally(course_id: CourseId, tally: CascadeTally) -> Self {
        Self {
            course_id,
            students_withdrawn: tally.students_withdrawn,
            progress_records_deleted: tally.progress_records_deleted,
            media_deleted: tally.media_deleted,
            sections_deleted: tally.sections_deleted,
            sub_sections_deleted: tally.sub_sections_deleted,
            failures: tally.failures,
        }
    }

    /// True when every dependent was removed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapse into a single result; leftovers become `PartialFailure`.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.is_clean() {
            return Ok(self);
        }
        let details = serde_json::json!({
            "courseId": self.course_id,
            "failures": serde_json::to_value(&self.failures).unwrap_or_default(),
        });
        Err(Error::partial_failure(format!(
            "course {} deleted with {} dependent cleanup failures",
            self.course_id,
            self.failures.len()
        ))
        .with_details(details))
    }
}
