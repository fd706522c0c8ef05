//! Cascading course deletion.
//!
//! Dependents are removed before the course record so an interruption never
//! leaves a course pointing at deleted children. Individual dependent
//! failures are collected and reported instead of aborting; only failing to
//! load or delete the course itself is fatal.
//!
//! Order of work:
//! 1. withdraw every enrolled student (course id, progress id and the
//!    progress record);
//! 2. detach the course from its instructor and category;
//! 3. delete the thumbnail;
//! 4. for each section, delete every sub-section video and record, then the
//!    section record;
//! 5. delete the course record.
//!
//! A section whose record or any of whose sub-sections cannot be read is
//! left in place, so a later sweep can still reach everything beneath it.

use std::sync::Arc;

use futures_util::{StreamExt, stream};
use tracing::{debug, info, warn};

use crate::domain::error_mapping::{map_media_error, map_store_error};
use crate::domain::ports::{
    CategoryRepository, CourseProgressRepository, CourseRepository, MediaStore, SectionRepository,
    SubSectionRepository, UserRepository,
};
use crate::domain::{Course, CourseId, Error, MediaUrl, SectionId, SubSectionId, UserId};

mod report;

use report::CascadeTally;
pub use report::{CascadeFailure, CascadeStep, CourseDeletionReport};

/// Tunables for [`CourseDeletionOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseDeletionConfig {
    /// Maximum number of students or sections processed concurrently.
    pub fan_out: usize,
}

impl Default for CourseDeletionConfig {
    fn default() -> Self {
        Self { fan_out: 4 }
    }
}

/// Port bundle required by [`CourseDeletionOrchestrator`].
pub struct CourseDeletionPorts {
    /// Course documents.
    pub courses: Arc<dyn CourseRepository>,
    /// Section documents.
    pub sections: Arc<dyn SectionRepository>,
    /// Sub-section documents.
    pub sub_sections: Arc<dyn SubSectionRepository>,
    /// User documents.
    pub users: Arc<dyn UserRepository>,
    /// Course progress documents.
    pub progress: Arc<dyn CourseProgressRepository>,
    /// Category documents.
    pub categories: Arc<dyn CategoryRepository>,
    /// Thumbnail and video storage.
    pub media: Arc<dyn MediaStore>,
}

/// Domain-owned course deletion workflow.
#[derive(Clone)]
pub struct CourseDeletionOrchestrator {
    courses: Arc<dyn CourseRepository>,
    sections: Arc<dyn SectionRepository>,
    sub_sections: Arc<dyn SubSectionRepository>,
    users: Arc<dyn UserRepository>,
    progress: Arc<dyn CourseProgressRepository>,
    categories: Arc<dyn CategoryRepository>,
    media: Arc<dyn MediaStore>,
    config: CourseDeletionConfig,
}

impl CourseDeletionOrchestrator {
    /// Build an orchestrator.
    pub fn new(ports: CourseDeletionPorts, config: CourseDeletionConfig) -> Self {
        Self {
            courses: ports.courses,
            sections: ports.sections,
            sub_sections: ports.sub_sections,
            users: ports.users,
            progress: ports.progress,
            categories: ports.categories,
            media: ports.media,
            config,
        }
    }

    /// Delete a course and everything that hangs off it.
    ///
    /// Returns `NotFound` when the course does not exist. When dependents
    /// fail, the course is still deleted and the failures are listed in the
    /// report. The cascade runs on its own task so a dropped caller cannot
    /// stop it between the dependents and the course record.
    pub async fn delete_course(&self, course_id: CourseId) -> Result<CourseDeletionReport, Error> {
        let this = self.clone();
        tokio::spawn(async move { this.run_cascade(course_id).await })
            .await
            .map_err(|join_error| {
                Error::internal(format!("course deletion task did not complete: {join_error}"))
            })?
    }

    async fn run_cascade(&self, course_id: CourseId) -> Result<CourseDeletionReport, Error> {
        let course = self
            .courses
            .find_by_id(&course_id)
            .await
            .map_err(|err| map_store_error("course lookup", err))?
            .ok_or_else(|| Error::not_found(format!("course {course_id} not found")))?;

        info!(
            course_id = %course_id,
            students = course.students_enrolled.len(),
            sections = course.content.len(),
            "course deletion started"
        );

        let fan_out = self.config.fan_out.max(1);
        let mut tally = CascadeTally::default();

        let withdrawals: Vec<_> = course
            .students_enrolled
            .iter()
            .map(|student| self.withdraw_student(course_id, *student))
            .collect();
        let mut withdrawn = stream::iter(withdrawals).buffered(fan_out);
        while let Some(part) = withdrawn.next().await {
            tally += part;
        }

        tally += self.detach_owners(&course).await;
        tally += self.delete_media(&course.thumbnail).await;

        let removals: Vec<_> = course
            .content
            .iter()
            .map(|section_id| self.delete_section(*section_id))
            .collect();
        let mut removed = stream::iter(removals).buffered(fan_out);
        while let Some(part) = removed.next().await {
            tally += part;
        }

        let deleted = self.courses.delete(&course_id).await.map_err(|err| {
            let error = map_store_error("course delete", err);
            if tally.failures.is_empty() {
                error
            } else {
                let pending = serde_json::to_value(&tally.failures).unwrap_or_default();
                error.with_details(serde_json::json!({ "dependentFailures": pending }))
            }
        })?;
        if !deleted {
            debug!(course_id = %course_id, "course record already removed");
        }

        let report = CourseDeletionReport::from_tally(course_id, tally);
        info!(
            course_id = %course_id,
            students_withdrawn = report.students_withdrawn,
            sections_deleted = report.sections_deleted,
            sub_sections_deleted = report.sub_sections_deleted,
            media_deleted = report.media_deleted,
            failures = report.failures.len(),
            "course deletion finished"
        );
        Ok(report)
    }

    async fn withdraw_student(&self, course_id: CourseId, user_id: UserId) -> CascadeTally {
        let mut tally = CascadeTally::default();

        // An unreadable progress record must not keep the course on the user;
        // the record itself is left for a sweep.
        let progress_id = match self.progress.find_for(&course_id, &user_id).await {
            Ok(progress) => progress.map(|record| record.id),
            Err(err) => {
                tally.fail(
                    CascadeStep::LoadProgress { user_id },
                    map_store_error("progress lookup", err),
                );
                None
            }
        };

        match self.users.withdraw_course(&user_id, &course_id, progress_id).await {
            Ok(true) => tally.students_withdrawn += 1,
            Ok(false) => debug!(user_id = %user_id, "enrolled student no longer exists"),
            Err(err) => {
                warn!(user_id = %user_id, course_id = %course_id, "student withdrawal failed");
                tally.fail(
                    CascadeStep::WithdrawStudent { user_id },
                    map_store_error("student withdrawal", err),
                );
                // Keep the progress record while the user still lists it.
                return tally;
            }
        }

        if let Some(progress_id) = progress_id {
            match self.progress.delete(&progress_id).await {
                Ok(true) => tally.progress_records_deleted += 1,
                Ok(false) => {}
                Err(err) => tally.fail(
                    CascadeStep::DeleteProgress { progress_id },
                    map_store_error("progress delete", err),
                ),
            }
        }
        tally
    }

    async fn detach_owners(&self, course: &Course) -> CascadeTally {
        let mut tally = CascadeTally::default();
        if let Err(err) = self
            .users
            .withdraw_course(&course.instructor, &course.id, None)
            .await
        {
            tally.fail(
                CascadeStep::DetachInstructor {
                    user_id: course.instructor,
                },
                map_store_error("instructor detach", err),
            );
        }
        if let Err(err) = self.categories.detach_course(&course.category, &course.id).await {
            tally.fail(
                CascadeStep::DetachCategory {
                    category_id: course.category,
                },
                map_store_error("category detach", err),
            );
        }
        tally
    }

    async fn delete_media(&self, url: &MediaUrl) -> CascadeTally {
        let mut tally = CascadeTally::default();
        match self.media.delete(url).await {
            Ok(()) => tally.media_deleted += 1,
            Err(err) if err.is_not_found() => {
                debug!(url = %url, "media object already absent");
            }
            Err(err) => tally.fail(
                CascadeStep::DeleteMedia { url: url.clone() },
                map_media_error("media delete", err),
            ),
        }
        tally
    }

    async fn delete_section(&self, section_id: SectionId) -> CascadeTally {
        let mut tally = CascadeTally::default();
        let section = match self.sections.find_by_id(&section_id).await {
            Ok(Some(section)) => section,
            Ok(None) => {
                debug!(section_id = %section_id, "section already removed");
                return tally;
            }
            Err(err) => {
                // Without the record its sub-sections cannot be found, so the
                // section is left for a sweep rather than orphaning them.
                tally.fail(
                    CascadeStep::LoadSection { section_id },
                    map_store_error("section lookup", err),
                );
                return tally;
            }
        };

        let mut unreadable = false;
        for sub_section_id in &section.sub_sections {
            let part = self.delete_sub_section(*sub_section_id).await;
            unreadable |= part
                .failures
                .iter()
                .any(|failure| matches!(failure.step, CascadeStep::LoadSubSection { .. }));
            tally += part;
        }
        if unreadable {
            // The section is the only path to the unread sub-sections.
            warn!(section_id = %section_id, "section kept; sub-sections could not be read");
            return tally;
        }

        match self.sections.delete(&section_id).await {
            Ok(true) => tally.sections_deleted += 1,
            Ok(false) => {}
            Err(err) => tally.fail(
                CascadeStep::DeleteSection { section_id },
                map_store_error("section delete", err),
            ),
        }
        tally
    }

    async fn delete_sub_section(&self, sub_section_id: SubSectionId) -> CascadeTally {
        let mut tally = CascadeTally::default();
        let sub_section = match self.sub_sections.find_by_id(&sub_section_id).await {
            Ok(Some(sub_section)) => sub_section,
            Ok(None) => return tally,
            Err(err) => {
                tally.fail(
                    CascadeStep::LoadSubSection { sub_section_id },
                    map_store_error("sub-section lookup", err),
                );
                return tally;
            }
        };

        tally += self.delete_media(&sub_section.video).await;

        match self.sub_sections.delete(&sub_section_id).await {
            Ok(true) => tally.sub_sections_deleted += 1,
            Ok(false) => {}
            Err(err) => tally.fail(
                CascadeStep::DeleteSubSection { sub_section_id },
                map_store_error("sub-section delete", err),
            ),
        }
        tally
    }
}

#[cfg(test)]
mod tests;
