//! Read-side assembly of a course with its content tree.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::error_mapping::map_store_error;
use crate::domain::ports::{
    CourseProgressRepository, CourseRepository, SectionRepository, SubSectionRepository,
};
use crate::domain::{
    Course, CourseDuration, CourseId, Error, Section, SubSection, SubSectionId, UserId,
    total_duration,
};

/// A section with its loaded lectures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDetails {
    /// The section record.
    pub section: Section,
    /// Its lectures in display order; missing records are skipped.
    pub sub_sections: Vec<SubSection>,
}

/// A course with its full content tree and total running time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    /// The course record.
    pub course: Course,
    /// Sections in display order; missing records are skipped.
    pub sections: Vec<SectionDetails>,
    /// Sum of every listed lecture's length.
    pub total_duration: CourseDuration,
}

/// Course details plus one learner's completed lectures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCourseDetails {
    #[serde(flatten)]
    /// Course tree and duration.
    pub details: CourseDetails,
    /// Lectures the learner has finished; empty without a progress record.
    pub completed_videos: Vec<SubSectionId>,
}

/// Loads course trees for catalogue and learner views.
#[derive(Clone)]
pub struct CourseQueryService {
    courses: Arc<dyn CourseRepository>,
    sections: Arc<dyn SectionRepository>,
    sub_sections: Arc<dyn SubSectionRepository>,
    progress: Arc<dyn CourseProgressRepository>,
}

impl CourseQueryService {
    /// Build the service over the content and progress repositories.
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        sections: Arc<dyn SectionRepository>,
        sub_sections: Arc<dyn SubSectionRepository>,
        progress: Arc<dyn CourseProgressRepository>,
    ) -> Self {
        Self {
            courses,
            sections,
            sub_sections,
            progress,
        }
    }

    /// Load a course with its sections and lectures in content order.
    ///
    /// Dangling section or sub-section ids are skipped.
    pub async fn course_details(&self, course_id: &CourseId) -> Result<CourseDetails, Error> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await
            .map_err(|err| map_store_error("course lookup", err))?
            .ok_or_else(|| Error::not_found(format!("course {course_id} not found")))?;

        let mut sections = Vec::with_capacity(course.content.len());
        for section_id in &course.content {
            let Some(section) = self
                .sections
                .find_by_id(section_id)
                .await
                .map_err(|err| map_store_error("section lookup", err))?
            else {
                debug!(course_id = %course_id, section_id = %section_id, "skipping dangling section");
                continue;
            };

            let mut sub_sections = Vec::with_capacity(section.sub_sections.len());
            for sub_section_id in &section.sub_sections {
                match self
                    .sub_sections
                    .find_by_id(sub_section_id)
                    .await
                    .map_err(|err| map_store_error("sub-section lookup", err))?
                {
                    Some(sub_section) => sub_sections.push(sub_section),
                    None => debug!(sub_section_id = %sub_section_id, "skipping dangling sub-section"),
                }
            }
            sections.push(SectionDetails {
                section,
                sub_sections,
            });
        }

        let total_duration = total_duration(sections.iter().flat_map(|entry| &entry.sub_sections));
        Ok(CourseDetails {
            course,
            sections,
            total_duration,
        })
    }

    /// Course details plus the lectures `user_id` has completed.
    pub async fn full_course_details(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<FullCourseDetails, Error> {
        let details = self.course_details(course_id).await?;
        let completed_videos = self
            .progress
            .find_for(course_id, user_id)
            .await
            .map_err(|err| map_store_error("progress lookup", err))?
            .map(|progress| progress.completed_videos)
            .unwrap_or_default();
        Ok(FullCourseDetails {
            details,
            completed_videos,
        })
    }
}
