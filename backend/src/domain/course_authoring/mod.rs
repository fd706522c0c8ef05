//! Course creation.
//!
//! A new course touches four records: the thumbnail object, the instructor's
//! course list, the category's course list and the course itself. The course
//! record is written last, so readers never see a course whose owners do not
//! list it. When a later step fails, the earlier ones are rolled back on a
//! best-effort basis. A dangling id left behind by a failed rollback points at
//! a course that does not exist, which readers already skip.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::error_mapping::{map_media_error, map_store_error};
use crate::domain::ports::{CategoryRepository, CourseRepository, MediaStore, UserRepository};
use crate::domain::{CategoryId, Course, CourseId, CourseStatus, Error, MediaUrl, UserId};

/// Tunables for [`CourseAuthoringService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseAuthoringConfig {
    /// Media store folder receiving thumbnails.
    pub media_folder: String,
}

impl Default for CourseAuthoringConfig {
    fn default() -> Self {
        Self {
            media_folder: "course-media".to_owned(),
        }
    }
}

/// Port bundle required by [`CourseAuthoringService`].
pub struct CourseAuthoringPorts {
    /// Course documents.
    pub courses: Arc<dyn CourseRepository>,
    /// User documents.
    pub users: Arc<dyn UserRepository>,
    /// Category documents.
    pub categories: Arc<dyn CategoryRepository>,
    /// Thumbnail storage.
    pub media: Arc<dyn MediaStore>,
}

/// Instructor-supplied fields of a new course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Price in minor currency units.
    pub price: u64,
    /// Catalogue category.
    pub category: CategoryId,
    /// Initial state; `Draft` when omitted.
    pub status: Option<CourseStatus>,
}

impl NewCourse {
    fn validate(&self, thumbnail: &[u8]) -> Result<(), Error> {
        let missing: Vec<&str> = [
            ("name", self.name.trim().is_empty()),
            ("description", self.description.trim().is_empty()),
            ("thumbnail", thumbnail.is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, blank)| blank.then_some(field))
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_request(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Creates courses and links them to their instructor and category.
#[derive(Clone)]
pub struct CourseAuthoringService {
    courses: Arc<dyn CourseRepository>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    media: Arc<dyn MediaStore>,
    clock: Arc<dyn Clock>,
    config: CourseAuthoringConfig,
}

impl CourseAuthoringService {
    /// Build the service.
    pub fn new(
        ports: CourseAuthoringPorts,
        clock: Arc<dyn Clock>,
        config: CourseAuthoringConfig,
    ) -> Self {
        Self {
            courses: ports.courses,
            users: ports.users,
            categories: ports.categories,
            media: ports.media,
            clock,
            config,
        }
    }

    /// Upload the thumbnail, link the course to its owners and save it.
    ///
    /// Fails with `InvalidRequest` for blank fields or an empty thumbnail and
    /// `NotFound` for an unknown instructor or category, both before any
    /// write. The work runs on its own task so a dropped caller cannot stop
    /// it between the links and the rollback.
    pub async fn create_course(
        &self,
        instructor: UserId,
        draft: NewCourse,
        thumbnail: Vec<u8>,
    ) -> Result<Course, Error> {
        draft.validate(&thumbnail)?;
        let this = self.clone();
        tokio::spawn(async move { this.run_create(instructor, draft, thumbnail).await })
            .await
            .map_err(|join_error| {
                Error::internal(format!("course creation task did not complete: {join_error}"))
            })?
    }

    async fn run_create(
        &self,
        instructor: UserId,
        draft: NewCourse,
        thumbnail: Vec<u8>,
    ) -> Result<Course, Error> {
        self.users
            .find_by_id(&instructor)
            .await
            .map_err(|err| map_store_error("instructor lookup", err))?
            .ok_or_else(|| Error::not_found(format!("instructor {instructor} not found")))?;
        self.categories
            .find_by_id(&draft.category)
            .await
            .map_err(|err| map_store_error("category lookup", err))?
            .ok_or_else(|| Error::not_found(format!("category {} not found", draft.category)))?;

        let thumbnail = self
            .media
            .upload(thumbnail, &self.config.media_folder)
            .await
            .map_err(|err| map_media_error("thumbnail upload", err))?;

        let course = Course {
            id: CourseId::random(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            instructor,
            category: draft.category,
            content: Vec::new(),
            students_enrolled: Vec::new(),
            thumbnail,
            status: draft.status.unwrap_or_default(),
            created_at: self.clock.utc(),
        };

        if let Err(error) = self.link_and_save(&course).await {
            self.roll_back(&course).await;
            return Err(error);
        }

        info!(
            course_id = %course.id,
            instructor = %instructor,
            category_id = %course.category,
            "course created"
        );
        Ok(course)
    }

    async fn link_and_save(&self, course: &Course) -> Result<(), Error> {
        self.users
            .add_course(&course.instructor, &course.id)
            .await
            .map_err(|err| map_store_error("instructor link", err))?
            .ok_or_else(|| {
                Error::not_found(format!("instructor {} not found", course.instructor))
            })?;
        self.categories
            .attach_course(&course.category, &course.id)
            .await
            .map_err(|err| map_store_error("category link", err))?
            .ok_or_else(|| Error::not_found(format!("category {} not found", course.category)))?;
        self.courses
            .save(course)
            .await
            .map_err(|err| map_store_error("course save", err))
    }

    async fn roll_back(&self, course: &Course) {
        warn!(course_id = %course.id, "course creation failed; rolling back");
        if let Err(err) = self
            .users
            .withdraw_course(&course.instructor, &course.id, None)
            .await
        {
            warn!(course_id = %course.id, error = %err, "instructor link not rolled back");
        }
        if let Err(err) = self
            .categories
            .detach_course(&course.category, &course.id)
            .await
        {
            warn!(course_id = %course.id, error = %err, "category link not rolled back");
        }
        self.discard_thumbnail(&course.thumbnail).await;
    }

    async fn discard_thumbnail(&self, url: &MediaUrl) {
        match self.media.delete(url).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => warn!(url = %url, error = %err, "thumbnail not rolled back"),
        }
    }
}
