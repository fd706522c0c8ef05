//! Driven ports for the document collections behind the marketplace.
//!
//! The store only guarantees single-record atomic writes: create, replace,
//! delete, and append/pull on a list field of one record. Every multi-record
//! consistency property is the orchestrators' job.

use async_trait::async_trait;

use crate::domain::{
    Category, CategoryId, Course, CourseId, CourseProgress, CourseProgressId, Section, SectionId,
    SubSection, SubSectionId, User, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by resource store adapters.
    pub enum ResourceStoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "resource store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "resource store query failed: {message}",
    }
}

/// Result of an append-if-absent write on a set-like list field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    /// The id was appended.
    Added,
    /// The id was already present; nothing changed.
    AlreadyPresent,
}

/// Outcome of [`UserRepository::record_enrollment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEnrollment {
    /// User document after the write.
    pub user: User,
    /// Whether this write appended the course id to `courses`.
    pub course: MembershipChange,
}

/// Port for course documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Find a course by id.
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, ResourceStoreError>;

    /// Create or replace a course.
    async fn save(&self, course: &Course) -> Result<(), ResourceStoreError>;

    /// Atomically add `user_id` to `students_enrolled` unless already present.
    ///
    /// Returns `None` when the course does not exist.
    async fn add_student(
        &self,
        id: &CourseId,
        user_id: &UserId,
    ) -> Result<Option<MembershipChange>, ResourceStoreError>;

    /// Delete a course. Returns `false` when it was already absent.
    async fn delete(&self, id: &CourseId) -> Result<bool, ResourceStoreError>;
}

/// Port for section documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionRepository: Send + Sync {
    /// Find a section by id.
    async fn find_by_id(&self, id: &SectionId) -> Result<Option<Section>, ResourceStoreError>;

    /// Create or replace a section.
    async fn save(&self, section: &Section) -> Result<(), ResourceStoreError>;

    /// Delete a section. Returns `false` when it was already absent.
    async fn delete(&self, id: &SectionId) -> Result<bool, ResourceStoreError>;
}

/// Port for sub-section documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubSectionRepository: Send + Sync {
    /// Find a sub-section by id.
    async fn find_by_id(&self, id: &SubSectionId)
    -> Result<Option<SubSection>, ResourceStoreError>;

    /// Create or replace a sub-section.
    async fn save(&self, sub_section: &SubSection) -> Result<(), ResourceStoreError>;

    /// Delete a sub-section. Returns `false` when it was already absent.
    async fn delete(&self, id: &SubSectionId) -> Result<bool, ResourceStoreError>;
}

/// Port for user documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, ResourceStoreError>;

    /// Create or replace a user.
    async fn save(&self, user: &User) -> Result<(), ResourceStoreError>;

    /// Atomically append `course_id` and `progress_id` to the user's lists,
    /// skipping values already present.
    ///
    /// Returns the updated user with the change applied to `courses`, or
    /// `None` when the user does not exist. Exactly one of several concurrent
    /// calls for the same course observes [`MembershipChange::Added`].
    async fn record_enrollment(
        &self,
        id: &UserId,
        course_id: &CourseId,
        progress_id: &CourseProgressId,
    ) -> Result<Option<RecordedEnrollment>, ResourceStoreError>;

    /// Atomically append `course_id` to the user's course list unless present.
    ///
    /// Used for authored courses. Returns `None` when the user does not exist.
    async fn add_course(
        &self,
        id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<MembershipChange>, ResourceStoreError>;

    /// Atomically pull `course_id` (and `progress_id` when given) from the
    /// user's lists. Returns `false` when the user does not exist.
    async fn withdraw_course(
        &self,
        id: &UserId,
        course_id: &CourseId,
        progress_id: Option<CourseProgressId>,
    ) -> Result<bool, ResourceStoreError>;
}

/// Port for course progress documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseProgressRepository: Send + Sync {
    /// Find the progress record for a (course, user) pair.
    async fn find_for(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<Option<CourseProgress>, ResourceStoreError>;

    /// Atomically insert `candidate` unless a record already exists for its
    /// (course, user) pair; returns whichever record is stored afterwards.
    async fn create_or_get(
        &self,
        candidate: CourseProgress,
    ) -> Result<CourseProgress, ResourceStoreError>;

    /// Delete a progress record. Returns `false` when it was already absent.
    async fn delete(&self, id: &CourseProgressId) -> Result<bool, ResourceStoreError>;
}

/// Port for category documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Find a category by id.
    async fn find_by_id(&self, id: &CategoryId) -> Result<Option<Category>, ResourceStoreError>;

    /// Create or replace a category.
    async fn save(&self, category: &Category) -> Result<(), ResourceStoreError>;

    /// Atomically append `course_id` to the category unless present.
    /// Returns `None` when the category does not exist.
    async fn attach_course(
        &self,
        id: &CategoryId,
        course_id: &CourseId,
    ) -> Result<Option<MembershipChange>, ResourceStoreError>;

    /// Atomically pull `course_id` from the category's course list.
    /// Returns `false` when the category does not exist.
    async fn detach_course(
        &self,
        id: &CategoryId,
        course_id: &CourseId,
    ) -> Result<bool, ResourceStoreError>;
}
