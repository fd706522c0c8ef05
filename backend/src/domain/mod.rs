//! Domain primitives, ports and orchestration services.
//!
//! Purpose: model the marketplace records (courses, their content tree,
//! users, progress and categories) and own the two multi-record workflows:
//! paying for and enrolling in courses, and deleting a course with all its
//! dependents. Adapters live in `crate::outbound` and plug in through the
//! traits in [`ports`].
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: caller-facing failure payload.
//! - [`EnrollmentOrchestrator`]: `capture_payment`, `verify_and_enroll`,
//!   `enroll_one`, `send_payment_receipt`.
//! - [`CourseAuthoringService`]: `create_course`.
//! - [`CourseDeletionOrchestrator`]: `delete_course`.
//! - [`CourseQueryService`]: course trees with their total duration.

pub mod course_authoring;
pub mod course_deletion;
pub mod course_query;
pub mod enrollment;
pub mod error;
pub(crate) mod error_mapping;
pub mod notifications;
pub mod ports;

mod course;
mod duration;
mod ids;
mod media;
mod payment;
mod progress;
mod user;

pub use self::course::{Course, CourseStatus, Section, SubSection};
pub use self::course_authoring::{
    CourseAuthoringConfig, CourseAuthoringPorts, CourseAuthoringService, NewCourse,
};
pub use self::course_deletion::{
    CascadeFailure, CascadeStep, CourseDeletionConfig, CourseDeletionOrchestrator,
    CourseDeletionPorts, CourseDeletionReport,
};
pub use self::course_query::{CourseDetails, CourseQueryService, FullCourseDetails, SectionDetails};
pub use self::duration::{CourseDuration, total_duration};
pub use self::enrollment::{
    CourseEnrollmentOutcome, EnrolledCourse, EnrollmentConfig, EnrollmentOrchestrator,
    EnrollmentPorts, EnrollmentReport, FailedCourse,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    CategoryId, CourseId, CourseProgressId, IdValidationError, SectionId, SubSectionId, UserId,
    pull, push_unique, unique_ids,
};
pub use self::media::{MediaUrl, MediaUrlValidationError};
pub use self::payment::{
    PaymentConfirmation, PaymentSecretError, PaymentSignatureVerifier, format_minor_units,
    generate_receipt,
};
pub use self::progress::{Category, CourseProgress};
pub use self::user::User;

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use course_backend::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("course missing"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
