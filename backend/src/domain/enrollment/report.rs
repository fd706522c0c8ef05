//! Per-course outcomes of a verified purchase.

use serde::Serialize;

use crate::domain::{CourseId, CourseProgressId, Error, UserId};

/// A course the user is now enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    /// Enrolled course.
    pub course_id: CourseId,
    /// Progress record paired with the enrollment.
    pub progress_id: CourseProgressId,
    /// The user already held this enrollment before the call.
    pub already_enrolled: bool,
    /// Whether the confirmation email was accepted by the mail transport.
    pub notified: bool,
}

/// A course whose enrollment could not be completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCourse {
    /// Course that failed.
    pub course_id: CourseId,
    /// Caller-safe reason.
    pub error: Error,
}

/// Outcome of enrolling in one course.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CourseEnrollmentOutcome {
    /// The student holds the course, newly or from an earlier attempt.
    Enrolled(EnrolledCourse),
    /// The course could not be enrolled; other courses are unaffected.
    Failed(FailedCourse),
}

impl CourseEnrollmentOutcome {
    /// Course this outcome refers to.
    pub fn course_id(&self) -> CourseId {
        match self {
            Self::Enrolled(enrolled) => enrolled.course_id,
            Self::Failed(failed) => failed.course_id,
        }
    }
}

/// Aggregate result of `verify_and_enroll`, one outcome per distinct course
/// in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentReport {
    /// Purchasing user.
    pub user_id: UserId,
    /// Gateway order the payment settled.
    pub order_id: String,
    /// Per-course outcomes.
    pub outcomes: Vec<CourseEnrollmentOutcome>,
}

impl EnrollmentReport {
    /// Courses that were enrolled successfully.
    pub fn enrolled(&self) -> impl Iterator<Item = &EnrolledCourse> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            CourseEnrollmentOutcome::Enrolled(enrolled) => Some(enrolled),
            CourseEnrollmentOutcome::Failed(_) => None,
        })
    }

    /// Courses whose enrollment failed.
    pub fn failed(&self) -> impl Iterator<Item = &FailedCourse> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            CourseEnrollmentOutcome::Enrolled(_) => None,
            CourseEnrollmentOutcome::Failed(failed) => Some(failed),
        })
    }

    /// True when every course enrolled.
    pub fn is_complete(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Collapse into a single result for callers that want one status.
    ///
    /// Any failed course yields a `PartialFailure` error whose details list
    /// the failed course ids and reasons.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.is_complete() {
            return Ok(self);
        }
        let failed: Vec<&FailedCourse> = self.failed().collect();
        let details = serde_json::json!({
            "orderId": self.order_id,
            "failed": serde_json::to_value(&failed).unwrap_or_default(),
        });
        Err(Error::partial_failure(format!(
            "{} of {} courses could not be enrolled",
            failed.len(),
            self.outcomes.len()
        ))
        .with_details(details))
    }
}
