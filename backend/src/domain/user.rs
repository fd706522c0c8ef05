//! User accounts as seen by the enrollment and deletion workflows.

use serde::{Deserialize, Serialize};

use super::ids::{CourseId, CourseProgressId, UserId, pull, push_unique};

/// A marketplace user (student or instructor).
///
/// ## Invariants
/// - `courses` and `course_progress` have set semantics.
/// - Once an enrollment completes, every id in `courses` that the user bought
///   has a matching entry in `course_progress`, and the reverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Unique contact address.
    pub email: String,
    /// Given name used in email greetings.
    pub first_name: String,
    /// Enrolled (or, for instructors, authored) course ids.
    pub courses: Vec<CourseId>,
    /// Progress record ids, one per enrolled course.
    pub course_progress: Vec<CourseProgressId>,
}

impl User {
    /// Record an enrollment on both lists. Returns whether the course id was
    /// newly appended.
    pub fn enroll(&mut self, course_id: CourseId, progress_id: CourseProgressId) -> bool {
        push_unique(&mut self.course_progress, progress_id);
        push_unique(&mut self.courses, course_id)
    }

    /// Drop a course and, when known, its progress id. Returns whether anything changed.
    pub fn withdraw(&mut self, course_id: &CourseId, progress_id: Option<&CourseProgressId>) -> bool {
        let removed_course = pull(&mut self.courses, course_id);
        let removed_progress = progress_id
            .map(|id| pull(&mut self.course_progress, id))
            .unwrap_or(false);
        removed_course || removed_progress
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn user() -> User {
        User {
            id: UserId::random(),
            email: "ada@example.test".to_owned(),
            first_name: "Ada".to_owned(),
            courses: Vec::new(),
            course_progress: Vec::new(),
        }
    }

    #[rstest]
    fn enroll_is_idempotent(mut user: User) {
        let course = CourseId::random();
        let progress = CourseProgressId::random();

        assert!(user.enroll(course, progress));
        assert!(!user.enroll(course, progress));
        assert_eq!(user.courses, vec![course]);
        assert_eq!(user.course_progress, vec![progress]);
    }

    #[rstest]
    fn withdraw_pulls_both_lists(mut user: User) {
        let course = CourseId::random();
        let progress = CourseProgressId::random();
        user.enroll(course, progress);

        assert!(user.withdraw(&course, Some(&progress)));
        assert!(user.courses.is_empty());
        assert!(user.course_progress.is_empty());
        assert!(!user.withdraw(&course, Some(&progress)));
    }

    #[rstest]
    fn withdraw_without_progress_keeps_progress_list(mut user: User) {
        let course = CourseId::random();
        let progress = CourseProgressId::random();
        user.enroll(course, progress);

        assert!(user.withdraw(&course, None));
        assert_eq!(user.course_progress, vec![progress]);
    }
}
