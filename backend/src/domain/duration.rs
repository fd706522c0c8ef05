//! Course length aggregation for read paths.

use std::fmt;

use serde::{Serialize, Serializer};

use super::course::SubSection;

/// Total running time of a course, in whole seconds.
///
/// Displays as `"{hours}h {minutes}m {seconds}s"`.
///
/// # Examples
/// ```
/// use course_backend::domain::CourseDuration;
///
/// assert_eq!(CourseDuration::from_secs(3_725).to_string(), "1h 2m 5s");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct CourseDuration(u64);

impl CourseDuration {
    /// Wrap a number of seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Total seconds.
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Split into `(hours, minutes, seconds)`.
    pub const fn hms(self) -> (u64, u64, u64) {
        (self.0 / 3_600, (self.0 % 3_600) / 60, self.0 % 60)
    }
}

impl fmt::Display for CourseDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, minutes, seconds) = self.hms();
        write!(f, "{hours}h {minutes}m {seconds}s")
    }
}

impl Serialize for CourseDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sum the durations of every sub-section in a course.
///
/// Pure and order independent; callers pass sub-sections in document order
/// (sections flattened) but any permutation yields the same total.
pub fn total_duration<'a>(sub_sections: impl IntoIterator<Item = &'a SubSection>) -> CourseDuration {
    let secs = sub_sections
        .into_iter()
        .fold(0_u64, |total, sub_section| total.saturating_add(sub_section.duration_secs));
    CourseDuration(secs)
}
