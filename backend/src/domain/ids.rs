//! Strongly typed record identifiers and id-set helpers.
//!
//! Every collection in the resource store is keyed by a UUID. Wrapping each in
//! its own newtype keeps a `SectionId` from ever being passed where a
//! `CourseId` is expected.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    /// The input was empty.
    Empty {
        /// Identifier type being parsed.
        kind: &'static str,
    },
    /// The input is not a UUID.
    Invalid {
        /// Identifier type being parsed.
        kind: &'static str,
    },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} must not be empty"),
            Self::Invalid { kind } => write!(f, "{kind} must be a valid UUID"),
        }
    }
}

impl std::error::Error for IdValidationError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid);

        impl $name {
            /// Validate and construct the identifier from borrowed input.
            pub fn new(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
                let raw = id.as_ref();
                if raw.trim().is_empty() {
                    return Err(IdValidationError::Empty { kind: $kind });
                }
                if raw.trim() != raw {
                    return Err(IdValidationError::Invalid { kind: $kind });
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdValidationError::Invalid { kind: $kind })
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::new(value)
            }
        }
    };
}

define_id! {
    /// Identifier of a course document.
    CourseId => "course id"
}
define_id! {
    /// Identifier of a course section.
    SectionId => "section id"
}
define_id! {
    /// Identifier of a sub-section (one video lecture).
    SubSectionId => "sub-section id"
}
define_id! {
    /// Identifier of a user account.
    UserId => "user id"
}
define_id! {
    /// Identifier of a per-user course progress record.
    CourseProgressId => "course progress id"
}
define_id! {
    /// Identifier of a course category.
    CategoryId => "category id"
}

/// De-duplicate identifiers while keeping first-seen order.
///
/// Batch workflows run this before fanning out so a course listed twice in a
/// request is processed (and charged) once.
///
/// # Examples
/// ```
/// use course_backend::domain::{CourseId, unique_ids};
///
/// let a = CourseId::random();
/// let b = CourseId::random();
/// assert_eq!(unique_ids([a, b, a]), vec![a, b]);
/// ```
pub fn unique_ids<I>(ids: impl IntoIterator<Item = I>) -> Vec<I>
where
    I: Copy + Eq + Hash,
{
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Append `id` to `ids` unless it is already present. Returns whether it was added.
pub fn push_unique<I: PartialEq>(ids: &mut Vec<I>, id: I) -> bool {
    if ids.contains(&id) {
        return false;
    }
    ids.push(id);
    true
}

/// Remove every occurrence of `id` from `ids`. Returns whether anything was removed.
pub fn pull<I: PartialEq>(ids: &mut Vec<I>, id: &I) -> bool {
    let before = ids.len();
    ids.retain(|existing| existing != id);
    ids.len() != before
}
