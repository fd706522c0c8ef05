//! References to objects held by the external media store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`MediaUrl::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaUrlValidationError {
    /// The URL was empty.
    Empty,
    /// The URL contains whitespace.
    Whitespace,
}

impl fmt::Display for MediaUrlValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "media url must not be empty"),
            Self::Whitespace => write!(f, "media url must not contain whitespace"),
        }
    }
}

impl std::error::Error for MediaUrlValidationError {}

/// Public URL of an uploaded thumbnail or lecture video.
///
/// ## Invariants
/// - Non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaUrl(String);

impl MediaUrl {
    /// Validate and construct a [`MediaUrl`].
    pub fn new(url: impl Into<String>) -> Result<Self, MediaUrlValidationError> {
        let url = url.into();
        if url.is_empty() {
            return Err(MediaUrlValidationError::Empty);
        }
        if url.chars().any(char::is_whitespace) {
            return Err(MediaUrlValidationError::Whitespace);
        }
        Ok(Self(url))
    }

    /// Storage key addressed by this URL.
    ///
    /// Hosted media URLs look like
    /// `https://host/<cloud>/image/upload/v1712/<folder>/<name>.<ext>`; the key
    /// is `<folder>/<name>`. URLs without an `/upload/` marker use the whole
    /// path. Query strings, fragments and the file extension are dropped.
    ///
    /// # Examples
    /// ```
    /// use course_backend::domain::MediaUrl;
    ///
    /// let url = MediaUrl::new("https://cdn.test/demo/video/upload/v17/course-media/intro.mp4")
    ///     .expect("valid url");
    /// assert_eq!(url.object_key().as_deref(), Some("course-media/intro"));
    /// ```
    pub fn object_key(&self) -> Option<String> {
        let without_query = self
            .0
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let path = match without_query.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, path)| path)?,
            None => without_query.trim_start_matches('/'),
        };
        let path = match path.split_once("/upload/") {
            Some((_, after)) => after,
            None => path,
        };
        let path = strip_version_segment(path);

        let (dir, file) = match path.rsplit_once('/') {
            Some((dir, file)) => (Some(dir), file),
            None => (None, path),
        };
        let stem = match file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file,
        };
        if stem.is_empty() {
            return None;
        }
        Some(match dir {
            Some(dir) if !dir.is_empty() => format!("{dir}/{stem}"),
            _ => stem.to_owned(),
        })
    }
}

fn strip_version_segment(path: &str) -> &str {
    if let Some((head, rest)) = path.split_once('/') {
        let is_version = head.len() > 1
            && head.starts_with('v')
            && head.chars().skip(1).all(|c| c.is_ascii_digit());
        if is_version {
            return rest;
        }
    }
    path
}

impl AsRef<str> for MediaUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MediaUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<MediaUrl> for String {
    fn from(value: MediaUrl) -> Self {
        value.0
    }
}

impl TryFrom<String> for MediaUrl {
    type Error = MediaUrlValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
