use crate::error::{BulkEmailError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a learner or staff member
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse a user identifier, rejecting blank input
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BulkEmailError::InvalidUserId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = BulkEmailError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Identifier of a course run, e.g. `course-v1:Org+CS101+2026`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(String);

impl CourseId {
    /// Parse a course identifier, rejecting blank input
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BulkEmailError::InvalidCourseId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CourseId {
    type Err = BulkEmailError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A user's request to stop receiving bulk email for one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Optout {
    pub user_id: UserId,
    pub course_id: CourseId,
}

impl Optout {
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self { user_id, course_id }
    }
}

/// One row of the global bulk email switch.
///
/// Rows are append-only; the row with the latest `change_date` is the
/// effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEmailFlag {
    pub enabled: bool,
    /// When set, instructors may only send bulk email from courses that
    /// hold a [`CourseAuthorization`] with `email_enabled`.
    pub require_course_email_auth: bool,
    pub change_date: DateTime<Utc>,
    pub changed_by: Option<String>,
}

impl BulkEmailFlag {
    pub fn new(enabled: bool, require_course_email_auth: bool) -> Self {
        Self {
            enabled,
            require_course_email_auth,
            change_date: Utc::now(),
            changed_by: None,
        }
    }

    /// Snapshot used when no row has ever been stored
    pub fn disabled() -> Self {
        Self::new(false, true)
    }

    pub fn changed_by<S: Into<String>>(mut self, user: S) -> Self {
        self.changed_by = Some(user.into());
        self
    }

    pub fn at(mut self, change_date: DateTime<Utc>) -> Self {
        self.change_date = change_date;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Per-course permission to use bulk email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAuthorization {
    pub course_id: CourseId,
    pub email_enabled: bool,
}

impl CourseAuthorization {
    pub fn new(course_id: CourseId, email_enabled: bool) -> Self {
        Self {
            course_id,
            email_enabled,
        }
    }
}

impl fmt::Display for CourseAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.email_enabled { "enabled" } else { "disabled" };
        write!(f, "Course '{}': Instructor Email {}", self.course_id, state)
    }
}
