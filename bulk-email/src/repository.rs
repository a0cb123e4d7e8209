use crate::{error::BulkEmailError, models::*};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

pub mod postgres;

pub use postgres::PostgresBulkEmailRepository;

/// Read access to the bulk email records.
///
/// Lookups that find nothing return `Ok(false)` / `Ok(None)`; `Err` is
/// reserved for failures of the store itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BulkEmailRepository: Send + Sync {
    /// Check whether an opt-out exists for exactly this user and course
    async fn find_optout(&self, user_id: &UserId, course_id: &CourseId) -> Result<bool, BulkEmailError>;

    /// Snapshot of the most recently effective flag row, if any
    async fn current_flag(&self) -> Result<Option<BulkEmailFlag>, BulkEmailError>;

    async fn find_course_authorization(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<CourseAuthorization>, BulkEmailError>;
}

/// In-memory bulk email store for testing and development
pub struct InMemoryBulkEmailRepository {
    optouts: Arc<DashMap<(UserId, CourseId), Optout>>,
    flags: Arc<RwLock<Vec<BulkEmailFlag>>>,
    course_authorizations: Arc<DashMap<CourseId, CourseAuthorization>>,
}

impl InMemoryBulkEmailRepository {
    pub fn new() -> Self {
        Self {
            optouts: Arc::new(DashMap::new()),
            flags: Arc::new(RwLock::new(Vec::new())),
            course_authorizations: Arc::new(DashMap::new()),
        }
    }

    pub fn insert_optout(&self, optout: Optout) {
        let key = (optout.user_id.clone(), optout.course_id.clone());
        self.optouts.insert(key, optout);
    }

    pub fn remove_optout(&self, user_id: &UserId, course_id: &CourseId) -> bool {
        self.optouts
            .remove(&(user_id.clone(), course_id.clone()))
            .is_some()
    }

    /// Append a flag row; history is kept like the persistent store does
    pub fn push_flag(&self, flag: BulkEmailFlag) {
        self.flags.write().push(flag);
    }

    /// Insert or replace the authorization for its course
    pub fn set_course_authorization(&self, authorization: CourseAuthorization) {
        self.course_authorizations
            .insert(authorization.course_id.clone(), authorization);
    }
}

impl Default for InMemoryBulkEmailRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BulkEmailRepository for InMemoryBulkEmailRepository {
    async fn find_optout(&self, user_id: &UserId, course_id: &CourseId) -> Result<bool, BulkEmailError> {
        Ok(self
            .optouts
            .contains_key(&(user_id.clone(), course_id.clone())))
    }

    async fn current_flag(&self) -> Result<Option<BulkEmailFlag>, BulkEmailError> {
        // max_by_key keeps the last of equal dates, i.e. the newest insert
        Ok(self
            .flags
            .read()
            .iter()
            .max_by_key(|flag| flag.change_date)
            .cloned())
    }

    async fn find_course_authorization(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<CourseAuthorization>, BulkEmailError> {
        Ok(self
            .course_authorizations
            .get(course_id)
            .map(|entry| entry.value().clone()))
    }
}
