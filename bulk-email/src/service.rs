use crate::{
    error::BulkEmailError,
    models::*,
    repository::BulkEmailRepository,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Why bulk email is or is not available for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkEmailAvailability {
    /// The global flag is off, or was never stored
    GloballyDisabled,
    /// Course authorization is required but no course was given
    CourseRequired,
    /// Course authorization is required and the course lacks it
    CourseNotAuthorized,
    CourseAuthorized,
    /// The flag is on and no course authorization is required
    GloballyEnabled,
}

impl BulkEmailAvailability {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::CourseAuthorized | Self::GloballyEnabled)
    }
}

impl fmt::Display for BulkEmailAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::GloballyDisabled => "bulk email is disabled",
            Self::CourseRequired => "course authorization required but no course given",
            Self::CourseNotAuthorized => "course is not authorized for bulk email",
            Self::CourseAuthorized => "course is authorized for bulk email",
            Self::GloballyEnabled => "bulk email is enabled for all courses",
        };
        write!(f, "{}", reason)
    }
}

/// Read-only queries over opt-outs, the global flag and course authorizations
#[derive(Clone)]
pub struct BulkEmailQueryService {
    repository: Arc<dyn BulkEmailRepository>,
}

impl BulkEmailQueryService {
    pub fn new(repository: Arc<dyn BulkEmailRepository>) -> Self {
        Self { repository }
    }

    /// True if the user has opted out of bulk email for the course
    pub async fn has_user_opted_out(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, BulkEmailError> {
        let opted_out = self.repository.find_optout(user_id, course_id).await?;
        debug!(user_id = %user_id, course_id = %course_id, opted_out, "Opt-out check");
        Ok(opted_out)
    }

    /// Whether bulk email may be used, optionally in the context of a course.
    ///
    /// With course authorization required, a missing course id means the
    /// feature is unavailable.
    pub async fn is_bulk_email_enabled(
        &self,
        course_id: Option<&CourseId>,
    ) -> Result<bool, BulkEmailError> {
        Ok(self.availability(course_id).await?.is_enabled())
    }

    /// True if the course holds an authorization with email enabled
    pub async fn is_bulk_email_enabled_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<bool, BulkEmailError> {
        let enabled = self
            .repository
            .find_course_authorization(course_id)
            .await?
            .map(|record| record.email_enabled)
            .unwrap_or(false);
        debug!(course_id = %course_id, enabled, "Course authorization check");
        Ok(enabled)
    }

    /// Evaluate the global flag and course authorization, in that order
    pub async fn availability(
        &self,
        course_id: Option<&CourseId>,
    ) -> Result<BulkEmailAvailability, BulkEmailError> {
        let flag = self.current_flag().await?;

        let availability = if !flag.is_enabled() {
            BulkEmailAvailability::GloballyDisabled
        } else if !flag.require_course_email_auth {
            BulkEmailAvailability::GloballyEnabled
        } else {
            match course_id {
                None => BulkEmailAvailability::CourseRequired,
                Some(course_id) => {
                    if self.is_bulk_email_enabled_for_course(course_id).await? {
                        BulkEmailAvailability::CourseAuthorized
                    } else {
                        BulkEmailAvailability::CourseNotAuthorized
                    }
                }
            }
        };

        debug!(
            course_id = course_id.map(CourseId::as_str),
            %availability,
            "Bulk email availability evaluated"
        );
        Ok(availability)
    }

    /// Effective flag, falling back to disabled when none is stored
    pub async fn current_flag(&self) -> Result<BulkEmailFlag, BulkEmailError> {
        Ok(self
            .repository
            .current_flag()
            .await?
            .unwrap_or_else(BulkEmailFlag::disabled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockBulkEmailRepository;

    fn course(id: &str) -> CourseId {
        CourseId::parse(id).unwrap()
    }

    fn service(mock: MockBulkEmailRepository) -> BulkEmailQueryService {
        BulkEmailQueryService::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_disabled_flag_skips_course_lookup() {
        let mut mock = MockBulkEmailRepository::new();
        mock.expect_current_flag()
            .times(1)
            .returning(|| Ok(Some(BulkEmailFlag::new(false, true))));
        mock.expect_find_course_authorization().times(0);

        let enabled = service(mock)
            .is_bulk_email_enabled(Some(&course("CS101")))
            .await
            .unwrap();
        assert!(!enabled);
    }

    #[tokio::test]
    async fn test_missing_flag_treated_as_disabled() {
        let mut mock = MockBulkEmailRepository::new();
        mock.expect_current_flag().returning(|| Ok(None));
        mock.expect_find_course_authorization().times(0);

        let availability = service(mock).availability(None).await.unwrap();
        assert_eq!(availability, BulkEmailAvailability::GloballyDisabled);
    }

    #[tokio::test]
    async fn test_course_required_without_course_id() {
        let mut mock = MockBulkEmailRepository::new();
        mock.expect_current_flag()
            .returning(|| Ok(Some(BulkEmailFlag::new(true, true))));
        mock.expect_find_course_authorization().times(0);

        let availability = service(mock).availability(None).await.unwrap();
        assert_eq!(availability, BulkEmailAvailability::CourseRequired);
        assert!(!availability.is_enabled());
    }

    #[tokio::test]
    async fn test_course_lookup_uses_given_course() {
        let mut mock = MockBulkEmailRepository::new();
        mock.expect_current_flag()
            .returning(|| Ok(Some(BulkEmailFlag::new(true, true))));
        mock.expect_find_course_authorization()
            .withf(|course_id| course_id.as_str() == "CS101")
            .times(1)
            .returning(|_| Ok(Some(CourseAuthorization::new(course("CS101"), true))));

        let availability = service(mock)
            .availability(Some(&course("CS101")))
            .await
            .unwrap();
        assert_eq!(availability, BulkEmailAvailability::CourseAuthorized);
    }

    #[tokio::test]
    async fn test_flag_storage_error_propagates() {
        let mut mock = MockBulkEmailRepository::new();
        mock.expect_current_flag()
            .returning(|| Err(BulkEmailError::Storage("connection reset".into())));

        let err = service(mock)
            .is_bulk_email_enabled(Some(&course("CS101")))
            .await
            .unwrap_err();
        assert!(err.is_storage_failure());
    }

    #[tokio::test]
    async fn test_course_storage_error_propagates() {
        let mut mock = MockBulkEmailRepository::new();
        mock.expect_current_flag()
            .returning(|| Ok(Some(BulkEmailFlag::new(true, true))));
        mock.expect_find_course_authorization()
            .returning(|_| Err(BulkEmailError::Database(sqlx::Error::PoolTimedOut)));

        let svc = service(mock);
        assert!(svc
            .is_bulk_email_enabled_for_course(&course("CS101"))
            .await
            .is_err());
        assert!(svc
            .is_bulk_email_enabled(Some(&course("CS101")))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_optout_storage_error_propagates() {
        let mut mock = MockBulkEmailRepository::new();
        mock.expect_find_optout()
            .returning(|_, _| Err(BulkEmailError::Storage("timeout".into())));

        let result = service(mock)
            .has_user_opted_out(&UserId::parse("alice").unwrap(), &course("CS101"))
            .await;
        assert!(matches!(result, Err(BulkEmailError::Storage(_))));
    }

    #[test]
    fn test_availability_is_enabled() {
        assert!(BulkEmailAvailability::GloballyEnabled.is_enabled());
        assert!(BulkEmailAvailability::CourseAuthorized.is_enabled());
        assert!(!BulkEmailAvailability::GloballyDisabled.is_enabled());
        assert!(!BulkEmailAvailability::CourseRequired.is_enabled());
        assert!(!BulkEmailAvailability::CourseNotAuthorized.is_enabled());
    }
}
