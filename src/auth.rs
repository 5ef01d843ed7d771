//! Request authentication and ownership checks. Every operation takes
//! the verified caller explicitly; nothing reads ambient request state.

use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::{IdentityProvider, ROLE_EDUCATOR};
use crate::models::Course;
use crate::store::CourseStore;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

/// Resolves the bearer token to a verified subject. The token itself
/// is never inspected locally.
pub async fn authenticate(
    identity: &dyn IdentityProvider,
    bearer: Option<&str>,
) -> Result<AuthUser, ApiError> {
    let token = bearer
        .ok_or_else(|| ApiError::Authentication("no authorization token provided".into()))?;
    let verified = identity.verify_token(token).await?;
    tracing::debug!(subject = %verified.subject, session = %verified.session, "token verified");
    Ok(AuthUser { id: verified.subject })
}

/// Authenticates and additionally requires the educator role.
pub async fn require_educator(
    identity: &dyn IdentityProvider,
    bearer: Option<&str>,
) -> Result<AuthUser, ApiError> {
    let user = authenticate(identity, bearer).await?;
    match identity.role_of(&user.id).await?.as_deref() {
        Some(ROLE_EDUCATOR) => Ok(user),
        _ => Err(ApiError::Forbidden("educator role required".into())),
    }
}

/// Loads the course and confirms the actor owns it. Absence is reported
/// before ownership, so a non-owner probing random ids learns nothing
/// it could not learn from the public catalog.
pub async fn authorize_owner(
    store: &dyn CourseStore,
    actor: &AuthUser,
    course_id: Uuid,
) -> Result<Course, ApiError> {
    let course = store
        .get_course(course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("course not found".into()))?;
    if course.educator_id != actor.id {
        return Err(ApiError::Forbidden("you are not authorized to manage this course".into()));
    }
    Ok(course)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateCourseInput;
    use crate::store::mem::MemStore;
    use crate::testutil::MockIdentity;

    #[tokio::test]
    async fn missing_token_is_authentication_error() {
        let identity = MockIdentity::new();
        let err = authenticate(&identity, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn unknown_token_is_authentication_error() {
        let identity = MockIdentity::new();
        let err = authenticate(&identity, Some("tok_bogus")).await.unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn educator_gate_checks_role() {
        let identity = MockIdentity::new();
        identity.add_token("tok_stu", "stu_1").await;
        identity.add_token("tok_edu", "edu_1").await;
        identity.set_role("edu_1", ROLE_EDUCATOR).await;

        let err = require_educator(&identity, Some("tok_stu")).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        let user = require_educator(&identity, Some("tok_edu")).await.unwrap();
        assert_eq!(user.id, "edu_1");
    }

    #[tokio::test]
    async fn ownership_distinguishes_absent_from_foreign() {
        let store = MemStore::new();
        let course = crate::models::Course::new(
            "edu_1".into(),
            CreateCourseInput {
                title: "Rust".into(),
                description: String::new(),
                price: 10.0,
                discount: 0,
            },
            None,
        );
        store.insert_course(&course).await.unwrap();

        let owner = AuthUser { id: "edu_1".into() };
        let stranger = AuthUser { id: "edu_2".into() };

        assert!(authorize_owner(&store, &owner, course.id).await.is_ok());
        let err = authorize_owner(&store, &stranger, course.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        let err = authorize_owner(&store, &owner, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
