//! Role-based access control extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! match with 403 Forbidden.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use convene_core::error::CoreError;
use convene_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `facilitator` role.
///
/// ```ignore
/// async fn create(RequireFacilitator(user): RequireFacilitator) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireFacilitator(pub AuthUser);

impl FromRequestParts<AppState> for RequireFacilitator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Facilitator {
            return Err(AppError::Core(CoreError::Forbidden(
                "Facilitator role required".into(),
            )));
        }
        Ok(RequireFacilitator(user))
    }
}

/// Requires the `seeker` role.
pub struct RequireSeeker(pub AuthUser);

impl FromRequestParts<AppState> for RequireSeeker {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Seeker {
            return Err(AppError::Core(CoreError::Forbidden(
                "Seeker role required".into(),
            )));
        }
        Ok(RequireSeeker(user))
    }
}
