use axum::{extract::FromRequestParts, RequestPartsExt};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use http::request::Parts;
use sneakers_types::claim::ApiClaim;
use tracing::debug;

use crate::{error::ApiError, state::AppState};

/// Acting user, taken from `Authorization: Bearer` token
impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                debug!("No bearer token: {e}");
                ApiError::Unauthenticated
            })?;

        state
            .tokens()
            .validate::<ApiClaim>(token.0.token())
            .map_err(|e| {
                debug!("Failed to validate token: {e}");
                ApiError::Unauthenticated
            })
    }
}

pub fn acting_user(claim: &ApiClaim) -> Result<i64, ApiError> {
    claim.user_id().ok_or_else(|| {
        debug!("Token subject {} is not user id", claim.sub);
        ApiError::Unauthenticated
    })
}
