use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use catalog_core::{CatalogError, User, UserId};
use tracing::debug;

use crate::error::ServiceError;
use crate::state::ServiceState;

/// The authenticated caller, resolved from `Authorization: Bearer <user-id>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<ServiceState> for CurrentUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| ServiceError::unauthorized("missing bearer token"))?;

        let user_id = token
            .parse::<UserId>()
            .map_err(|_| ServiceError::unauthorized("malformed bearer token"))?;

        match state.api.get_user(user_id) {
            Ok(user) => Ok(Self(user)),
            Err(CatalogError::NotFound { .. }) => {
                debug!(user_id = %user_id, "bearer token names an unknown user");
                Err(ServiceError::unauthorized("could not validate credentials"))
            }
            Err(err) => Err(err.into()),
        }
    }
}
