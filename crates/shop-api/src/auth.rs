//! Bearer-token extractor for protected routes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use shop_core::RecordId;
use tracing::info;

/// Authenticated caller.
///
/// Add as a handler argument to require a valid `Authorization: Bearer`
/// token; the request is rejected with 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RecordId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match state.gate.authenticate(header) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(err) => {
                info!(path = %parts.uri.path(), reason = %err, "unauthenticated request");
                Err(err.into())
            }
        }
    }
}
