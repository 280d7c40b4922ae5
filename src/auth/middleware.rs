use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::gate::authenticate;
use crate::server::AppState;
use crate::types::User;

/// Extractor for optional-auth routes: `Some` for a valid session, `None`
/// otherwise. Never rejects.
pub struct Viewer(pub Option<User>);

/// Extractor that requires a valid session; rejects with 401.
pub struct RequireUser(pub User);

#[derive(Debug)]
pub enum AuthError {
    Unauthenticated,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(parts, "token");
        let email = cookie_value(parts, "email");

        let outcome = authenticate(state.store.as_ref(), token.as_deref(), email.as_deref())
            .map_err(|_| AuthError::InternalError)?;

        Ok(Viewer(outcome.viewer()))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Viewer(viewer) = Viewer::from_request_parts(parts, state).await?;
        viewer.map(RequireUser).ok_or(AuthError::Unauthenticated)
    }
}

/// Finds a cookie by name across all Cookie headers.
pub fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, value) = cookie.split_once('=')?;
            if key.trim() == name {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
}
