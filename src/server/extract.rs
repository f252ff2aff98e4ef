//! Request extractors: caller identity and JSON bodies.

use crate::db::User;
use crate::error::AppError;
use crate::server::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::{HeaderMap, header, request::Parts};
use serde::de::DeserializeOwned;

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
/// Rejects the request with 401 when the token is missing, unknown or
/// expired.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Resolved user.
    pub user: User,
}

/// Extract token from Authorization header.
pub(crate) fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let user = state
            .auth
            .validate_token(&token)?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(Self { user })
    }
}

/// JSON request body. A body that is missing, malformed or not an object
/// becomes a validation error on `body` so every client error shares one
/// response shape.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let message = match &rejection {
                    JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON body",
                    JsonRejection::JsonDataError(_) => "Request body must be a JSON object",
                    _ => "Unreadable request body",
                };
                tracing::debug!(error = %rejection, "Rejected request body");
                Err(AppError::invalid_field("body", message))
            }
        }
    }
}
