use super::AppState;
use super::extract::{CurrentUser, JsonBody, extract_token};
use crate::catalog::{BookDetail, BookPage, BookSummary, NewBook, NewReview, ReviewView};
use crate::db::User;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Liveness probe.
pub async fn ping() -> Json<Value> {
    Json(serde_json::json!({ "message": "pong" }))
}

// ============================================================================
// BOOKS
// ============================================================================

/// Raw listing parameters. Kept as strings so malformed numbers fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    genre: Option<String>,
    author: Option<String>,
    sort: Option<String>,
}

/// List books with filters, rating sort and pagination.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookPage>> {
    let query = state.catalog.query(
        params.page.as_deref(),
        params.limit.as_deref(),
        params.genre.as_deref(),
        params.author.as_deref(),
        params.sort.as_deref(),
    );

    Ok(Json(state.catalog.list_books(&query)?))
}

/// Book details with reviews and average rating.
pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookDetail>> {
    Ok(Json(state.catalog.get_book(&id)?))
}

/// Submit a book.
pub async fn create_book(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonBody(req): JsonBody<NewBook>,
) -> Result<(StatusCode, Json<BookSummary>)> {
    let book = state.catalog.add_book(req, &current.user)?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Reviews of a book, newest first.
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewView>>> {
    Ok(Json(state.catalog.list_reviews(&id)?))
}

/// Submit a review.
pub async fn create_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current: CurrentUser,
    JsonBody(req): JsonBody<NewReview>,
) -> Result<(StatusCode, Json<ReviewView>)> {
    let review = state.catalog.add_review(&id, req, &current.user)?;
    Ok((StatusCode::CREATED, Json(review)))
}

// ============================================================================
// AUTH API
// ============================================================================

/// Signup request. Non-string values read as empty and fail validation.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    username: Option<Value>,
    #[serde(default)]
    email: Option<Value>,
    #[serde(default)]
    password: Option<Value>,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: Option<Value>,
    #[serde(default)]
    password: Option<Value>,
}

fn as_text(value: &Option<Value>) -> &str {
    value.as_ref().and_then(Value::as_str).unwrap_or_default()
}

/// Public user fields.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    id: String,
    username: String,
    email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Token response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    token: String,
    user: UserResponse,
}

/// Auth signup.
pub async fn auth_signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let (user, token) = state
        .auth
        .signup(
            as_text(&req.username),
            as_text(&req.email),
            as_text(&req.password),
        )?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Auth login.
pub async fn auth_login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let (user, token) = state
        .auth
        .login(as_text(&req.email), as_text(&req.password))?;

    Ok(Json(TokenResponse {
        token,
        user: user.into(),
    }))
}

/// Auth logout. Succeeds whether or not the token was still valid.
pub async fn auth_logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    if let Some(token) = extract_token(&headers) {
        state.auth.logout(&token)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Get current user info.
pub async fn auth_me(current: CurrentUser) -> Json<UserResponse> {
    Json(current.user.into())
}
