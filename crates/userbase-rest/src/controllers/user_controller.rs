//! User controller.

use crate::{
    extractors::{ValidatedJson, ValidatedJsonRejection},
    responses::{created, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::debug;
use userbase_core::{UserId, UserbaseError};
use userbase_service::{RegisterRequest, Registration, UserListQuery, UserListResponse, UserResponse};

/// Summary for failed registrations.
pub const REGISTER_FAILED: &str = "An error occurred while registering the user.";
/// Summary for failed lookups.
pub const FETCH_FAILED: &str = "An error occurred while fetching the user.";
/// Summary for failed listings.
pub const LIST_FAILED: &str = "An error occurred while listing users.";

/// Creates the user router, mounted under `/user`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
}

/// Register a new user.
///
/// 201 with the user when created, 200 with a message when the email is taken.
async fn register(
    State(state): State<AppState>,
    payload: Result<ValidatedJson<RegisterRequest>, ValidatedJsonRejection>,
) -> ApiResult<Response> {
    let ValidatedJson(request) = payload.map_err(|r| r.into_app_error(REGISTER_FAILED))?;
    debug!("Register request: {}", request.masked_email());

    let registration = state
        .user_service
        .register(request)
        .await
        .map_err(AppError::context(REGISTER_FAILED))?;

    Ok(match registration {
        Registration::Created(user) => created(*user).into_response(),
        Registration::AlreadyExists(message) => (StatusCode::OK, Json(message)).into_response(),
    })
}

/// List users.
async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> ApiResult<(StatusCode, Json<UserListResponse>)> {
    let Query(query) = query.map_err(|rejection| {
        AppError::new(LIST_FAILED, UserbaseError::validation(rejection.body_text()))
    })?;
    debug!("List users request: {:?}", query);

    let response = state
        .user_service
        .list_users(query)
        .await
        .map_err(AppError::context(LIST_FAILED))?;
    Ok(ok(response))
}

/// Get a user by ID.
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    debug!("Get user request: {}", id);

    let user_id = parse_user_id(&id)?;
    let response = state
        .user_service
        .get_user(user_id)
        .await
        .map_err(AppError::context(FETCH_FAILED))?;
    Ok(ok(response))
}

/// Helper to parse user ID from path parameter.
fn parse_user_id(id: &str) -> Result<UserId, AppError> {
    id.parse().map_err(|_| {
        AppError::new(
            FETCH_FAILED,
            UserbaseError::validation(format!("Invalid user ID: {id}")),
        )
    })
}
