use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::database::models::user::{NewUser, User, UserPatch};
use crate::error::ApiResult;

use super::AppState;

/// GET /users - all users
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = state.users.list_all().await?;
    Ok(Json(users))
}

/// GET /users/:id - single user by id
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<User>> {
    let Path(id) = path?;
    let user = state.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// POST /users - create a user, the store assigns the id
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<String> {
    let Json(user) = body?;
    let id = state.users.insert(&user).await?;
    info!("Created user {} ({})", id, user.login);
    Ok(format!("User {} was saved", id))
}

/// PUT /users/:id - overwrite name, login and password
pub async fn replace(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Path(id) = path?;
    let Json(body) = body?;

    let user = body.with_id(id);
    state.users.replace(&user).await?;
    Ok(Json(user))
}

/// PATCH /users/:id - update only the supplied fields
pub async fn patch(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Path(id) = path?;
    let Json(patch) = body?;

    let user = state.users.patch(id, &patch).await?;
    Ok(Json(user))
}

/// DELETE /users/:id
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    state.users.delete(id).await?;
    info!("Deleted user {}", id);
    Ok(StatusCode::NO_CONTENT)
}
