use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    api::{AppState, JsonBody},
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Event, Film, Friendship, NewUser, User, UserId, UserPatch},
};

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.services.users.get_all_users().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.users.add_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> AppResult<Json<User>> {
    Ok(Json(state.services.users.update_user(patch).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> AppResult<Json<User>> {
    Ok(Json(state.services.users.get_user(id).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> AppResult<StatusCode> {
    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_friends(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.services.friendships.get_friends(id).await?))
}

pub async fn get_friendships(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<Friendship>>> {
    Ok(Json(state.services.friendships.get_friendships(id).await?))
}

pub async fn add_friend(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<StatusCode> {
    state.services.friendships.add_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<StatusCode> {
    state
        .services
        .friendships
        .remove_friend(id, friend_id)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn get_common_friends(
    State(state): State<AppState>,
    Path((id, other_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<Vec<User>>> {
    let common = state
        .services
        .friendships
        .get_common_friends(id, other_id)
        .await?;
    Ok(Json(common))
}

/// Handler for the recommendations endpoint
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<Film>>> {
    tracing::info!(request_id = %request_id, user_id = id, "Processing recommendation request");

    let films = state
        .services
        .recommendations
        .get_recommendations(id)
        .await?;

    tracing::info!(
        request_id = %request_id,
        recommended = films.len(),
        "Recommendations completed"
    );
    Ok(Json(films))
}

pub async fn get_feed(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(state.services.feed.view_recent_events(id).await?))
}
