use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    api::{AppState, JsonBody},
    error::AppResult,
    models::{FilmId, Review, ReviewId, ReviewPayload, UserId},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsQuery {
    film_id: Option<FilmId>,
    count: Option<usize>,
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewsQuery>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state
        .services
        .reviews
        .get_reviews(params.film_id, params.count)
        .await?;
    Ok(Json(reviews))
}

pub async fn create_review(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ReviewPayload>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state.services.reviews.add_review(payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update_review(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ReviewPayload>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.services.reviews.update_review(payload).await?))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.services.reviews.get_review(id).await?))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> AppResult<StatusCode> {
    state.services.reviews.delete_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(ReviewId, UserId)>,
) -> AppResult<StatusCode> {
    state.services.reviews.add_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(ReviewId, UserId)>,
) -> AppResult<StatusCode> {
    state.services.reviews.remove_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn add_dislike(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(ReviewId, UserId)>,
) -> AppResult<StatusCode> {
    state.services.reviews.add_dislike(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_dislike(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(ReviewId, UserId)>,
) -> AppResult<StatusCode> {
    state.services.reviews.remove_dislike(id, user_id).await?;
    Ok(StatusCode::OK)
}
