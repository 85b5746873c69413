use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{AppState, JsonBody},
    error::AppResult,
    models::{Director, DirectorId, DirectorPatch, Genre, Mpa, NewDirector},
};

pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.services.catalog.get_genres().await?))
}

pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.services.catalog.get_genre(id).await?))
}

pub async fn list_mpa(State(state): State<AppState>) -> AppResult<Json<Vec<Mpa>>> {
    Ok(Json(state.services.catalog.get_mpa_ratings().await?))
}

pub async fn get_mpa(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Mpa>> {
    Ok(Json(state.services.catalog.get_mpa(id).await?))
}

pub async fn list_directors(State(state): State<AppState>) -> AppResult<Json<Vec<Director>>> {
    Ok(Json(state.services.catalog.get_directors().await?))
}

pub async fn create_director(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewDirector>,
) -> AppResult<(StatusCode, Json<Director>)> {
    let director = state.services.catalog.add_director(payload).await?;
    Ok((StatusCode::CREATED, Json(director)))
}

pub async fn update_director(
    State(state): State<AppState>,
    JsonBody(patch): JsonBody<DirectorPatch>,
) -> AppResult<Json<Director>> {
    Ok(Json(state.services.catalog.update_director(patch).await?))
}

pub async fn get_director(
    State(state): State<AppState>,
    Path(id): Path<DirectorId>,
) -> AppResult<Json<Director>> {
    Ok(Json(state.services.catalog.get_director(id).await?))
}

pub async fn delete_director(
    State(state): State<AppState>,
    Path(id): Path<DirectorId>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_director(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
