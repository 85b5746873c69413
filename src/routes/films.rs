use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    api::{AppState, JsonBody},
    error::AppResult,
    middleware::request_id::RequestId,
    models::{DirectorId, Film, FilmId, FilmPatch, NewFilm, UserId},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularQuery {
    count: Option<usize>,
    genre_id: Option<i64>,
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonQuery {
    user_id: UserId,
    friend_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorQuery {
    sort_by: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
    #[serde(default = "default_search_by")]
    by: String,
}

fn default_search_by() -> String {
    "title,director".to_string()
}

pub async fn list_films(State(state): State<AppState>) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.services.films.get_all_films().await?))
}

pub async fn create_film(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewFilm>,
) -> AppResult<(StatusCode, Json<Film>)> {
    let film = state.services.films.add_film(payload).await?;
    Ok((StatusCode::CREATED, Json(film)))
}

pub async fn update_film(
    State(state): State<AppState>,
    JsonBody(patch): JsonBody<FilmPatch>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.services.films.update_film(patch).await?))
}

pub async fn get_film(
    State(state): State<AppState>,
    Path(id): Path<FilmId>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.services.films.get_film(id).await?))
}

pub async fn delete_film(
    State(state): State<AppState>,
    Path(id): Path<FilmId>,
) -> AppResult<StatusCode> {
    state.services.films.delete_film(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<StatusCode> {
    state.services.films.add_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<StatusCode> {
    state.services.films.remove_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

/// Handler for the popular films ranking
pub async fn popular_films(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<Vec<Film>>> {
    tracing::info!(
        request_id = %request_id,
        count = ?params.count,
        genre_id = ?params.genre_id,
        year = ?params.year,
        "Processing popular films request"
    );

    let films = state
        .services
        .popularity
        .get_most_popular_films(params.count, params.genre_id, params.year)
        .await?;
    Ok(Json(films))
}

pub async fn common_films(
    State(state): State<AppState>,
    Query(params): Query<CommonQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let films = state
        .services
        .popularity
        .get_common_films(params.user_id, params.friend_id)
        .await?;
    Ok(Json(films))
}

pub async fn director_films(
    State(state): State<AppState>,
    Path(director_id): Path<DirectorId>,
    Query(params): Query<DirectorQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let films = state
        .services
        .popularity
        .sort_films(director_id, &params.sort_by)
        .await?;
    Ok(Json(films))
}

pub async fn search_films(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let films = state
        .services
        .popularity
        .search_films(&params.query, &params.by)
        .await?;
    Ok(Json(films))
}
