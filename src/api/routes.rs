use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::AppState;
use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    routes::{catalog, films, health_check, reviews, users},
};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(user_routes())
        .merge(film_routes())
        .merge(catalog_routes())
        .merge(review_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(users::list_users)
                .post(users::create_user)
                .put(users::update_user),
        )
        .route("/users/:id", get(users::get_user).delete(users::delete_user))
        .route("/users/:id/friends", get(users::get_friends))
        .route("/users/:id/friendships", get(users::get_friendships))
        .route(
            "/users/:id/friends/:friend_id",
            put(users::add_friend).delete(users::remove_friend),
        )
        .route(
            "/users/:id/friends/common/:other_id",
            get(users::get_common_friends),
        )
        .route("/users/:id/recommendations", get(users::get_recommendations))
        .route("/users/:id/feed", get(users::get_feed))
}

fn film_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/films",
            get(films::list_films)
                .post(films::create_film)
                .put(films::update_film),
        )
        .route("/films/popular", get(films::popular_films))
        .route("/films/common", get(films::common_films))
        .route("/films/search", get(films::search_films))
        .route("/films/director/:director_id", get(films::director_films))
        .route("/films/:id", get(films::get_film).delete(films::delete_film))
        .route(
            "/films/:id/like/:user_id",
            put(films::add_like).delete(films::remove_like),
        )
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/genres", get(catalog::list_genres))
        .route("/genres/:id", get(catalog::get_genre))
        .route("/mpa", get(catalog::list_mpa))
        .route("/mpa/:id", get(catalog::get_mpa))
        .route(
            "/directors",
            get(catalog::list_directors)
                .post(catalog::create_director)
                .put(catalog::update_director),
        )
        .route(
            "/directors/:id",
            get(catalog::get_director).delete(catalog::delete_director),
        )
}

fn review_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reviews",
            get(reviews::list_reviews)
                .post(reviews::create_review)
                .put(reviews::update_review),
        )
        .route(
            "/reviews/:id",
            get(reviews::get_review).delete(reviews::delete_review),
        )
        .route(
            "/reviews/:id/like/:user_id",
            put(reviews::add_like).delete(reviews::remove_like),
        )
        .route(
            "/reviews/:id/dislike/:user_id",
            put(reviews::add_dislike).delete(reviews::remove_dislike),
        )
}
