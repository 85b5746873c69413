//! Storage contracts for entities and the relations between them.
//!
//! Every backend assigns ids from 1 upwards and returns list results in ascending
//! id order. Update and delete operations report whether a row matched.

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        Director, DirectorId, Event, FilmId, FilmRecord, Friendship, FriendshipStatus, Genre, Mpa,
        ReviewId, ReviewRecord, User, UserId,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user under the next free id; the incoming id is ignored
    async fn insert_user(&self, user: User) -> AppResult<User>;

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn update_user(&self, user: User) -> AppResult<bool>;

    /// Deletes a user with their friendship rows in both directions, likes,
    /// review reactions, reviews and feed entries
    async fn delete_user(&self, id: UserId) -> AppResult<bool>;

    async fn user_exists(&self, id: UserId) -> AppResult<bool>;
}

/// Directed friendship edges, at most one per ordered pair
#[async_trait]
pub trait FriendStore: Send + Sync {
    /// Fails with a storage error if the edge already exists
    async fn insert_friendship(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> AppResult<()>;

    async fn friendship_status(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> AppResult<Option<FriendshipStatus>>;

    async fn update_friendship_status(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> AppResult<bool>;

    async fn delete_friendship(&self, user_id: UserId, friend_id: UserId) -> AppResult<bool>;

    /// Outgoing edges of `user_id`
    async fn friendships_of(&self, user_id: UserId) -> AppResult<Vec<Friendship>>;
}

/// Films plus their genre, director and like links
#[async_trait]
pub trait FilmStore: Send + Sync {
    /// Inserts a film with its genre and director links under the next free id
    ///
    /// The incoming id is ignored. Either the film and all its links are
    /// written or nothing is.
    async fn insert_film(
        &self,
        film: FilmRecord,
        genre_ids: Vec<i64>,
        director_ids: Vec<DirectorId>,
    ) -> AppResult<FilmRecord>;

    async fn get_film(&self, id: FilmId) -> AppResult<Option<FilmRecord>>;

    async fn list_films(&self) -> AppResult<Vec<FilmRecord>>;

    /// Updates a film and replaces whichever link sets are given, all or nothing
    async fn update_film(
        &self,
        film: FilmRecord,
        genre_ids: Option<Vec<i64>>,
        director_ids: Option<Vec<DirectorId>>,
    ) -> AppResult<bool>;

    /// Deletes a film with its likes, genre and director links, and reviews
    async fn delete_film(&self, id: FilmId) -> AppResult<bool>;

    async fn film_exists(&self, id: FilmId) -> AppResult<bool>;

    /// Genres of a film, by ascending genre id
    async fn film_genres(&self, film_id: FilmId) -> AppResult<Vec<Genre>>;

    /// Directors of a film, by ascending director id
    async fn film_directors(&self, film_id: FilmId) -> AppResult<Vec<Director>>;

    /// Records a like; liking twice keeps a single row
    async fn add_film_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()>;

    async fn remove_film_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<bool>;

    async fn film_likes(&self, film_id: FilmId) -> AppResult<Vec<UserId>>;

    /// Every like row as `(film_id, user_id)`
    async fn all_film_likes(&self) -> AppResult<Vec<(FilmId, UserId)>>;
}

/// Genres, MPA ratings and directors
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;

    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>>;

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>>;

    async fn get_mpa(&self, id: i64) -> AppResult<Option<Mpa>>;

    async fn insert_director(&self, name: String) -> AppResult<Director>;

    async fn get_director(&self, id: DirectorId) -> AppResult<Option<Director>>;

    async fn list_directors(&self) -> AppResult<Vec<Director>>;

    async fn update_director(&self, director: Director) -> AppResult<bool>;

    /// Deletes a director and its film links
    async fn delete_director(&self, id: DirectorId) -> AppResult<bool>;
}

/// Reviews and their like/dislike rows, at most one row per (review, user)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Inserts a review under the next free id; the incoming id is ignored
    async fn insert_review(&self, review: ReviewRecord) -> AppResult<ReviewRecord>;

    async fn get_review(&self, id: ReviewId) -> AppResult<Option<ReviewRecord>>;

    async fn list_reviews(&self) -> AppResult<Vec<ReviewRecord>>;

    async fn update_review(&self, review: ReviewRecord) -> AppResult<bool>;

    /// Deletes a review and its reactions
    async fn delete_review(&self, id: ReviewId) -> AppResult<bool>;

    /// Stores a reaction, replacing an earlier one of either polarity
    async fn upsert_review_reaction(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        is_like: bool,
    ) -> AppResult<()>;

    async fn delete_review_reaction(&self, review_id: ReviewId, user_id: UserId)
        -> AppResult<bool>;

    /// Polarity of every reaction to a review, `true` for a like
    async fn review_reactions(&self, review_id: ReviewId) -> AppResult<Vec<bool>>;
}

/// Append-only activity log
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends an event under the next free id; the incoming id is ignored
    async fn append_event(&self, event: Event) -> AppResult<Event>;

    /// Events owned by `user_id`, in insertion order
    async fn events_for_user(&self, user_id: UserId) -> AppResult<Vec<Event>>;
}

/// A backend that provides every store
pub trait CatalogStore:
    UserStore + FriendStore + FilmStore + ReferenceStore + ReviewStore + EventStore
{
}

impl<T> CatalogStore for T where
    T: UserStore + FriendStore + FilmStore + ReferenceStore + ReviewStore + EventStore
{
}
