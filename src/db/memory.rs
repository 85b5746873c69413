//! In-process storage backend.
//!
//! All tables live behind one lock so that cascading deletes are atomic.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use super::{
    store::{EventStore, FilmStore, FriendStore, ReferenceStore, ReviewStore, UserStore},
    MPA_RATINGS, SEED_GENRES,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        Director, DirectorId, Event, FilmId, FilmRecord, Friendship, FriendshipStatus, Genre, Mpa,
        ReviewId, ReviewRecord, User, UserId,
    },
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    friendships: BTreeMap<(UserId, UserId), FriendshipStatus>,
    films: BTreeMap<FilmId, FilmRecord>,
    film_genres: BTreeSet<(FilmId, i64)>,
    film_directors: BTreeSet<(FilmId, DirectorId)>,
    film_likes: BTreeSet<(FilmId, UserId)>,
    genres: BTreeMap<i64, Genre>,
    mpa: BTreeMap<i64, Mpa>,
    directors: BTreeMap<DirectorId, Director>,
    reviews: BTreeMap<ReviewId, ReviewRecord>,
    review_reactions: BTreeMap<(ReviewId, UserId), bool>,
    events: Vec<Event>,
    last_user_id: UserId,
    last_film_id: FilmId,
    last_director_id: DirectorId,
    last_review_id: ReviewId,
    last_event_id: i64,
}

impl Tables {
    fn replace_film_genres(&mut self, film_id: FilmId, genre_ids: Vec<i64>) {
        self.film_genres.retain(|(id, _)| *id != film_id);
        self.film_genres
            .extend(genre_ids.into_iter().map(|genre_id| (film_id, genre_id)));
    }

    fn replace_film_directors(&mut self, film_id: FilmId, director_ids: Vec<DirectorId>) {
        self.film_directors.retain(|(id, _)| *id != film_id);
        self.film_directors
            .extend(director_ids.into_iter().map(|director_id| (film_id, director_id)));
    }

    fn remove_reviews_where(&mut self, predicate: impl Fn(&ReviewRecord) -> bool) {
        let doomed: Vec<ReviewId> = self
            .reviews
            .values()
            .filter(|r| predicate(r))
            .map(|r| r.review_id)
            .collect();
        for review_id in doomed {
            self.reviews.remove(&review_id);
            self.review_reactions.retain(|(rid, _), _| *rid != review_id);
        }
    }
}

/// Storage backend that keeps everything in memory, seeded with reference data
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (id, name) in SEED_GENRES {
            tables.genres.insert(
                id,
                Genre {
                    id,
                    name: name.to_string(),
                },
            );
        }
        for (id, name) in MPA_RATINGS {
            tables.mpa.insert(
                id,
                Mpa {
                    id,
                    name: name.to_string(),
                },
            );
        }

        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, mut user: User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        tables.last_user_id += 1;
        user.id = tables.last_user_id;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn update_user(&self, user: User) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: UserId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables
            .friendships
            .retain(|(user_id, friend_id), _| *user_id != id && *friend_id != id);
        tables.film_likes.retain(|(_, user_id)| *user_id != id);
        tables.review_reactions.retain(|(_, user_id), _| *user_id != id);
        tables.remove_reviews_where(|r| r.user_id == id);
        tables.events.retain(|e| e.user_id != id);
        Ok(true)
    }

    async fn user_exists(&self, id: UserId) -> AppResult<bool> {
        Ok(self.tables.read().await.users.contains_key(&id))
    }
}

#[async_trait]
impl FriendStore for MemoryStore {
    async fn insert_friendship(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.friendships.contains_key(&(user_id, friend_id)) {
            return Err(AppError::storage(format!(
                "friendship {} -> {} already exists",
                user_id, friend_id
            )));
        }
        tables.friendships.insert((user_id, friend_id), status);
        Ok(())
    }

    async fn friendship_status(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> AppResult<Option<FriendshipStatus>> {
        Ok(self
            .tables
            .read()
            .await
            .friendships
            .get(&(user_id, friend_id))
            .copied())
    }

    async fn update_friendship_status(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.friendships.get_mut(&(user_id, friend_id)) {
            Some(stored) => {
                *stored = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_friendship(&self, user_id: UserId, friend_id: UserId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.friendships.remove(&(user_id, friend_id)).is_some())
    }

    async fn friendships_of(&self, user_id: UserId) -> AppResult<Vec<Friendship>> {
        let tables = self.tables.read().await;
        Ok(tables
            .friendships
            .range((user_id, UserId::MIN)..=(user_id, UserId::MAX))
            .map(|(&(user_id, friend_id), &status)| Friendship {
                user_id,
                friend_id,
                status,
            })
            .collect())
    }
}

#[async_trait]
impl FilmStore for MemoryStore {
    async fn insert_film(
        &self,
        mut film: FilmRecord,
        genre_ids: Vec<i64>,
        director_ids: Vec<DirectorId>,
    ) -> AppResult<FilmRecord> {
        let mut tables = self.tables.write().await;
        tables.last_film_id += 1;
        film.id = tables.last_film_id;
        tables.films.insert(film.id, film.clone());
        tables.replace_film_genres(film.id, genre_ids);
        tables.replace_film_directors(film.id, director_ids);
        Ok(film)
    }

    async fn get_film(&self, id: FilmId) -> AppResult<Option<FilmRecord>> {
        Ok(self.tables.read().await.films.get(&id).cloned())
    }

    async fn list_films(&self) -> AppResult<Vec<FilmRecord>> {
        Ok(self.tables.read().await.films.values().cloned().collect())
    }

    async fn update_film(
        &self,
        film: FilmRecord,
        genre_ids: Option<Vec<i64>>,
        director_ids: Option<Vec<DirectorId>>,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let film_id = film.id;
        match tables.films.get_mut(&film_id) {
            Some(stored) => *stored = film,
            None => return Ok(false),
        }
        if let Some(genre_ids) = genre_ids {
            tables.replace_film_genres(film_id, genre_ids);
        }
        if let Some(director_ids) = director_ids {
            tables.replace_film_directors(film_id, director_ids);
        }
        Ok(true)
    }

    async fn delete_film(&self, id: FilmId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.films.remove(&id).is_none() {
            return Ok(false);
        }
        tables.film_likes.retain(|(film_id, _)| *film_id != id);
        tables.film_genres.retain(|(film_id, _)| *film_id != id);
        tables.film_directors.retain(|(film_id, _)| *film_id != id);
        tables.remove_reviews_where(|r| r.film_id == id);
        Ok(true)
    }

    async fn film_exists(&self, id: FilmId) -> AppResult<bool> {
        Ok(self.tables.read().await.films.contains_key(&id))
    }

    async fn film_genres(&self, film_id: FilmId) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        Ok(tables
            .film_genres
            .range((film_id, i64::MIN)..=(film_id, i64::MAX))
            .filter_map(|(_, genre_id)| tables.genres.get(genre_id).cloned())
            .collect())
    }

    async fn film_directors(&self, film_id: FilmId) -> AppResult<Vec<Director>> {
        let tables = self.tables.read().await;
        Ok(tables
            .film_directors
            .range((film_id, DirectorId::MIN)..=(film_id, DirectorId::MAX))
            .filter_map(|(_, director_id)| tables.directors.get(director_id).cloned())
            .collect())
    }

    async fn add_film_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        self.tables.write().await.film_likes.insert((film_id, user_id));
        Ok(())
    }

    async fn remove_film_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .film_likes
            .remove(&(film_id, user_id)))
    }

    async fn film_likes(&self, film_id: FilmId) -> AppResult<Vec<UserId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .film_likes
            .range((film_id, UserId::MIN)..=(film_id, UserId::MAX))
            .map(|&(_, user_id)| user_id)
            .collect())
    }

    async fn all_film_likes(&self) -> AppResult<Vec<(FilmId, UserId)>> {
        Ok(self.tables.read().await.film_likes.iter().copied().collect())
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        Ok(self.tables.read().await.genres.values().cloned().collect())
    }

    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>> {
        Ok(self.tables.read().await.genres.get(&id).cloned())
    }

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>> {
        Ok(self.tables.read().await.mpa.values().cloned().collect())
    }

    async fn get_mpa(&self, id: i64) -> AppResult<Option<Mpa>> {
        Ok(self.tables.read().await.mpa.get(&id).cloned())
    }

    async fn insert_director(&self, name: String) -> AppResult<Director> {
        let mut tables = self.tables.write().await;
        tables.last_director_id += 1;
        let director = Director {
            id: tables.last_director_id,
            name,
        };
        tables.directors.insert(director.id, director.clone());
        Ok(director)
    }

    async fn get_director(&self, id: DirectorId) -> AppResult<Option<Director>> {
        Ok(self.tables.read().await.directors.get(&id).cloned())
    }

    async fn list_directors(&self) -> AppResult<Vec<Director>> {
        Ok(self.tables.read().await.directors.values().cloned().collect())
    }

    async fn update_director(&self, director: Director) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.directors.get_mut(&director.id) {
            Some(stored) => {
                *stored = director;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_director(&self, id: DirectorId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.directors.remove(&id).is_none() {
            return Ok(false);
        }
        tables.film_directors.retain(|(_, director_id)| *director_id != id);
        Ok(true)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, mut review: ReviewRecord) -> AppResult<ReviewRecord> {
        let mut tables = self.tables.write().await;
        tables.last_review_id += 1;
        review.review_id = tables.last_review_id;
        tables.reviews.insert(review.review_id, review.clone());
        Ok(review)
    }

    async fn get_review(&self, id: ReviewId) -> AppResult<Option<ReviewRecord>> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn list_reviews(&self) -> AppResult<Vec<ReviewRecord>> {
        Ok(self.tables.read().await.reviews.values().cloned().collect())
    }

    async fn update_review(&self, review: ReviewRecord) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.reviews.get_mut(&review.review_id) {
            Some(stored) => {
                *stored = review;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_review(&self, id: ReviewId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let existed = tables.reviews.contains_key(&id);
        tables.remove_reviews_where(|r| r.review_id == id);
        Ok(existed)
    }

    async fn upsert_review_reaction(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        is_like: bool,
    ) -> AppResult<()> {
        self.tables
            .write()
            .await
            .review_reactions
            .insert((review_id, user_id), is_like);
        Ok(())
    }

    async fn delete_review_reaction(
        &self,
        review_id: ReviewId,
        user_id: UserId,
    ) -> AppResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .review_reactions
            .remove(&(review_id, user_id))
            .is_some())
    }

    async fn review_reactions(&self, review_id: ReviewId) -> AppResult<Vec<bool>> {
        let tables = self.tables.read().await;
        Ok(tables
            .review_reactions
            .range((review_id, UserId::MIN)..=(review_id, UserId::MAX))
            .map(|(_, &is_like)| is_like)
            .collect())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn append_event(&self, mut event: Event) -> AppResult<Event> {
        let mut tables = self.tables.write().await;
        tables.last_event_id += 1;
        event.event_id = tables.last_event_id;
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn events_for_user(&self, user_id: UserId) -> AppResult<Vec<Event>> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}
