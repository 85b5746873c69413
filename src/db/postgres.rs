use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgConnection, PgPool};

use super::store::{EventStore, FilmStore, FriendStore, ReferenceStore, ReviewStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        Director, DirectorId, Event, FilmId, FilmRecord, Friendship, FriendshipStatus, Genre, Mpa,
        ReviewId, ReviewRecord, User, UserId,
    },
};

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the bundled schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    login: String,
    name: String,
    birthday: Option<NaiveDate>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            login: row.login,
            name: row.name,
            birthday: row.birthday,
        }
    }
}

#[derive(FromRow)]
struct FilmRow {
    id: i64,
    name: String,
    description: String,
    release_date: NaiveDate,
    duration: i64,
    mpa_id: Option<i64>,
}

impl From<FilmRow> for FilmRecord {
    fn from(row: FilmRow) -> Self {
        FilmRecord {
            id: row.id,
            name: row.name,
            description: row.description,
            release_date: row.release_date,
            duration: row.duration,
            mpa_id: row.mpa_id,
        }
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: i64,
    film_id: i64,
    user_id: i64,
    content: String,
    is_positive: bool,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        ReviewRecord {
            review_id: row.id,
            film_id: row.film_id,
            user_id: row.user_id,
            content: row.content,
            is_positive: row.is_positive,
        }
    }
}

#[derive(FromRow)]
struct FriendshipRow {
    user_id: i64,
    friend_id: i64,
    status: String,
}

impl TryFrom<FriendshipRow> for Friendship {
    type Error = AppError;

    fn try_from(row: FriendshipRow) -> Result<Self, Self::Error> {
        Ok(Friendship {
            user_id: row.user_id,
            friend_id: row.friend_id,
            status: row.status.parse().map_err(AppError::Internal)?,
        })
    }
}

#[derive(FromRow)]
struct EventRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    event_type: String,
    operation: String,
    entity_id: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = AppError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            event_id: row.id,
            user_id: row.user_id,
            timestamp: row.created_at,
            event_type: row.event_type.parse().map_err(AppError::Internal)?,
            operation: row.operation.parse().map_err(AppError::Internal)?,
            entity_id: row.entity_id,
        })
    }
}

#[derive(FromRow)]
struct NamedRow {
    id: i64,
    name: String,
}

async fn replace_film_genres(
    conn: &mut PgConnection,
    film_id: FilmId,
    genre_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM film_genres WHERE film_id = $1")
        .bind(film_id)
        .execute(&mut *conn)
        .await?;
    for genre_id in genre_ids {
        sqlx::query("INSERT INTO film_genres (film_id, genre_id) VALUES ($1, $2)")
            .bind(film_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn replace_film_directors(
    conn: &mut PgConnection,
    film_id: FilmId,
    director_ids: &[DirectorId],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM film_directors WHERE film_id = $1")
        .bind(film_id)
        .execute(&mut *conn)
        .await?;
    for director_id in director_ids {
        sqlx::query("INSERT INTO film_directors (film_id, director_id) VALUES ($1, $2)")
            .bind(film_id)
            .bind(director_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Storage backend on PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, query: &'static str, id: i64) -> AppResult<bool> {
        let found: bool = sqlx::query_scalar(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (email, login, name, birthday)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, login, name, birthday
            "#,
        )
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.name)
        .bind(user.birthday)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, login, name, birthday FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, email, login, name, birthday FROM users ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_user(&self, user: User) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET email = $1, login = $2, name = $3, birthday = $4 WHERE id = $5",
        )
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.name)
        .bind(user.birthday)
        .bind(user.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: UserId) -> AppResult<bool> {
        // Relation rows go with the user through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_exists(&self, id: UserId) -> AppResult<bool> {
        self.exists("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)", id)
            .await
    }
}

#[async_trait]
impl FriendStore for PgStore {
    async fn insert_friendship(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO friendships (user_id, friend_id, status) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(friend_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => AppError::storage(
                    format!("friendship {} -> {} already exists", user_id, friend_id),
                ),
                other => AppError::Database(other),
            })?;
        Ok(())
    }

    async fn friendship_status(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> AppResult<Option<FriendshipStatus>> {
        let status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM friendships WHERE user_id = $1 AND friend_id = $2",
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_optional(&self.pool)
        .await?;

        status
            .map(|s| s.parse().map_err(AppError::Internal))
            .transpose()
    }

    async fn update_friendship_status(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE friendships SET status = $1 WHERE user_id = $2 AND friend_id = $3",
        )
        .bind(status.as_str())
        .bind(user_id)
        .bind(friend_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_friendship(&self, user_id: UserId, friend_id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM friendships WHERE user_id = $1 AND friend_id = $2")
            .bind(user_id)
            .bind(friend_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn friendships_of(&self, user_id: UserId) -> AppResult<Vec<Friendship>> {
        let rows: Vec<FriendshipRow> = sqlx::query_as(
            "SELECT user_id, friend_id, status FROM friendships WHERE user_id = $1 ORDER BY friend_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Friendship::try_from).collect()
    }
}

#[async_trait]
impl FilmStore for PgStore {
    async fn insert_film(
        &self,
        film: FilmRecord,
        genre_ids: Vec<i64>,
        director_ids: Vec<DirectorId>,
    ) -> AppResult<FilmRecord> {
        let mut tx = self.pool.begin().await?;
        let row: FilmRow = sqlx::query_as(
            r#"
            INSERT INTO films (name, description, release_date, duration, mpa_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, release_date, duration, mpa_id
            "#,
        )
        .bind(&film.name)
        .bind(&film.description)
        .bind(film.release_date)
        .bind(film.duration)
        .bind(film.mpa_id)
        .fetch_one(&mut *tx)
        .await?;

        replace_film_genres(&mut tx, row.id, &genre_ids).await?;
        replace_film_directors(&mut tx, row.id, &director_ids).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn get_film(&self, id: FilmId) -> AppResult<Option<FilmRecord>> {
        let row: Option<FilmRow> = sqlx::query_as(
            "SELECT id, name, description, release_date, duration, mpa_id FROM films WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FilmRecord::from))
    }

    async fn list_films(&self) -> AppResult<Vec<FilmRecord>> {
        let rows: Vec<FilmRow> = sqlx::query_as(
            "SELECT id, name, description, release_date, duration, mpa_id FROM films ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FilmRecord::from).collect())
    }

    async fn update_film(
        &self,
        film: FilmRecord,
        genre_ids: Option<Vec<i64>>,
        director_ids: Option<Vec<DirectorId>>,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE films
            SET name = $1, description = $2, release_date = $3, duration = $4, mpa_id = $5
            WHERE id = $6
            "#,
        )
        .bind(&film.name)
        .bind(&film.description)
        .bind(film.release_date)
        .bind(film.duration)
        .bind(film.mpa_id)
        .bind(film.id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(genre_ids) = genre_ids {
            replace_film_genres(&mut tx, film.id, &genre_ids).await?;
        }
        if let Some(director_ids) = director_ids {
            replace_film_directors(&mut tx, film.id, &director_ids).await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn delete_film(&self, id: FilmId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM films WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn film_exists(&self, id: FilmId) -> AppResult<bool> {
        self.exists("SELECT EXISTS(SELECT 1 FROM films WHERE id = $1)", id)
            .await
    }

    async fn film_genres(&self, film_id: FilmId) -> AppResult<Vec<Genre>> {
        let rows: Vec<NamedRow> = sqlx::query_as(
            r#"
            SELECT g.id, g.name
            FROM film_genres fg
            JOIN genres g ON g.id = fg.genre_id
            WHERE fg.film_id = $1
            ORDER BY g.id
            "#,
        )
        .bind(film_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| Genre {
                id: r.id,
                name: r.name,
            })
            .collect())
    }

    async fn film_directors(&self, film_id: FilmId) -> AppResult<Vec<Director>> {
        let rows: Vec<NamedRow> = sqlx::query_as(
            r#"
            SELECT d.id, d.name
            FROM film_directors fd
            JOIN directors d ON d.id = fd.director_id
            WHERE fd.film_id = $1
            ORDER BY d.id
            "#,
        )
        .bind(film_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| Director {
                id: r.id,
                name: r.name,
            })
            .collect())
    }

    async fn add_film_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO film_likes (film_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(film_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_film_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM film_likes WHERE film_id = $1 AND user_id = $2")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn film_likes(&self, film_id: FilmId) -> AppResult<Vec<UserId>> {
        let users: Vec<i64> =
            sqlx::query_scalar("SELECT user_id FROM film_likes WHERE film_id = $1 ORDER BY user_id")
                .bind(film_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    async fn all_film_likes(&self) -> AppResult<Vec<(FilmId, UserId)>> {
        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT film_id, user_id FROM film_likes ORDER BY film_id, user_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ReferenceStore for PgStore {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let rows: Vec<NamedRow> = sqlx::query_as("SELECT id, name FROM genres ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Genre {
                id: r.id,
                name: r.name,
            })
            .collect())
    }

    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>> {
        let row: Option<NamedRow> = sqlx::query_as("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Genre {
            id: r.id,
            name: r.name,
        }))
    }

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>> {
        let rows: Vec<NamedRow> = sqlx::query_as("SELECT id, name FROM mpa_ratings ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Mpa {
                id: r.id,
                name: r.name,
            })
            .collect())
    }

    async fn get_mpa(&self, id: i64) -> AppResult<Option<Mpa>> {
        let row: Option<NamedRow> =
            sqlx::query_as("SELECT id, name FROM mpa_ratings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| Mpa {
            id: r.id,
            name: r.name,
        }))
    }

    async fn insert_director(&self, name: String) -> AppResult<Director> {
        let row: NamedRow =
            sqlx::query_as("INSERT INTO directors (name) VALUES ($1) RETURNING id, name")
                .bind(&name)
                .fetch_one(&self.pool)
                .await?;
        Ok(Director {
            id: row.id,
            name: row.name,
        })
    }

    async fn get_director(&self, id: DirectorId) -> AppResult<Option<Director>> {
        let row: Option<NamedRow> = sqlx::query_as("SELECT id, name FROM directors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Director {
            id: r.id,
            name: r.name,
        }))
    }

    async fn list_directors(&self) -> AppResult<Vec<Director>> {
        let rows: Vec<NamedRow> = sqlx::query_as("SELECT id, name FROM directors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Director {
                id: r.id,
                name: r.name,
            })
            .collect())
    }

    async fn update_director(&self, director: Director) -> AppResult<bool> {
        let result = sqlx::query("UPDATE directors SET name = $1 WHERE id = $2")
            .bind(&director.name)
            .bind(director.id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_director(&self, id: DirectorId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM directors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert_review(&self, review: ReviewRecord) -> AppResult<ReviewRecord> {
        let row: ReviewRow = sqlx::query_as(
            r#"
            INSERT INTO reviews (film_id, user_id, content, is_positive)
            VALUES ($1, $2, $3, $4)
            RETURNING id, film_id, user_id, content, is_positive
            "#,
        )
        .bind(review.film_id)
        .bind(review.user_id)
        .bind(&review.content)
        .bind(review.is_positive)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_review(&self, id: ReviewId) -> AppResult<Option<ReviewRecord>> {
        let row: Option<ReviewRow> = sqlx::query_as(
            "SELECT id, film_id, user_id, content, is_positive FROM reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ReviewRecord::from))
    }

    async fn list_reviews(&self) -> AppResult<Vec<ReviewRecord>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT id, film_id, user_id, content, is_positive FROM reviews ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ReviewRecord::from).collect())
    }

    async fn update_review(&self, review: ReviewRecord) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reviews
            SET film_id = $1, user_id = $2, content = $3, is_positive = $4
            WHERE id = $5
            "#,
        )
        .bind(review.film_id)
        .bind(review.user_id)
        .bind(&review.content)
        .bind(review.is_positive)
        .bind(review.review_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_review(&self, id: ReviewId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_review_reaction(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        is_like: bool,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO review_reactions (review_id, user_id, is_like)
            VALUES ($1, $2, $3)
            ON CONFLICT (review_id, user_id) DO UPDATE SET is_like = EXCLUDED.is_like
            "#,
        )
        .bind(review_id)
        .bind(user_id)
        .bind(is_like)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_review_reaction(
        &self,
        review_id: ReviewId,
        user_id: UserId,
    ) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM review_reactions WHERE review_id = $1 AND user_id = $2")
                .bind(review_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn review_reactions(&self, review_id: ReviewId) -> AppResult<Vec<bool>> {
        let reactions: Vec<bool> = sqlx::query_scalar(
            "SELECT is_like FROM review_reactions WHERE review_id = $1 ORDER BY user_id",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reactions)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn append_event(&self, event: Event) -> AppResult<Event> {
        let row: EventRow = sqlx::query_as(
            r#"
            INSERT INTO events (user_id, created_at, event_type, operation, entity_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, created_at, event_type, operation, entity_id
            "#,
        )
        .bind(event.user_id)
        .bind(event.timestamp)
        .bind(event.event_type.to_string())
        .bind(event.operation.to_string())
        .bind(event.entity_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn events_for_user(&self, user_id: UserId) -> AppResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, created_at, event_type, operation, entity_id
            FROM events
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Event::try_from).collect()
    }
}
