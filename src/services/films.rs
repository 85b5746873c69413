use std::sync::Arc;

use super::{event_feed::EventFeed, hydration::FilmHydrator, users::require_user};
use crate::{
    db::{FilmStore, ReferenceStore, UserStore},
    error::{AppError, AppResult},
    models::{EventType, Film, FilmId, FilmPatch, NewFilm, Operation, UserId},
    validation::validate_film,
};

/// Fails with NotFound unless the film exists
pub(crate) async fn require_film(films: &dyn FilmStore, id: FilmId) -> AppResult<()> {
    if films.film_exists(id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Film", id))
    }
}

/// Film catalog maintenance and film likes
#[derive(Clone)]
pub struct FilmService {
    films: Arc<dyn FilmStore>,
    users: Arc<dyn UserStore>,
    reference: Arc<dyn ReferenceStore>,
    hydrator: FilmHydrator,
    feed: EventFeed,
}

impl FilmService {
    pub fn new(
        films: Arc<dyn FilmStore>,
        users: Arc<dyn UserStore>,
        reference: Arc<dyn ReferenceStore>,
        feed: EventFeed,
    ) -> Self {
        let hydrator = FilmHydrator::new(films.clone(), reference.clone());
        Self {
            films,
            users,
            reference,
            hydrator,
            feed,
        }
    }

    pub async fn add_film(&self, payload: NewFilm) -> AppResult<Film> {
        let (record, genre_ids, director_ids) = payload.into_parts();
        if let Err(e) = validate_film(&record).into_result() {
            tracing::warn!(name = %record.name, error = %e, "Rejected new film");
            return Err(e);
        }
        self.check_references(record.mpa_id, &genre_ids, &director_ids)
            .await?;

        let record = self
            .films
            .insert_film(record, genre_ids, director_ids)
            .await?;

        tracing::info!(film_id = record.id, name = %record.name, "Film created");
        self.hydrator.hydrate(record).await
    }

    pub async fn update_film(&self, patch: FilmPatch) -> AppResult<Film> {
        let film_id = patch.id;
        let mut record = self
            .films
            .get_film(film_id)
            .await?
            .ok_or_else(|| AppError::not_found("Film", film_id))?;

        let (genre_ids, director_ids) = patch.apply_to(&mut record);
        if let Err(e) = validate_film(&record).into_result() {
            tracing::warn!(film_id, error = %e, "Rejected film update");
            return Err(e);
        }
        self.check_references(
            record.mpa_id,
            genre_ids.as_deref().unwrap_or_default(),
            director_ids.as_deref().unwrap_or_default(),
        )
        .await?;

        let updated = self
            .films
            .update_film(record.clone(), genre_ids, director_ids)
            .await?;
        if !updated {
            return Err(AppError::storage(format!(
                "update of film {} matched no rows",
                film_id
            )));
        }

        tracing::info!(film_id, "Film updated");
        self.hydrator.hydrate(record).await
    }

    pub async fn get_film(&self, id: FilmId) -> AppResult<Film> {
        self.hydrator.load(id).await
    }

    pub async fn get_all_films(&self) -> AppResult<Vec<Film>> {
        self.hydrator.load_all().await
    }

    pub async fn delete_film(&self, id: FilmId) -> AppResult<()> {
        if !self.films.delete_film(id).await? {
            return Err(AppError::not_found("Film", id));
        }
        tracing::info!(film_id = id, "Film deleted");
        Ok(())
    }

    pub async fn add_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        require_film(self.films.as_ref(), film_id).await?;
        require_user(self.users.as_ref(), user_id).await?;

        self.films.add_film_like(film_id, user_id).await?;
        self.feed
            .record_event(user_id, EventType::Like, Operation::Add, film_id)
            .await?;

        tracing::info!(film_id, user_id, "Film liked");
        Ok(())
    }

    pub async fn remove_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        require_film(self.films.as_ref(), film_id).await?;
        require_user(self.users.as_ref(), user_id).await?;

        if !self.films.remove_film_like(film_id, user_id).await? {
            tracing::debug!(film_id, user_id, "Removed a like that was not there");
        }
        self.feed
            .record_event(user_id, EventType::Like, Operation::Remove, film_id)
            .await?;

        tracing::info!(film_id, user_id, "Film like removed");
        Ok(())
    }

    async fn check_references(
        &self,
        mpa_id: Option<i64>,
        genre_ids: &[i64],
        director_ids: &[i64],
    ) -> AppResult<()> {
        if let Some(mpa_id) = mpa_id {
            if self.reference.get_mpa(mpa_id).await?.is_none() {
                return Err(AppError::not_found("Mpa", mpa_id));
            }
        }
        for &genre_id in genre_ids {
            if self.reference.get_genre(genre_id).await?.is_none() {
                return Err(AppError::not_found("Genre", genre_id));
            }
        }
        for &director_id in director_ids {
            if self.reference.get_director(director_id).await?.is_none() {
                return Err(AppError::not_found("Director", director_id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{EventStore, MemoryStore},
        models::{IdRef, NewUser, Patch},
    };
    use chrono::NaiveDate;

    fn service(store: &Arc<MemoryStore>) -> FilmService {
        let feed = EventFeed::new(store.clone(), store.clone());
        FilmService::new(store.clone(), store.clone(), store.clone(), feed)
    }

    fn new_film(name: &str) -> NewFilm {
        NewFilm {
            name: name.to_string(),
            description: "A film".to_string(),
            release_date: NaiveDate::from_ymd_opt(1999, 3, 31).unwrap(),
            duration: 8160,
            mpa: Some(IdRef { id: 4 }),
            genres: vec![IdRef { id: 6 }, IdRef { id: 4 }],
            directors: vec![],
        }
    }

    fn empty_patch(id: FilmId) -> FilmPatch {
        FilmPatch {
            id,
            name: Patch::Unset,
            description: Patch::Unset,
            release_date: Patch::Unset,
            duration: Patch::Unset,
            mpa: Patch::Unset,
            genres: Patch::Unset,
            directors: Patch::Unset,
        }
    }

    async fn add_user(store: &Arc<MemoryStore>, login: &str) -> UserId {
        let user = NewUser {
            email: format!("{}@example.com", login),
            login: login.to_string(),
            name: None,
            birthday: None,
        }
        .into_user();
        store.insert_user(user).await.unwrap().id
    }

    #[tokio::test]
    async fn test_add_then_get_returns_equal_film() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);

        let created = films.add_film(new_film("The Matrix")).await.unwrap();
        let fetched = films.get_film(created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "The Matrix");
        assert_eq!(fetched.duration, 8160);
        assert_eq!(fetched.mpa.as_ref().map(|m| m.name.as_str()), Some("R"));
        let genre_ids: Vec<_> = fetched.genres.iter().map(|g| g.id).collect();
        assert_eq!(genre_ids, vec![4, 6]);
    }

    #[tokio::test]
    async fn test_add_film_with_unknown_references() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);

        let mut payload = new_film("Ghost");
        payload.mpa = Some(IdRef { id: 99 });
        assert!(matches!(films.add_film(payload).await, Err(AppError::NotFound(_))));

        let mut payload = new_film("Ghost");
        payload.directors = vec![IdRef { id: 1 }];
        assert!(matches!(films.add_film(payload).await, Err(AppError::NotFound(_))));

        assert!(films.get_all_films().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_film_rejects_invalid_input() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);

        let mut payload = new_film("Too early");
        payload.release_date = NaiveDate::from_ymd_opt(1895, 12, 28).unwrap();
        assert!(matches!(films.add_film(payload).await, Err(AppError::Validation(_))));

        let mut payload = new_film("Too long");
        payload.description = "x".repeat(201);
        assert!(matches!(films.add_film(payload).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields_and_clears_description() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);
        let film = films.add_film(new_film("Heat")).await.unwrap();

        let mut patch = empty_patch(film.id);
        patch.description = Patch::Set(String::new());
        patch.genres = Patch::Set(vec![IdRef { id: 2 }]);
        let updated = films.update_film(patch).await.unwrap();

        assert_eq!(updated.name, "Heat");
        assert_eq!(updated.description, "");
        assert_eq!(updated.duration, 8160);
        assert_eq!(updated.genres.len(), 1);
        assert_eq!(updated.genres[0].id, 2);
    }

    #[tokio::test]
    async fn test_update_missing_film_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);
        let result = films.update_film(empty_patch(42)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_all_films_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);
        films.add_film(new_film("One")).await.unwrap();
        films.add_film(new_film("Two")).await.unwrap();
        let user = add_user(&store, "viewer").await;
        films.add_like(2, user).await.unwrap();

        let first = films.get_all_films().await.unwrap();
        let second = films.get_all_films().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[1].likes_count(), 1);
    }

    #[tokio::test]
    async fn test_likes_record_feed_events() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);
        let film = films.add_film(new_film("Arrival")).await.unwrap();
        let user = add_user(&store, "louise").await;

        films.add_like(film.id, user).await.unwrap();
        films.add_like(film.id, user).await.unwrap();
        assert_eq!(films.get_film(film.id).await.unwrap().likes_count(), 1);

        films.remove_like(film.id, user).await.unwrap();
        assert_eq!(films.get_film(film.id).await.unwrap().likes_count(), 0);

        let ops: Vec<_> = store
            .events_for_user(user)
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.event_type, e.operation, e.entity_id))
            .collect();
        assert_eq!(
            ops,
            vec![
                (EventType::Like, Operation::Add, film.id),
                (EventType::Like, Operation::Add, film.id),
                (EventType::Like, Operation::Remove, film.id),
            ]
        );
    }

    #[tokio::test]
    async fn test_like_requires_existing_user_and_film() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);
        let film = films.add_film(new_film("Solaris")).await.unwrap();

        assert!(matches!(films.add_like(film.id, 9).await, Err(AppError::NotFound(_))));
        let user = add_user(&store, "kris").await;
        assert!(matches!(films.add_like(9, user).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_film_removes_it() {
        let store = Arc::new(MemoryStore::new());
        let films = service(&store);
        let film = films.add_film(new_film("Brazil")).await.unwrap();

        films.delete_film(film.id).await.unwrap();
        assert!(matches!(films.get_film(film.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(films.delete_film(film.id).await, Err(AppError::NotFound(_))));
    }
}
