use std::sync::Arc;

use crate::{
    db::{FilmStore, ReferenceStore},
    error::{AppError, AppResult},
    models::{Film, FilmId, FilmRecord},
};

/// Resolves the rating, genres, directors and likes of base film rows
#[derive(Clone)]
pub struct FilmHydrator {
    films: Arc<dyn FilmStore>,
    reference: Arc<dyn ReferenceStore>,
}

impl FilmHydrator {
    pub fn new(films: Arc<dyn FilmStore>, reference: Arc<dyn ReferenceStore>) -> Self {
        Self { films, reference }
    }

    pub async fn hydrate(&self, record: FilmRecord) -> AppResult<Film> {
        let mpa = match record.mpa_id {
            Some(mpa_id) => self.reference.get_mpa(mpa_id).await?,
            None => None,
        };
        let genres = self.films.film_genres(record.id).await?;
        let directors = self.films.film_directors(record.id).await?;
        let likes = self.films.film_likes(record.id).await?.into_iter().collect();

        Ok(Film {
            id: record.id,
            name: record.name,
            description: record.description,
            release_date: record.release_date,
            duration: record.duration,
            mpa,
            genres,
            directors,
            likes,
        })
    }

    pub async fn hydrate_all(&self, records: Vec<FilmRecord>) -> AppResult<Vec<Film>> {
        let mut films = Vec::with_capacity(records.len());
        for record in records {
            films.push(self.hydrate(record).await?);
        }
        Ok(films)
    }

    /// Loads and hydrates a single film, NotFound if it does not exist
    pub async fn load(&self, id: FilmId) -> AppResult<Film> {
        let record = self
            .films
            .get_film(id)
            .await?
            .ok_or_else(|| AppError::not_found("Film", id))?;
        self.hydrate(record).await
    }

    /// Loads and hydrates every film in storage order
    pub async fn load_all(&self) -> AppResult<Vec<Film>> {
        let records = self.films.list_films().await?;
        self.hydrate_all(records).await
    }
}
