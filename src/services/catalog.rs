use std::sync::Arc;

use crate::{
    db::ReferenceStore,
    error::{AppError, AppResult},
    models::{Director, DirectorId, DirectorPatch, Genre, Mpa, NewDirector},
    validation::validate_director,
};

/// Genres, MPA ratings and directors
#[derive(Clone)]
pub struct CatalogService {
    reference: Arc<dyn ReferenceStore>,
}

impl CatalogService {
    pub fn new(reference: Arc<dyn ReferenceStore>) -> Self {
        Self { reference }
    }

    pub async fn get_genres(&self) -> AppResult<Vec<Genre>> {
        self.reference.list_genres().await
    }

    pub async fn get_genre(&self, id: i64) -> AppResult<Genre> {
        self.reference
            .get_genre(id)
            .await?
            .ok_or_else(|| AppError::not_found("Genre", id))
    }

    pub async fn get_mpa_ratings(&self) -> AppResult<Vec<Mpa>> {
        self.reference.list_mpa().await
    }

    pub async fn get_mpa(&self, id: i64) -> AppResult<Mpa> {
        self.reference
            .get_mpa(id)
            .await?
            .ok_or_else(|| AppError::not_found("Mpa", id))
    }

    pub async fn add_director(&self, payload: NewDirector) -> AppResult<Director> {
        validate_director(&payload.name).into_result()?;
        let director = self.reference.insert_director(payload.name).await?;
        tracing::info!(director_id = director.id, name = %director.name, "Director created");
        Ok(director)
    }

    pub async fn update_director(&self, patch: DirectorPatch) -> AppResult<Director> {
        let mut director = self.get_director(patch.id).await?;
        patch
            .name
            .filter(|name| !name.trim().is_empty())
            .apply_to(&mut director.name);
        validate_director(&director.name).into_result()?;

        if !self.reference.update_director(director.clone()).await? {
            return Err(AppError::storage(format!(
                "update of director {} matched no rows",
                director.id
            )));
        }
        tracing::info!(director_id = director.id, "Director updated");
        Ok(director)
    }

    pub async fn get_director(&self, id: DirectorId) -> AppResult<Director> {
        self.reference
            .get_director(id)
            .await?
            .ok_or_else(|| AppError::not_found("Director", id))
    }

    pub async fn get_directors(&self) -> AppResult<Vec<Director>> {
        self.reference.list_directors().await
    }

    pub async fn delete_director(&self, id: DirectorId) -> AppResult<()> {
        if !self.reference.delete_director(id).await? {
            return Err(AppError::not_found("Director", id));
        }
        tracing::info!(director_id = id, "Director deleted");
        Ok(())
    }
}
