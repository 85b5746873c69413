use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Director, FilmId, Genre, IdRef, Mpa, Patch, UserId};

/// Base film row as kept by the entity store, without derived collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmRecord {
    pub id: FilmId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    /// Running time in seconds
    pub duration: i64,
    pub mpa_id: Option<i64>,
}

/// A fully hydrated film, as handed to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: FilmId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    pub mpa: Option<Mpa>,
    /// Sorted by genre id
    pub genres: Vec<Genre>,
    /// Sorted by director id
    pub directors: Vec<Director>,
    pub likes: BTreeSet<UserId>,
}

impl Film {
    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub fn has_genre(&self, genre_id: i64) -> bool {
        self.genres.iter().any(|g| g.id == genre_id)
    }

    pub fn has_director(&self, director_id: i64) -> bool {
        self.directors.iter().any(|d| d.id == director_id)
    }
}

/// Payload for creating a film
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFilm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub mpa: Option<IdRef>,
    #[serde(default)]
    pub genres: Vec<IdRef>,
    #[serde(default)]
    pub directors: Vec<IdRef>,
}

impl NewFilm {
    /// Splits the payload into the base row and its de-duplicated link ids
    pub fn into_parts(self) -> (FilmRecord, Vec<i64>, Vec<i64>) {
        let record = FilmRecord {
            id: 0,
            name: self.name,
            description: self.description,
            release_date: self.release_date,
            duration: self.duration,
            mpa_id: self.mpa.map(|m| m.id),
        };
        (record, sorted_ids(&self.genres), sorted_ids(&self.directors))
    }
}

/// Partial update of a film
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmPatch {
    pub id: FilmId,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub release_date: Patch<NaiveDate>,
    #[serde(default)]
    pub duration: Patch<i64>,
    #[serde(default)]
    pub mpa: Patch<IdRef>,
    #[serde(default)]
    pub genres: Patch<Vec<IdRef>>,
    #[serde(default)]
    pub directors: Patch<Vec<IdRef>>,
}

impl FilmPatch {
    /// Merges the scalar fields into `record`; a blank name counts as not provided.
    /// Returns the replacement genre and director id lists, if any were sent.
    pub fn apply_to(self, record: &mut FilmRecord) -> (Option<Vec<i64>>, Option<Vec<i64>>) {
        self.name
            .filter(|name| !name.trim().is_empty())
            .apply_to(&mut record.name);
        self.description.apply_to(&mut record.description);
        self.release_date.apply_to(&mut record.release_date);
        self.duration.apply_to(&mut record.duration);
        if let Some(mpa) = self.mpa.into_option() {
            record.mpa_id = Some(mpa.id);
        }

        (
            self.genres.into_option().map(|g| sorted_ids(&g)),
            self.directors.into_option().map(|d| sorted_ids(&d)),
        )
    }
}

fn sorted_ids(refs: &[IdRef]) -> Vec<i64> {
    refs.iter()
        .map(|r| r.id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
