use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{hydration::FilmHydrator, users::require_user};
use crate::{
    db::{FilmStore, UserStore},
    error::AppResult,
    models::{Film, FilmId, UserId},
};

/// Liked films grouped by user, both in ascending id order
type LikeSets = BTreeMap<UserId, BTreeSet<FilmId>>;

/// Picks the other user whose likes overlap most with `user_id`'s
///
/// Candidates are scanned by ascending id and only a strictly larger overlap
/// replaces the current pick, so the lowest id wins a tie. Returns `None` when
/// nobody shares a single like.
pub fn nearest_neighbour(likes: &LikeSets, user_id: UserId) -> Option<UserId> {
    let own = likes.get(&user_id)?;

    let mut best: Option<(UserId, usize)> = None;
    for (&candidate, films) in likes {
        if candidate == user_id {
            continue;
        }
        let overlap = own.intersection(films).count();
        if overlap > best.map_or(0, |(_, o)| o) {
            best = Some((candidate, overlap));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Generates film suggestions from like overlap between users
///
/// Suggests the films liked by the single most similar user that `user_id` has
/// not liked yet.
#[derive(Clone)]
pub struct RecommendationService {
    users: Arc<dyn UserStore>,
    films: Arc<dyn FilmStore>,
    hydrator: FilmHydrator,
}

impl RecommendationService {
    pub fn new(users: Arc<dyn UserStore>, films: Arc<dyn FilmStore>, hydrator: FilmHydrator) -> Self {
        Self {
            users,
            films,
            hydrator,
        }
    }

    pub async fn get_recommendations(&self, user_id: UserId) -> AppResult<Vec<Film>> {
        require_user(self.users.as_ref(), user_id).await?;

        let mut likes = LikeSets::new();
        for (film_id, liker) in self.films.all_film_likes().await? {
            likes.entry(liker).or_default().insert(film_id);
        }

        let Some(neighbour) = nearest_neighbour(&likes, user_id) else {
            tracing::debug!(user_id, "No overlapping user, nothing to recommend");
            return Ok(Vec::new());
        };

        let own = likes.get(&user_id).cloned().unwrap_or_default();
        let mut films = Vec::new();
        if let Some(theirs) = likes.get(&neighbour) {
            for &film_id in theirs.difference(&own) {
                films.push(self.hydrator.load(film_id).await?);
            }
        }

        tracing::debug!(
            user_id,
            neighbour,
            recommended = films.len(),
            "Computed recommendations"
        );
        Ok(films)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        error::AppError,
        models::{FilmRecord, User},
    };
    use chrono::NaiveDate;

    fn like_sets(rows: Vec<(UserId, Vec<FilmId>)>) -> LikeSets {
        rows.into_iter()
            .map(|(user, films)| (user, films.into_iter().collect()))
            .collect()
    }

    #[test]
    fn test_neighbour_has_strictly_greatest_overlap() {
        let likes = like_sets(vec![(1, vec![1, 2]), (2, vec![1, 2, 3]), (3, vec![1])]);
        assert_eq!(nearest_neighbour(&likes, 1), Some(2));
    }

    #[test]
    fn test_neighbour_tie_keeps_lowest_id() {
        let likes = like_sets(vec![(1, vec![1]), (2, vec![1, 5]), (3, vec![1, 6])]);
        assert_eq!(nearest_neighbour(&likes, 1), Some(2));
    }

    #[test]
    fn test_no_neighbour_without_overlap() {
        let likes = like_sets(vec![(1, vec![1]), (2, vec![2])]);
        assert_eq!(nearest_neighbour(&likes, 1), None);
        assert_eq!(nearest_neighbour(&likes, 3), None);
    }

    async fn seed(store: &MemoryStore, users: usize, films: usize) {
        for n in 0..users {
            store
                .insert_user(User {
                    id: 0,
                    email: format!("u{}@example.com", n),
                    login: format!("u{}", n),
                    name: format!("u{}", n),
                    birthday: None,
                })
                .await
                .unwrap();
        }
        for n in 0..films {
            store
                .insert_film(
                    FilmRecord {
                        id: 0,
                        name: format!("Film {}", n),
                        description: String::new(),
                        release_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                        duration: 6000,
                        mpa_id: None,
                    },
                    vec![],
                    vec![],
                )
                .await
                .unwrap();
        }
    }

    fn service(store: &Arc<MemoryStore>) -> RecommendationService {
        let hydrator = FilmHydrator::new(store.clone(), store.clone());
        RecommendationService::new(store.clone(), store.clone(), hydrator)
    }

    #[tokio::test]
    async fn test_recommends_neighbours_unseen_films() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, 3, 3).await;
        for (film, user) in [(1, 1), (2, 1), (1, 2), (2, 2), (3, 2), (1, 3)] {
            store.add_film_like(film, user).await.unwrap();
        }

        let films = service(&store).get_recommendations(1).await.unwrap();
        let ids: Vec<_> = films.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[tokio::test]
    async fn test_user_without_likes_gets_nothing() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, 2, 1).await;
        store.add_film_like(1, 2).await.unwrap();

        assert!(service(&store).get_recommendations(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let result = service(&store).get_recommendations(8).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
