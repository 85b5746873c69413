//! Like-count rankings, common films and film search.

use chrono::Datelike;
use std::collections::{BTreeMap, BTreeSet};
use std::{str::FromStr, sync::Arc};

use super::{hydration::FilmHydrator, users::require_user};
use crate::{
    db::{FilmStore, ReferenceStore, UserStore},
    error::{AppError, AppResult},
    models::{DirectorId, Film, FilmId, UserId},
};

/// Ordering for a director's films
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorSort {
    /// Ascending release date
    Year,
    /// Descending like count
    Likes,
}

impl FromStr for DirectorSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(DirectorSort::Year),
            "likes" => Ok(DirectorSort::Likes),
            other => Err(AppError::NotFound(format!(
                "sort mode '{}' unavailable",
                other
            ))),
        }
    }
}

/// Fields a search query is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBy {
    Title,
    Director,
    TitleOrDirector,
}

impl SearchBy {
    /// Unknown field lists yield `None`
    pub fn parse(by: &str) -> Option<Self> {
        match by {
            "title" => Some(SearchBy::Title),
            "director" => Some(SearchBy::Director),
            "title,director" | "director,title" => Some(SearchBy::TitleOrDirector),
            _ => None,
        }
    }

    fn matches(&self, film: &Film, needle: &str) -> bool {
        let by_title = || film.name.to_lowercase().contains(needle);
        let by_director = || {
            film.directors
                .iter()
                .any(|d| d.name.to_lowercase().contains(needle))
        };

        match self {
            SearchBy::Title => by_title(),
            SearchBy::Director => by_director(),
            SearchBy::TitleOrDirector => by_title() || by_director(),
        }
    }
}

/// Most liked first; equal counts by ascending film id
fn rank_by_likes(films: &mut [Film]) {
    films.sort_by(|a, b| {
        b.likes_count()
            .cmp(&a.likes_count())
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[derive(Clone)]
pub struct PopularityService {
    films: Arc<dyn FilmStore>,
    users: Arc<dyn UserStore>,
    reference: Arc<dyn ReferenceStore>,
    hydrator: FilmHydrator,
}

impl PopularityService {
    pub fn new(
        films: Arc<dyn FilmStore>,
        users: Arc<dyn UserStore>,
        reference: Arc<dyn ReferenceStore>,
    ) -> Self {
        let hydrator = FilmHydrator::new(films.clone(), reference.clone());
        Self {
            films,
            users,
            reference,
            hydrator,
        }
    }

    pub async fn get_top_films(&self, count: Option<usize>) -> AppResult<Vec<Film>> {
        self.get_most_popular_films(count, None, None).await
    }

    /// Films ranked by like count, optionally narrowed to a genre and release year
    pub async fn get_most_popular_films(
        &self,
        count: Option<usize>,
        genre_id: Option<i64>,
        year: Option<i32>,
    ) -> AppResult<Vec<Film>> {
        let mut films: Vec<Film> = self
            .hydrator
            .load_all()
            .await?
            .into_iter()
            .filter(|f| genre_id.map_or(true, |g| f.has_genre(g)))
            .filter(|f| year.map_or(true, |y| f.release_date.year() == y))
            .collect();

        rank_by_likes(&mut films);
        if let Some(count) = count {
            films.truncate(count);
        }

        tracing::debug!(
            count = ?count,
            genre_id = ?genre_id,
            year = ?year,
            returned = films.len(),
            "Ranked popular films"
        );
        Ok(films)
    }

    /// Films liked by both users, by ascending film id
    pub async fn get_common_films(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> AppResult<Vec<Film>> {
        require_user(self.users.as_ref(), user_id).await?;
        require_user(self.users.as_ref(), friend_id).await?;

        let mut liked_by: BTreeMap<FilmId, BTreeSet<UserId>> = BTreeMap::new();
        for (film_id, liker) in self.films.all_film_likes().await? {
            liked_by.entry(film_id).or_default().insert(liker);
        }

        let mut films = Vec::new();
        for (film_id, likers) in liked_by {
            if likers.contains(&user_id) && likers.contains(&friend_id) {
                films.push(self.hydrator.load(film_id).await?);
            }
        }
        Ok(films)
    }

    /// Films of a director ordered by `sort_by`, either `year` or `likes`
    pub async fn sort_films(&self, director_id: DirectorId, sort_by: &str) -> AppResult<Vec<Film>> {
        let sort: DirectorSort = sort_by.parse()?;
        if self.reference.get_director(director_id).await?.is_none() {
            return Err(AppError::not_found("Director", director_id));
        }

        let mut films: Vec<Film> = self
            .hydrator
            .load_all()
            .await?
            .into_iter()
            .filter(|f| f.has_director(director_id))
            .collect();

        match sort {
            DirectorSort::Year => films.sort_by_key(|f| f.release_date),
            DirectorSort::Likes => rank_by_likes(&mut films),
        }
        Ok(films)
    }

    /// Case-insensitive substring search over titles and/or director names
    pub async fn search_films(&self, query: &str, by: &str) -> AppResult<Vec<Film>> {
        let Some(search_by) = SearchBy::parse(by) else {
            tracing::warn!(by, "Unknown search fields");
            return Ok(Vec::new());
        };

        let needle = query.to_lowercase();
        let films = self
            .hydrator
            .load_all()
            .await?
            .into_iter()
            .filter(|f| search_by.matches(f, &needle))
            .collect();
        Ok(films)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{FilmRecord, User},
    };
    use chrono::NaiveDate;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: PopularityService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let service = PopularityService::new(store.clone(), store.clone(), store.clone());
            Self { store, service }
        }

        async fn film(&self, name: &str, year: i32, genres: Vec<i64>) -> FilmId {
            let record = FilmRecord {
                id: 0,
                name: name.to_string(),
                description: String::new(),
                release_date: NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
                duration: 5400,
                mpa_id: Some(1),
            };
            self.store.insert_film(record, genres, vec![]).await.unwrap().id
        }

        async fn user(&self, login: &str) -> UserId {
            let user = User {
                id: 0,
                email: format!("{}@example.com", login),
                login: login.to_string(),
                name: login.to_string(),
                birthday: None,
            };
            self.store.insert_user(user).await.unwrap().id
        }

        async fn director(&self, name: &str, films: &[FilmId]) -> DirectorId {
            let director = self.store.insert_director(name.to_string()).await.unwrap();
            for &film_id in films {
                let record = self.store.get_film(film_id).await.unwrap().unwrap();
                self.store
                    .update_film(record, None, Some(vec![director.id]))
                    .await
                    .unwrap();
            }
            director.id
        }

        async fn like(&self, film_id: FilmId, user_id: UserId) {
            self.store.add_film_like(film_id, user_id).await.unwrap();
        }
    }

    fn ids(films: &[Film]) -> Vec<FilmId> {
        films.iter().map(|f| f.id).collect()
    }

    #[tokio::test]
    async fn test_most_popular_orders_by_likes() {
        let fx = Fixture::new();
        let f1 = fx.film("Jaws", 1975, vec![4]).await;
        let f2 = fx.film("Tootsie", 1982, vec![1]).await;
        let (u1, u2) = (fx.user("a").await, fx.user("b").await);
        fx.like(f2, u1).await;
        fx.like(f1, u1).await;
        fx.like(f1, u2).await;

        let films = fx.service.get_most_popular_films(None, None, None).await.unwrap();
        assert_eq!(ids(&films), vec![f1, f2]);
    }

    #[tokio::test]
    async fn test_ties_break_by_ascending_id_and_count_caps() {
        let fx = Fixture::new();
        let f1 = fx.film("One", 2001, vec![]).await;
        let f2 = fx.film("Two", 2002, vec![]).await;
        let f3 = fx.film("Three", 2003, vec![]).await;
        let u = fx.user("fan").await;
        fx.like(f3, u).await;

        let films = fx.service.get_top_films(None).await.unwrap();
        assert_eq!(ids(&films), vec![f3, f1, f2]);

        let films = fx.service.get_top_films(Some(2)).await.unwrap();
        assert_eq!(ids(&films), vec![f3, f1]);
    }

    #[tokio::test]
    async fn test_filters_by_genre_and_year() {
        let fx = Fixture::new();
        let comedy_82 = fx.film("Tootsie", 1982, vec![1]).await;
        let _drama_82 = fx.film("Gandhi", 1982, vec![2]).await;
        let _comedy_84 = fx.film("Ghostbusters", 1984, vec![1, 6]).await;

        let films = fx
            .service
            .get_most_popular_films(None, Some(1), Some(1982))
            .await
            .unwrap();
        assert_eq!(ids(&films), vec![comedy_82]);

        let films = fx
            .service
            .get_most_popular_films(None, Some(6), None)
            .await
            .unwrap();
        assert_eq!(films.len(), 1);
    }

    #[tokio::test]
    async fn test_common_films() {
        let fx = Fixture::new();
        let f1 = fx.film("Alien", 1979, vec![]).await;
        let f2 = fx.film("Aliens", 1986, vec![]).await;
        let f3 = fx.film("Alien 3", 1992, vec![]).await;
        let (a, b) = (fx.user("ripley").await, fx.user("hicks").await);
        fx.like(f1, a).await;
        fx.like(f2, a).await;
        fx.like(f2, b).await;
        fx.like(f3, b).await;

        let films = fx.service.get_common_films(a, b).await.unwrap();
        assert_eq!(ids(&films), vec![f2]);

        let c = fx.user("newt").await;
        assert!(fx.service.get_common_films(a, c).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sort_director_films() {
        let fx = Fixture::new();
        let late = fx.film("Tenet", 2020, vec![]).await;
        let early = fx.film("Memento", 2000, vec![]).await;
        let _other = fx.film("Heat", 1995, vec![]).await;
        let director = fx.director("Christopher Nolan", &[late, early]).await;
        let u = fx.user("fan").await;
        fx.like(late, u).await;

        let by_year = fx.service.sort_films(director, "year").await.unwrap();
        assert_eq!(ids(&by_year), vec![early, late]);

        let by_likes = fx.service.sort_films(director, "likes").await.unwrap();
        assert_eq!(ids(&by_likes), vec![late, early]);
    }

    #[tokio::test]
    async fn test_sort_rejects_unknown_mode_and_director() {
        let fx = Fixture::new();
        let director = fx.director("Agnès Varda", &[]).await;

        let result = fx.service.sort_films(director, "rating").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = fx.service.sort_films(director + 1, "year").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_by_title_and_director() {
        let fx = Fixture::new();
        let crash = fx.film("Crash", 1996, vec![]).await;
        let fly = fx.film("The Fly", 1986, vec![]).await;
        let cars = fx.film("Cars", 2006, vec![]).await;
        fx.director("David Cronenberg", &[crash, fly]).await;

        let films = fx.service.search_films("CRA", "title").await.unwrap();
        assert_eq!(ids(&films), vec![crash]);

        let films = fx.service.search_films("cronen", "director").await.unwrap();
        assert_eq!(ids(&films), vec![crash, fly]);

        let films = fx.service.search_films("ca", "title,director").await.unwrap();
        assert_eq!(ids(&films), vec![cars]);

        let films = fx.service.search_films("fly", "title,director").await.unwrap();
        assert_eq!(ids(&films), vec![fly]);
    }

    #[tokio::test]
    async fn test_empty_query_matches_everything() {
        let fx = Fixture::new();
        fx.film("Up", 2009, vec![3]).await;
        fx.film("Coco", 2017, vec![3]).await;

        let films = fx.service.search_films("", "title").await.unwrap();
        assert_eq!(films.len(), 2);

        assert!(fx.service.search_films("", "genre").await.unwrap().is_empty());
    }
}
