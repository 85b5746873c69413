pub mod catalog;
pub mod event_feed;
pub mod films;
pub mod friendship;
pub mod hydration;
pub mod popularity;
pub mod recommendations;
pub mod reviews;
pub mod users;

use std::sync::Arc;

use crate::db::CatalogStore;

pub use catalog::CatalogService;
pub use event_feed::EventFeed;
pub use films::FilmService;
pub use friendship::FriendshipService;
pub use hydration::FilmHydrator;
pub use popularity::{DirectorSort, PopularityService, SearchBy};
pub use recommendations::RecommendationService;
pub use reviews::ReviewService;
pub use users::UserService;

/// Every engine, wired over one storage backend
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub friendships: FriendshipService,
    pub films: FilmService,
    pub popularity: PopularityService,
    pub recommendations: RecommendationService,
    pub reviews: ReviewService,
    pub catalog: CatalogService,
    pub feed: EventFeed,
}

impl Services {
    pub fn new<S: CatalogStore + 'static>(store: Arc<S>) -> Self {
        let feed = EventFeed::new(store.clone(), store.clone());
        let hydrator = FilmHydrator::new(store.clone(), store.clone());

        Self {
            users: UserService::new(store.clone()),
            friendships: FriendshipService::new(store.clone(), store.clone(), feed.clone()),
            films: FilmService::new(store.clone(), store.clone(), store.clone(), feed.clone()),
            popularity: PopularityService::new(store.clone(), store.clone(), store.clone()),
            recommendations: RecommendationService::new(store.clone(), store.clone(), hydrator),
            reviews: ReviewService::new(store.clone(), store.clone(), store.clone(), feed.clone()),
            catalog: CatalogService::new(store),
            feed,
        }
    }
}
