pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgStore};
pub use store::{
    CatalogStore, EventStore, FilmStore, FriendStore, ReferenceStore, ReviewStore, UserStore,
};

/// Genres every backend starts with
pub const SEED_GENRES: [(i64, &str); 6] = [
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Animation"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

/// MPA ratings every backend starts with
pub const MPA_RATINGS: [(i64, &str); 5] = [
    (1, "G"),
    (2, "PG"),
    (3, "PG-13"),
    (4, "R"),
    (5, "NC-17"),
];
