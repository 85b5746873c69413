mod catalog;
mod event;
mod film;
mod patch;
mod review;
mod user;

pub use catalog::{Director, DirectorPatch, Genre, IdRef, Mpa, NewDirector};
pub use event::{Event, EventType, Operation};
pub use film::{Film, FilmPatch, FilmRecord, NewFilm};
pub use patch::Patch;
pub use review::{useful_score, Review, ReviewPayload, ReviewRecord};
pub use user::{Friendship, FriendshipStatus, NewUser, User, UserPatch};

pub type UserId = i64;
pub type FilmId = i64;
pub type DirectorId = i64;
pub type ReviewId = i64;
pub type EventId = i64;
