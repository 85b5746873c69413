pub mod extract;
pub mod routes;
pub mod state;

pub use extract::JsonBody;
pub use routes::create_router;
pub use state::AppState;
