pub mod config;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{Config, Environment};
pub use errors::AppError;
pub use routes::build_router;
pub use state::AppState;
