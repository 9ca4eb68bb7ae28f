pub mod db;
pub mod errors;
pub mod features;
pub mod models;
pub mod reports;
pub mod schema;

pub use db::open::DbOpenConfig;
pub use db::TourStore;
pub use errors::{FieldError, StoreError};
pub use features::{Features, TourQuery};
pub use models::{Difficulty, Tour, TourInput};
pub use reports::{DifficultyStats, MonthPlan};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
