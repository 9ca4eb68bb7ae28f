use std::sync::Arc;

use natours_core::TourStore;

use crate::config::Environment;

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<TourStore>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(store: TourStore, environment: Environment) -> Self {
        Self { store: Arc::new(store), environment }
    }
}
