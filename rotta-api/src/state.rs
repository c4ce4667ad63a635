use std::sync::Arc;

use rotta_core::backend::FlightSearchBackend;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn FlightSearchBackend>,
}
