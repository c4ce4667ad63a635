use async_trait::async_trait;
use chrono::NaiveDate;

use crate::place::{Destination, Place};
use crate::wire::{FlightsResponse, GeoNode};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("No place found for \"{0}\"")]
    NotFound(String),
    #[error("Geography hierarchy unavailable: {0}")]
    Unavailable(String),
    #[error("Backend request failed: {0}")]
    Request(String),
    #[error("Malformed backend response: {0}")]
    Decode(String),
}

/// Capability trait over the third-party flight-search backend.
///
/// The orchestrator receives an implementation at construction; nothing
/// in the core performs I/O on its own.
#[async_trait]
pub trait FlightSearchBackend: Send + Sync {
    /// Resolves a location code to a concrete place.
    async fn resolve_place(&self, code: &str) -> Result<Place, BackendError>;

    /// Free-text place lookup; may return an empty list.
    async fn search_places(&self, query: &str) -> Result<Vec<Place>, BackendError>;

    /// One-way flight query for a single date.
    async fn search_flights(
        &self,
        origin: &Place,
        destination: &Destination,
        date: NaiveDate,
    ) -> Result<FlightsResponse, BackendError>;

    /// Full geography tree; optional fallback path for city discovery.
    async fn geo_hierarchy(&self) -> Result<GeoNode, BackendError>;
}
