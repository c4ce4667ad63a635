//! HTTP client for the hosted flight-search backend.
//!
//! Implements `rotta_core`'s [`FlightSearchBackend`] capability trait:
//! place auto-complete, one-way flight search (including the open-ended
//! "everywhere" destination) and the geography hierarchy download.

mod types;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use rotta_core::backend::{BackendError, FlightSearchBackend};
use rotta_core::place::{Destination, Place};
use rotta_core::wire::{FlightsResponse, GeoNode};

use types::{Envelope, SuggestItem};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Connection settings for the flight-search API.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_market")]
    pub market: String,
}

fn default_locale() -> String {
    "it-IT".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_market() -> String {
    "IT".to_string()
}

/// Flight-search API client.
#[derive(Clone)]
pub struct FlightSearchClient {
    http: Client,
    config: ClientConfig,
}

impl FlightSearchClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("backend base_url is not set".into()));
        }
        if config.api_key.trim().is_empty() {
            return Err(ClientError::Config("backend api_key is not set".into()));
        }
        Ok(Self {
            http: Client::new(),
            config,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        debug!(%url, "flight backend request");

        let response = self
            .http
            .get(&url)
            .header("x-api-key", &self.config.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, %url, "flight backend request failed");
                BackendError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %body, "flight backend returned an error");
            return Err(BackendError::Request(format!("status {status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn suggest(&self, query: &str) -> Result<Vec<Place>, BackendError> {
        let envelope: Envelope<Vec<SuggestItem>> = self
            .get_json(
                "/api/v1/flights/searchAirport",
                &[
                    ("query", query.to_string()),
                    ("locale", self.config.locale.clone()),
                ],
            )
            .await?;
        Ok(envelope
            .data
            .into_iter()
            .filter_map(SuggestItem::into_place)
            .collect())
    }
}

#[async_trait]
impl FlightSearchBackend for FlightSearchClient {
    async fn resolve_place(&self, code: &str) -> Result<Place, BackendError> {
        let mut places = self.suggest(code).await?;
        if let Some(position) = places
            .iter()
            .position(|place| place.code.eq_ignore_ascii_case(code))
        {
            return Ok(places.swap_remove(position));
        }
        places
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(code.to_string()))
    }

    async fn search_places(&self, query: &str) -> Result<Vec<Place>, BackendError> {
        self.suggest(query).await
    }

    async fn search_flights(
        &self,
        origin: &Place,
        destination: &Destination,
        date: NaiveDate,
    ) -> Result<FlightsResponse, BackendError> {
        let mut query = vec![
            ("originSkyId", origin.code.clone()),
            ("originEntityId", origin.entity_id.clone()),
            ("date", date.format("%Y-%m-%d").to_string()),
            ("currency", self.config.currency.clone()),
            ("market", self.config.market.clone()),
            ("locale", self.config.locale.clone()),
        ];
        match destination {
            Destination::Place(place) => {
                query.push(("destinationSkyId", place.code.clone()));
                query.push(("destinationEntityId", place.entity_id.clone()));
            }
            Destination::Everywhere => {
                query.push(("destinationSkyId", "everywhere".to_string()));
            }
        }

        let envelope: Envelope<FlightsResponse> = self
            .get_json("/api/v1/flights/searchFlights", &query)
            .await?;
        Ok(envelope.data)
    }

    async fn geo_hierarchy(&self) -> Result<GeoNode, BackendError> {
        let envelope: Envelope<GeoNode> = self
            .get_json(
                "/api/v1/flights/getGeoHierarchy",
                &[("locale", self.config.locale.clone())],
            )
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(envelope.data)
    }
}
