//! Search and auto-complete endpoints.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use rotta_core::events::{EventSink, NullSink, SearchEvent};
use rotta_core::filters::{SearchFilters, TimeWindow};
use rotta_core::flight::FlightRecord;
use rotta_core::orchestrator::{SearchOrchestrator, SearchPlan, SearchStats};
use rotta_core::sorter::SortKey;
use rotta_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

const AUTOSUGGEST_LIMIT: usize = 8;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/airports", get(autosuggest))
        .route("/api/search", post(search))
        .route("/api/search/stream", post(search_stream))
}

/// Raw search form. Numeric fields arrive as JSON numbers or as the
/// strings a form submits, so they are validated here rather than
/// rejected by the deserializer.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub search_everywhere: bool,
    pub depart_date: String,
    pub max_price: Value,
    pub min_hour: Value,
    pub max_hour: Value,
    pub min_arrival_hour: Value,
    pub max_arrival_hour: Value,
    pub direct_only: bool,
    pub same_day: bool,
    pub sort: String,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            origins: Vec::new(),
            destinations: Vec::new(),
            search_everywhere: false,
            depart_date: String::new(),
            max_price: Value::Null,
            min_hour: Value::Null,
            max_hour: Value::Null,
            min_arrival_hour: Value::Null,
            max_arrival_hour: Value::Null,
            direct_only: false,
            same_day: true,
            sort: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub flights: Vec<FlightRecord>,
    pub stats: SearchStats,
    pub count: usize,
    pub search_everywhere: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AutosuggestParams {
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuggestion {
    pub title: String,
    pub subtitle: String,
    pub sky_id: String,
    pub entity_type: String,
}

async fn autosuggest(
    State(state): State<AppState>,
    Query(params): Query<AutosuggestParams>,
) -> Result<Json<Vec<PlaceSuggestion>>, AppError> {
    let query = params.query.trim();
    if query.chars().count() < 2 {
        return Ok(Json(Vec::new()));
    }

    let places = state
        .backend
        .search_places(query)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let suggestions = places
        .into_iter()
        .take(AUTOSUGGEST_LIMIT)
        .map(|place| PlaceSuggestion {
            title: place.title,
            subtitle: place.subtitle,
            sky_id: place.code,
            entity_type: place.kind.as_wire().to_string(),
        })
        .collect();
    Ok(Json(suggestions))
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let plan = validate(&request)?;
    let orchestrator = SearchOrchestrator::new(state.backend.clone());
    let outcome = orchestrator
        .run(&plan, &NullSink)
        .await
        .map_err(map_core_error)?;

    Ok(Json(SearchResponse {
        count: outcome.flights.len(),
        flights: outcome.flights,
        stats: outcome.stats,
        search_everywhere: outcome.everywhere,
    }))
}

/// Bridges the orchestrator's events into the response channel.
struct ChannelSink(mpsc::UnboundedSender<SearchEvent>);

impl EventSink for ChannelSink {
    fn emit(&self, event: SearchEvent) {
        // A dropped receiver means the client went away; the search
        // simply finishes without an audience.
        let _ = self.0.send(event);
    }
}

async fn search_stream(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let plan = validate(&request)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let backend = state.backend.clone();

    tokio::spawn(async move {
        let orchestrator = SearchOrchestrator::new(backend);
        // The terminal event is already in the stream; the returned
        // outcome has no second consumer here.
        let _ = orchestrator.run(&plan, &ChannelSink(tx)).await;
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        Ok(Event::default()
            .event(event.name())
            .data(serde_json::to_string(&event).unwrap_or_default()))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Checks the raw form and produces a runnable plan. Each rejected
/// field gets its own message so the client can show it verbatim.
fn validate(request: &SearchRequest) -> Result<SearchPlan, AppError> {
    if request.origins.is_empty() {
        return Err(AppError::ValidationError(
            "Select at least one departure airport.".to_string(),
        ));
    }

    let date = NaiveDate::parse_from_str(request.depart_date.trim(), "%d/%m/%Y").map_err(|_| {
        AppError::ValidationError(
            "Check the departure date. Expected format: DD/MM/YYYY.".to_string(),
        )
    })?;

    let max_price = numeric_field(&request.max_price, 0.0, "Maximum price")?;
    let min_hour = hour_field(&request.min_hour, "Minimum departure hour")?.unwrap_or(0);
    let max_hour = hour_field(&request.max_hour, "Maximum departure hour")?.unwrap_or(23);
    let min_arrival = hour_field(&request.min_arrival_hour, "Minimum arrival hour")?;
    let max_arrival = hour_field(&request.max_arrival_hour, "Maximum arrival hour")?;

    let arrival = match (min_arrival, max_arrival) {
        (None, None) => None,
        (min, max) => Some(TimeWindow::from_hours(min.unwrap_or(0), max.unwrap_or(23))),
    };

    let everywhere = request.search_everywhere
        || request.destinations.is_empty()
        || request
            .destinations
            .iter()
            .any(|code| code.eq_ignore_ascii_case("EVERYWHERE"));

    Ok(SearchPlan {
        origins: request.origins.clone(),
        destinations: request.destinations.clone(),
        everywhere,
        date,
        filters: SearchFilters {
            max_price,
            departure: TimeWindow::from_hours(min_hour.min(23), max_hour.min(23)),
            arrival,
            direct_only: request.direct_only,
            same_day: request.same_day,
        },
        sort: SortKey::parse(&request.sort),
    })
}

fn numeric_field(value: &Value, default: f64, label: &str) -> Result<f64, AppError> {
    match value {
        Value::Null => Ok(default),
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| not_a_number(label)),
        Value::String(raw) => raw.trim().parse::<f64>().map_err(|_| not_a_number(label)),
        _ => Err(not_a_number(label)),
    }
}

fn hour_field(value: &Value, label: &str) -> Result<Option<u32>, AppError> {
    match value {
        Value::Null => Ok(None),
        other => Ok(Some(numeric_field(other, 0.0, label)? as u32)),
    }
}

fn not_a_number(label: &str) -> AppError {
    AppError::ValidationError(format!("{label} must be a number."))
}

fn map_core_error(error: CoreError) -> AppError {
    match error {
        CoreError::UnknownOrigin(_) | CoreError::UnknownDestination(_) => {
            AppError::ValidationError(error.to_string())
        }
        CoreError::Backend(inner) => AppError::InternalServerError(inner.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> SearchRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_validate_rejects_empty_origins() {
        let result = validate(&request(json!({
            "origins": [],
            "depart_date": "06/02/2026"
        })));
        match result {
            Err(AppError::ValidationError(msg)) => {
                assert!(msg.contains("departure airport"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_malformed_date() {
        let result = validate(&request(json!({
            "origins": ["VCE"],
            "depart_date": "2026-02-06"
        })));
        match result {
            Err(AppError::ValidationError(msg)) => assert!(msg.contains("DD/MM/YYYY")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_coerces_numeric_strings() {
        let plan = validate(&request(json!({
            "origins": ["VCE"],
            "depart_date": "06/02/2026",
            "max_price": "150.5",
            "min_hour": "6",
            "max_hour": 22
        })))
        .unwrap();

        assert_eq!(plan.filters.max_price, 150.5);
        assert_eq!(plan.filters.departure, TimeWindow::from_hours(6, 22));
    }

    #[test]
    fn test_validate_rejects_non_numeric_price() {
        let result = validate(&request(json!({
            "origins": ["VCE"],
            "depart_date": "06/02/2026",
            "max_price": "cheap"
        })));
        match result {
            Err(AppError::ValidationError(msg)) => {
                assert_eq!(msg, "Maximum price must be a number.")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_infers_everywhere_mode() {
        let no_destinations = validate(&request(json!({
            "origins": ["VCE"],
            "depart_date": "06/02/2026"
        })))
        .unwrap();
        assert!(no_destinations.everywhere);

        let sentinel = validate(&request(json!({
            "origins": ["VCE"],
            "destinations": ["everywhere"],
            "depart_date": "06/02/2026"
        })))
        .unwrap();
        assert!(sentinel.everywhere);

        let specific = validate(&request(json!({
            "origins": ["VCE"],
            "destinations": ["LON"],
            "depart_date": "06/02/2026"
        })))
        .unwrap();
        assert!(!specific.everywhere);
    }

    #[test]
    fn test_same_day_defaults_on_and_arrival_window_off() {
        let plan = validate(&request(json!({
            "origins": ["VCE"],
            "destinations": ["LON"],
            "depart_date": "06/02/2026"
        })))
        .unwrap();

        assert!(plan.filters.same_day);
        assert!(plan.filters.arrival.is_none());
    }

    #[test]
    fn test_partial_arrival_window_fills_missing_bound() {
        let plan = validate(&request(json!({
            "origins": ["VCE"],
            "destinations": ["LON"],
            "depart_date": "06/02/2026",
            "max_arrival_hour": 18
        })))
        .unwrap();

        assert_eq!(plan.filters.arrival, Some(TimeWindow::from_hours(0, 18)));
    }
}
