//! HTTP-level tests over an in-memory router and mock backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rotta_api::{app, AppState};
use rotta_core::backend::{BackendError, FlightSearchBackend};
use rotta_core::place::{Destination, EntityKind, Place};
use rotta_core::wire::{FlightsResponse, GeoNode};

#[derive(Default)]
struct MockBackend {
    resolved: HashMap<String, Place>,
    suggestions: HashMap<String, Vec<Place>>,
    flights: HashMap<(String, String), FlightsResponse>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl FlightSearchBackend for MockBackend {
    async fn resolve_place(&self, code: &str) -> Result<Place, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.resolved
            .get(code)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(code.into()))
    }

    async fn search_places(&self, query: &str) -> Result<Vec<Place>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.suggestions.get(query).cloned().unwrap_or_default())
    }

    async fn search_flights(
        &self,
        origin: &Place,
        destination: &Destination,
        _date: NaiveDate,
    ) -> Result<FlightsResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (
            origin.code.clone(),
            match destination {
                Destination::Everywhere => "everywhere".to_string(),
                Destination::Place(place) => place.code.clone(),
            },
        );
        Ok(self.flights.get(&key).cloned().unwrap_or_default())
    }

    async fn geo_hierarchy(&self) -> Result<GeoNode, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::Unavailable("not wired in this test".into()))
    }
}

fn place(code: &str, kind: EntityKind, title: &str, subtitle: &str) -> Place {
    Place {
        title: title.into(),
        entity_id: format!("ent-{code}"),
        code: code.into(),
        kind,
        subtitle: subtitle.into(),
    }
}

fn itinerary(id: &str, price: f64, departure: &str, arrival: &str) -> Value {
    json!({
        "id": id,
        "price": {"raw": price},
        "legs": [{
            "departure": departure,
            "arrival": arrival,
            "stopCount": 0,
            "durationInMinutes": 100,
            "carriers": {"marketing": [{"name": "easyJet"}]},
            "origin": {},
            "destination": {}
        }]
    })
}

/// Backend with a resolvable VCE -> LON route.
fn specific_backend() -> MockBackend {
    let mut backend = MockBackend::default();
    backend.resolved.insert(
        "VCE".into(),
        place("VCE", EntityKind::Airport, "Venice Marco Polo", "Italy"),
    );
    backend
        .resolved
        .insert("LON".into(), place("LON", EntityKind::City, "London", "United Kingdom"));
    backend.flights.insert(
        ("VCE".into(), "LON".into()),
        serde_json::from_value(json!({
            "itineraries": {"buckets": [{"id": "Best", "items": [
                itinerary("a", 60.0, "2026-02-06T08:30:00", "2026-02-06T10:10:00"),
                itinerary("b", 35.0, "2026-02-06T17:00:00", "2026-02-06T18:40:00")
            ]}]}
        }))
        .unwrap(),
    );
    backend
}

async fn post_search(backend: MockBackend, body: Value) -> (StatusCode, Value) {
    let app = app(AppState {
        backend: Arc::new(backend),
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/search")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_search_happy_path_returns_sorted_flights() {
    let (status, body) = post_search(
        specific_backend(),
        json!({
            "origins": ["VCE"],
            "destinations": ["LON"],
            "depart_date": "06/02/2026",
            "max_price": 100
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["search_everywhere"], false);
    assert_eq!(body["flights"][0]["price"], 35.0);
    assert_eq!(body["flights"][1]["price"], 60.0);
    assert_eq!(body["stats"]["origins"], "VCE");
    assert_eq!(body["stats"]["destinations"], "LON");
}

#[tokio::test]
async fn test_empty_origins_rejected_before_any_backend_call() {
    let backend = specific_backend();
    let calls = backend.calls.clone();

    let (status, body) = post_search(
        backend,
        json!({
            "origins": [],
            "destinations": ["LON"],
            "depart_date": "06/02/2026",
            "max_price": 100
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("departure airport"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_date_rejected() {
    let (status, body) = post_search(
        specific_backend(),
        json!({
            "origins": ["VCE"],
            "destinations": ["LON"],
            "depart_date": "2026-02-06",
            "max_price": 100
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("DD/MM/YYYY"));
}

#[tokio::test]
async fn test_non_numeric_price_rejected() {
    let (status, body) = post_search(
        specific_backend(),
        json!({
            "origins": ["VCE"],
            "destinations": ["LON"],
            "depart_date": "06/02/2026",
            "max_price": "cheap"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Maximum price must be a number.");
}

#[tokio::test]
async fn test_unknown_destination_maps_to_bad_request() {
    let (status, body) = post_search(
        specific_backend(),
        json!({
            "origins": ["VCE"],
            "destinations": ["XXX"],
            "depart_date": "06/02/2026",
            "max_price": 100
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("XXX"));
}

#[tokio::test]
async fn test_autosuggest_short_query_returns_empty_list() {
    let app = app(AppState {
        backend: Arc::new(specific_backend()),
    });
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/airports?query=v")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_autosuggest_caps_and_reshapes_results() {
    let mut backend = MockBackend::default();
    let many: Vec<Place> = (0..10)
        .map(|i| {
            place(
                &format!("A{i:02}"),
                EntityKind::Airport,
                &format!("Airport {i}"),
                "Somewhere",
            )
        })
        .collect();
    backend.suggestions.insert("ven".into(), many);

    let app = app(AppState {
        backend: Arc::new(backend),
    });
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/airports?query=ven")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 8);
    assert_eq!(items[0]["skyId"], "A00");
    assert_eq!(items[0]["entityType"], "AIRPORT");
    assert_eq!(items[0]["subtitle"], "Somewhere");
}

#[tokio::test]
async fn test_search_stream_emits_named_sse_events() {
    let response = app(AppState {
        backend: Arc::new(specific_backend()),
    })
    .oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/search/stream")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "origins": ["VCE"],
                    "destinations": ["LON"],
                    "depart_date": "06/02/2026",
                    "max_price": 100
                })
                .to_string(),
            ))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: progress"));
    assert!(text.contains("event: results"));
    assert!(text.contains("event: complete"));

    // The terminal frame carries the full sorted aggregate.
    let complete_data = text
        .lines()
        .zip(text.lines().skip(1))
        .find(|(event, _)| *event == "event: complete")
        .map(|(_, data)| data.trim_start_matches("data: ").to_string())
        .unwrap();
    let payload: Value = serde_json::from_str(&complete_data).unwrap();
    assert_eq!(payload["count"], 2);
    assert_eq!(payload["flights"][0]["price"], 35.0);
}

#[tokio::test]
async fn test_stream_validation_failure_is_plain_bad_request() {
    let response = app(AppState {
        backend: Arc::new(specific_backend()),
    })
    .oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/search/stream")
            .header("content-type", "application/json")
            .body(Body::from(json!({"origins": []}).to_string()))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
