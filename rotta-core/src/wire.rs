//! Typed model of the raw flight-search response document.
//!
//! Every leaf field is optional (or defaulted) on purpose: the backend
//! routinely omits pieces of an itinerary, and a malformed item must
//! degrade to a per-item skip rather than fail the whole decode.

use serde::{Deserialize, Serialize};

/// Top-level response of one flight query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightsResponse {
    pub itineraries: Itineraries,
    pub everywhere_destination: QuoteResults,
    pub country_destination: QuoteResults,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Itineraries {
    pub buckets: Vec<Bucket>,
}

/// Backend-defined grouping of itinerary items ("best", "cheapest", ...).
/// Items may repeat across buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bucket {
    pub id: String,
    pub items: Vec<ItineraryItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItineraryItem {
    pub id: String,
    pub price: Price,
    pub legs: Vec<Leg>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Price {
    pub raw: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Leg {
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub stop_count: u32,
    pub duration_in_minutes: u32,
    pub carriers: Carriers,
    pub origin: LegPlace,
    pub destination: LegPlace,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Carriers {
    pub marketing: Vec<Carrier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Carrier {
    pub name: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegPlace {
    pub city: Option<String>,
    pub country: Option<String>,
    pub name: Option<String>,
    pub display_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub destination: LegPlace,
}

/// Cheapest-quote listings used by the everywhere / country drill-down
/// stages (`everywhereDestination` and `countryDestination` blocks).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteResults {
    pub results: Vec<QuoteResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteResult {
    pub content: QuoteContent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteContent {
    pub location: QuoteLocation,
    pub flight_quotes: FlightQuotes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteLocation {
    pub name: Option<String>,
    pub sky_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightQuotes {
    pub cheapest: Option<CheapestQuote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheapestQuote {
    pub raw_price: Option<f64>,
}

/// One node of the hierarchical geography tree (optional fallback path
/// for city discovery when the quote flow yields nothing).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoNode {
    pub entity_id: String,
    pub name: String,
    pub sky_code: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub country_code: Option<String>,
    pub children: Vec<GeoNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_response_decodes() {
        // Missing blocks and half-empty items must not fail the decode.
        let raw = serde_json::json!({
            "itineraries": {
                "buckets": [
                    {"id": "Best", "items": [{"id": "it-1", "price": {}}]}
                ]
            }
        });
        let response: FlightsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.itineraries.buckets.len(), 1);
        assert_eq!(response.itineraries.buckets[0].items[0].id, "it-1");
        assert!(response.itineraries.buckets[0].items[0].price.raw.is_none());
        assert!(response.everywhere_destination.results.is_empty());
    }

    #[test]
    fn test_camel_case_fields() {
        let raw = serde_json::json!({
            "everywhereDestination": {
                "results": [{
                    "content": {
                        "location": {"name": "Spain", "skyCode": "ES"},
                        "flightQuotes": {"cheapest": {"rawPrice": 42.5}}
                    }
                }]
            }
        });
        let response: FlightsResponse = serde_json::from_value(raw).unwrap();
        let content = &response.everywhere_destination.results[0].content;
        assert_eq!(content.location.sky_code.as_deref(), Some("ES"));
        assert_eq!(
            content.flight_quotes.cheapest.as_ref().unwrap().raw_price,
            Some(42.5)
        );
    }
}
