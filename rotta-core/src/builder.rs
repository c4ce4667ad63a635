//! Converts raw itinerary items into normalized flight records.

use std::collections::HashSet;

use chrono::{NaiveDateTime, Timelike};

use crate::filters::SearchFilters;
use crate::flight::{format_duration, FlightRecord, Stopover};
use crate::ledger::FlightLedger;
use crate::wire::{FlightsResponse, Leg};

/// Sentinel used when an itinerary carries no marketing carrier.
pub const UNKNOWN_CARRIER: &str = "N/A";

/// Display-name aliases for carriers the backend spells inconsistently.
const CARRIER_ALIASES: &[(&str, &str)] = &[
    ("ryanair", "Ryanair"),
    ("easyjet", "easyJet"),
    ("wizz air", "Wizz Air"),
    ("wizzair", "Wizz Air"),
];

/// Fallback identity for a flight whose leg omits destination details,
/// taken from the candidate destination the query was issued for.
#[derive(Debug, Clone, Default)]
pub struct DestinationHint {
    pub name: String,
    pub code: String,
    pub country: String,
}

/// Processes one raw search response for a specific origin → destination
/// pair, writing every record that satisfies `filters` into the
/// caller-supplied aggregate list and ledger.
///
/// Malformed per-item data skips that single item, never the response.
/// Returns the records that were newly added or won a merge, in emission
/// order, so incremental callers can forward them as a batch.
pub fn collect_flights(
    response: &FlightsResponse,
    origin_code: &str,
    hint: &DestinationHint,
    filters: &SearchFilters,
    ledger: &mut FlightLedger,
    flights: &mut Vec<FlightRecord>,
) -> Vec<FlightRecord> {
    // Intra-response layer: a response may repeat the same itinerary
    // across buckets.
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut batch = Vec::new();

    for bucket in &response.itineraries.buckets {
        for item in &bucket.items {
            if item.id.is_empty() || !seen_ids.insert(item.id.as_str()) {
                continue;
            }

            let Some(price) = item.price.raw else {
                continue;
            };
            if price > filters.max_price {
                continue;
            }

            let Some(leg) = item.legs.first() else {
                continue;
            };
            let (Some(dep), Some(arr)) = (
                leg.departure.as_deref().and_then(parse_local_timestamp),
                leg.arrival.as_deref().and_then(parse_local_timestamp),
            ) else {
                continue;
            };

            if !filters.departure.contains(minute_of_day(&dep)) {
                continue;
            }
            if let Some(window) = &filters.arrival {
                if !window.contains(minute_of_day(&arr)) {
                    continue;
                }
            }
            if filters.same_day && arr.date() != dep.date() {
                continue;
            }
            if filters.direct_only && leg.stop_count > 0 {
                continue;
            }

            let (carrier, carrier_logo) = resolve_carrier(leg);
            let record = FlightRecord {
                city: leg
                    .destination
                    .city
                    .clone()
                    .unwrap_or_else(|| hint.name.clone()),
                country: leg
                    .destination
                    .country
                    .clone()
                    .unwrap_or_else(|| hint.country.clone()),
                destination_code: leg
                    .destination
                    .display_code
                    .clone()
                    .unwrap_or_else(|| hint.code.clone()),
                origin_code: leg
                    .origin
                    .display_code
                    .clone()
                    .unwrap_or_else(|| origin_code.to_string()),
                price,
                departure: dep.format("%H:%M").to_string(),
                arrival: arr.format("%H:%M").to_string(),
                duration_minutes: leg.duration_in_minutes,
                duration: format_duration(leg.duration_in_minutes),
                stop_count: leg.stop_count,
                stopovers: compute_stopovers(leg),
                carrier,
                carrier_logo,
            };

            if let Some(slot) = ledger.insert_or_merge(flights, record) {
                batch.push(flights[slot].clone());
            }
        }
    }

    batch
}

/// One stopover entry per adjacent segment pair: the earlier segment's
/// destination is the stopover location, the wait is the gap until the
/// next segment departs. Malformed timestamps yield empty fields.
fn compute_stopovers(leg: &Leg) -> Vec<Stopover> {
    if leg.stop_count == 0 || leg.segments.len() < 2 {
        return Vec::new();
    }

    leg.segments
        .windows(2)
        .map(|pair| {
            let (segment, next) = (&pair[0], &pair[1]);
            let arrival = segment.arrival.as_deref().and_then(parse_local_timestamp);
            let departure = next.departure.as_deref().and_then(parse_local_timestamp);

            let wait = match (arrival, departure) {
                (Some(arr), Some(dep)) => {
                    let minutes = (dep - arr).num_minutes();
                    if minutes > 0 {
                        format_duration(minutes as u32)
                    } else {
                        String::new()
                    }
                }
                _ => String::new(),
            };

            Stopover {
                city: segment
                    .destination
                    .city
                    .clone()
                    .or_else(|| segment.destination.name.clone())
                    .unwrap_or_default(),
                code: segment.destination.display_code.clone().unwrap_or_default(),
                arrival: arrival
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_default(),
                departure: departure
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_default(),
                wait,
            }
        })
        .collect()
}

fn resolve_carrier(leg: &Leg) -> (String, Option<String>) {
    match leg.carriers.marketing.first() {
        Some(carrier) => (
            carrier
                .name
                .as_deref()
                .map(canonical_carrier)
                .unwrap_or_else(|| UNKNOWN_CARRIER.to_string()),
            carrier.logo_url.clone(),
        ),
        None => (UNKNOWN_CARRIER.to_string(), None),
    }
}

/// Normalizes known carrier aliases to a canonical display form.
pub fn canonical_carrier(raw: &str) -> String {
    let trimmed = raw.trim();
    for (alias, canonical) in CARRIER_ALIASES {
        if trimmed.eq_ignore_ascii_case(alias) {
            return (*canonical).to_string();
        }
    }
    trimmed.to_string()
}

/// Parses the backend's local ISO timestamps ("2026-02-06T18:45:00",
/// seconds optional). Returns `None` on anything malformed.
fn parse_local_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
}

fn minute_of_day(timestamp: &NaiveDateTime) -> u32 {
    timestamp.hour() * 60 + timestamp.minute()
}
