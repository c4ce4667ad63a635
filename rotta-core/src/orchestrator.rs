//! Drives the full fan-out search and aggregates the results.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{BackendError, FlightSearchBackend};
use crate::builder::{collect_flights, DestinationHint};
use crate::events::{EventSink, SearchEvent};
use crate::expander::{CandidateDestination, DestinationExpander};
use crate::filters::SearchFilters;
use crate::flight::FlightRecord;
use crate::ledger::FlightLedger;
use crate::place::{Destination, Place};
use crate::sorter::{sort_flights, SortKey};
use crate::{CoreError, CoreResult};

/// Validated description of one search.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub everywhere: bool,
    pub date: NaiveDate,
    pub filters: SearchFilters,
    pub sort: SortKey,
}

/// Descriptive summary of one search. Recomputed per search, never
/// persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cities: Option<u32>,
    pub origins: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destinations: Option<String>,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub flights: Vec<FlightRecord>,
    pub stats: SearchStats,
    pub everywhere: bool,
}

/// Destination of one flight query pair.
enum Target {
    /// Explicitly requested place, already resolved; queried directly.
    Resolved(Place),
    /// Discovered candidate; its code is resolved to an airport (first
    /// lookup result) right before the query.
    Candidate(CandidateDestination),
}

impl Target {
    fn label(&self) -> String {
        match self {
            Target::Resolved(place) => place.title.clone(),
            Target::Candidate(candidate) => match &candidate.country {
                Some(country) => format!("{} ({})", candidate.name, country),
                None => candidate.name.clone(),
            },
        }
    }
}

/// Single entry point for a full search, in either everywhere or
/// specific-destination mode.
///
/// The backend is an injected capability; the aggregate list and ledger
/// are owned by one `run` invocation and never shared.
pub struct SearchOrchestrator {
    backend: Arc<dyn FlightSearchBackend>,
}

impl SearchOrchestrator {
    pub fn new(backend: Arc<dyn FlightSearchBackend>) -> Self {
        Self { backend }
    }

    /// Runs the search to completion, emitting progress and incremental
    /// result events into `sink` along the way. Progress values never
    /// decrease, and exactly one terminal event (`complete` or `error`)
    /// is emitted before returning.
    pub async fn run(&self, plan: &SearchPlan, sink: &dyn EventSink) -> CoreResult<SearchOutcome> {
        let monotonic = MonotonicSink::new(sink);
        let sink: &dyn EventSink = &monotonic;
        progress(sink, 0, "Initializing search".to_string());

        let mut origins = Vec::with_capacity(plan.origins.len());
        for code in &plan.origins {
            progress(sink, 5, format!("Resolving departure airport {code}"));
            match self.backend.resolve_place(code).await {
                Ok(place) => origins.push(place),
                Err(BackendError::NotFound(_)) => {
                    return Err(self.fail(sink, CoreError::UnknownOrigin(code.clone())));
                }
                Err(error) => return Err(self.fail(sink, error.into())),
            }
        }

        let (mut flights, stats) = if plan.everywhere {
            self.run_everywhere(&origins, plan, sink).await
        } else {
            match self.run_specific(&origins, plan, sink).await {
                Ok(result) => result,
                Err(error) => return Err(self.fail(sink, error)),
            }
        };

        sort_flights(&mut flights, plan.sort);
        info!(
            count = flights.len(),
            everywhere = plan.everywhere,
            "search complete"
        );
        progress(
            sink,
            100,
            format!("Search complete, {} flights found", flights.len()),
        );
        sink.emit(SearchEvent::Complete {
            flights: flights.clone(),
            stats: stats.clone(),
            count: flights.len(),
            search_everywhere: plan.everywhere,
        });

        Ok(SearchOutcome {
            flights,
            stats,
            everywhere: plan.everywhere,
        })
    }

    /// Everywhere mode: expand, then iterate the full city × origin
    /// cross product.
    async fn run_everywhere(
        &self,
        origins: &[Place],
        plan: &SearchPlan,
        sink: &dyn EventSink,
    ) -> (Vec<FlightRecord>, SearchStats) {
        let expander = DestinationExpander::new(self.backend.as_ref());
        let expanded = expander
            .expand(origins, plan.date, plan.filters.max_price, sink)
            .await;

        let targets: Vec<Target> = expanded
            .cities
            .iter()
            .cloned()
            .map(Target::Candidate)
            .collect();
        let cities_considered = expanded.cities.len() as u32;

        let flights = self
            .query_pairs(origins, &targets, plan, sink, 40, 55)
            .await;

        let stats = SearchStats {
            countries: Some(expanded.countries_considered),
            cities: Some(cities_considered),
            origins: join_codes(origins.iter().map(|o| o.code.as_str())),
            destinations: None,
        };
        (flights, stats)
    }

    /// Specific-destination mode: resolve the explicit list, expand any
    /// country-level entries into cities, then iterate the cross
    /// product.
    async fn run_specific(
        &self,
        origins: &[Place],
        plan: &SearchPlan,
        sink: &dyn EventSink,
    ) -> CoreResult<(Vec<FlightRecord>, SearchStats)> {
        let mut targets = Vec::new();
        for code in &plan.destinations {
            progress(sink, 8, format!("Resolving destination {code}"));
            let place = match self.backend.resolve_place(code).await {
                Ok(place) => place,
                Err(BackendError::NotFound(_)) => {
                    return Err(CoreError::UnknownDestination(code.clone()));
                }
                Err(error) => return Err(error.into()),
            };

            if place.is_country() {
                // A country cannot be queried pair-wise; expand it into
                // its cities first.
                if let Some(first_origin) = origins.first() {
                    let expander = DestinationExpander::new(self.backend.as_ref());
                    let cities = expander
                        .cities_in_country(first_origin, &place, plan.date, plan.filters.max_price)
                        .await;
                    progress(
                        sink,
                        10,
                        format!("Expanded {} into {} cities", place.title, cities.len()),
                    );
                    targets.extend(cities.into_iter().map(Target::Candidate));
                }
            } else {
                targets.push(Target::Resolved(place));
            }
        }

        let flights = self
            .query_pairs(origins, &targets, plan, sink, 10, 85)
            .await;

        let stats = SearchStats {
            countries: None,
            cities: None,
            origins: join_codes(origins.iter().map(|o| o.code.as_str())),
            destinations: Some(join_codes(plan.destinations.iter().map(String::as_str))),
        };
        Ok((flights, stats))
    }

    /// Iterates origin × target pairs, feeding every response through
    /// the record builder into one shared aggregate list and ledger.
    /// A failing pair contributes zero flights and the loop continues.
    async fn query_pairs(
        &self,
        origins: &[Place],
        targets: &[Target],
        plan: &SearchPlan,
        sink: &dyn EventSink,
        progress_base: u32,
        progress_span: u32,
    ) -> Vec<FlightRecord> {
        let mut ledger = FlightLedger::new();
        let mut flights: Vec<FlightRecord> = Vec::new();

        let total_pairs = (targets.len() * origins.len()).max(1) as u32;
        let mut pair_index = 0u32;

        for target in targets {
            for origin in origins {
                progress(
                    sink,
                    progress_base + pair_index * progress_span / total_pairs,
                    format!("Searching flights to {}", target.label()),
                );
                pair_index += 1;

                match self
                    .flights_for_pair(origin, target, plan, &mut ledger, &mut flights)
                    .await
                {
                    Ok(batch) if !batch.is_empty() => {
                        sink.emit(SearchEvent::Results {
                            flights: batch,
                            running_count: flights.len(),
                        });
                    }
                    Ok(_) => {}
                    Err(error) => {
                        warn!(
                            origin = %origin.code,
                            destination = %target.label(),
                            %error,
                            "flight query failed, skipping pair"
                        );
                    }
                }
            }
        }

        flights
    }

    async fn flights_for_pair(
        &self,
        origin: &Place,
        target: &Target,
        plan: &SearchPlan,
        ledger: &mut FlightLedger,
        flights: &mut Vec<FlightRecord>,
    ) -> Result<Vec<FlightRecord>, BackendError> {
        let (destination, hint) = match target {
            Target::Resolved(place) => (
                place.clone(),
                DestinationHint {
                    name: place.title.clone(),
                    code: place.code.clone(),
                    country: String::new(),
                },
            ),
            Target::Candidate(candidate) => {
                let matches = self.backend.search_places(&candidate.code).await?;
                let Some(airport) = matches.into_iter().next() else {
                    debug!(code = %candidate.code, "no airport found for city, skipping");
                    return Ok(Vec::new());
                };
                (
                    airport,
                    DestinationHint {
                        name: candidate.name.clone(),
                        code: candidate.code.clone(),
                        country: candidate.country.clone().unwrap_or_default(),
                    },
                )
            }
        };

        let response = self
            .backend
            .search_flights(origin, &Destination::Place(destination), plan.date)
            .await?;
        Ok(collect_flights(
            &response,
            &origin.code,
            &hint,
            &plan.filters,
            ledger,
            flights,
        ))
    }

    fn fail(&self, sink: &dyn EventSink, error: CoreError) -> CoreError {
        sink.emit(SearchEvent::Error {
            message: error.to_string(),
        });
        error
    }
}

/// Clamps progress values to a high-water mark before forwarding.
///
/// The search phases interleave (a country destination drills down while
/// later destinations are still being resolved), so raw checkpoint
/// values can step backwards; downstream consumers are guaranteed a
/// non-decreasing sequence instead.
struct MonotonicSink<'a> {
    inner: &'a dyn EventSink,
    floor: AtomicU32,
}

impl<'a> MonotonicSink<'a> {
    fn new(inner: &'a dyn EventSink) -> Self {
        Self {
            inner,
            floor: AtomicU32::new(0),
        }
    }
}

impl EventSink for MonotonicSink<'_> {
    fn emit(&self, event: SearchEvent) {
        let event = match event {
            SearchEvent::Progress {
                message,
                current,
                total,
            } => {
                let previous = self.floor.fetch_max(current, Ordering::SeqCst);
                SearchEvent::Progress {
                    message,
                    current: current.max(previous),
                    total,
                }
            }
            other => other,
        };
        self.inner.emit(event);
    }
}

fn join_codes<'a>(codes: impl Iterator<Item = &'a str>) -> String {
    codes.collect::<Vec<_>>().join(", ")
}

fn progress(sink: &dyn EventSink, current: u32, message: String) {
    sink.emit(SearchEvent::Progress {
        message,
        current,
        total: 100,
    });
}
