//! Destination expansion: world scan → countries → cities.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::backend::FlightSearchBackend;
use crate::events::{EventSink, SearchEvent};
use crate::place::{Destination, EntityKind, Place};
use crate::wire::{GeoNode, QuoteResults};

/// A country or city discovered during expansion. Intermediate only:
/// discarded once the city set is finalized, never part of the output.
#[derive(Debug, Clone)]
pub struct CandidateDestination {
    pub name: String,
    pub code: String,
    /// Cheapest listed price, when the discovery path provides one.
    pub price: Option<f64>,
    /// Parent country display name (cities only).
    pub country: Option<String>,
}

/// Result of a full everywhere expansion.
#[derive(Debug)]
pub struct ExpandedDestinations {
    pub cities: Vec<CandidateDestination>,
    pub countries_considered: u32,
}

/// Discovers qualifying countries, then qualifying cities within each,
/// pruning by the price ceiling at both stages.
pub struct DestinationExpander<'a> {
    backend: &'a dyn FlightSearchBackend,
}

impl<'a> DestinationExpander<'a> {
    pub fn new(backend: &'a dyn FlightSearchBackend) -> Self {
        Self { backend }
    }

    /// Everywhere expansion for one or more origins.
    ///
    /// Stage A scans the world once per origin; the first occurrence of
    /// a country code wins, later origins never overwrite it. Stage B
    /// drills each country down to cities using only the first origin;
    /// city discovery is not repeated per origin, only the flight search
    /// that follows is. A failing country contributes zero cities.
    pub async fn expand(
        &self,
        origins: &[Place],
        date: NaiveDate,
        max_price: f64,
        sink: &dyn EventSink,
    ) -> ExpandedDestinations {
        let mut seen_countries = HashSet::new();
        let mut countries = Vec::new();

        for origin in origins {
            progress(
                sink,
                10,
                format!("Scanning destinations everywhere from {}", origin.code),
            );
            match self
                .backend
                .search_flights(origin, &Destination::Everywhere, date)
                .await
            {
                Ok(response) => collect_quotes(
                    &response.everywhere_destination,
                    max_price,
                    None,
                    &mut seen_countries,
                    &mut countries,
                ),
                Err(error) => {
                    warn!(origin = %origin.code, %error, "world scan failed, skipping origin");
                }
            }
        }

        progress(
            sink,
            15,
            format!("Found {} countries under budget", countries.len()),
        );

        let mut seen_cities = HashSet::new();
        let mut cities = Vec::new();

        if let Some(first_origin) = origins.first() {
            for (index, country) in countries.iter().enumerate() {
                progress(
                    sink,
                    15 + (index as u32 * 25 / countries.len().max(1) as u32),
                    format!("Searching cities in {}", country.name),
                );
                if let Err(error) = self
                    .drill_down(
                        first_origin,
                        country,
                        date,
                        max_price,
                        &mut seen_cities,
                        &mut cities,
                    )
                    .await
                {
                    debug!(country = %country.code, %error, "country drill-down failed");
                }
            }
        }

        progress(sink, 40, format!("Found {} cities under budget", cities.len()));

        ExpandedDestinations {
            cities,
            countries_considered: countries.len() as u32,
        }
    }

    /// Stage B for one country: resolve it to a place entity (exact code
    /// match preferred, else the first lookup result) and collect the
    /// cities the quote listing reports under it.
    async fn drill_down(
        &self,
        origin: &Place,
        country: &CandidateDestination,
        date: NaiveDate,
        max_price: f64,
        seen: &mut HashSet<String>,
        cities: &mut Vec<CandidateDestination>,
    ) -> Result<(), crate::backend::BackendError> {
        let matches = self.backend.search_places(&country.code).await?;
        let Some(entity) = pick_place(&matches, &country.code) else {
            return Ok(());
        };

        let response = self
            .backend
            .search_flights(origin, &Destination::Place(entity), date)
            .await?;
        collect_quotes(
            &response.country_destination,
            max_price,
            Some(&country.name),
            seen,
            cities,
        );
        Ok(())
    }

    /// City discovery for one explicitly requested country.
    ///
    /// Primary path is the quote drill-down; when that yields nothing
    /// the geography tree is walked, and as a last resort a plain text
    /// search filtered by subtitle is used.
    pub async fn cities_in_country(
        &self,
        origin: &Place,
        country: &Place,
        date: NaiveDate,
        max_price: f64,
    ) -> Vec<CandidateDestination> {
        let mut seen = HashSet::new();
        let mut cities = Vec::new();

        match self
            .backend
            .search_flights(origin, &Destination::Place(country.clone()), date)
            .await
        {
            Ok(response) => collect_quotes(
                &response.country_destination,
                max_price,
                Some(&country.title),
                &mut seen,
                &mut cities,
            ),
            Err(error) => {
                debug!(country = %country.code, %error, "country quote listing failed");
            }
        }
        if !cities.is_empty() {
            return cities;
        }

        match self.backend.geo_hierarchy().await {
            Ok(root) => {
                for place in collect_country_places(&root, &country.code) {
                    if seen.insert(place.code.clone()) {
                        cities.push(CandidateDestination {
                            name: place.title,
                            code: place.code,
                            price: None,
                            country: Some(country.title.clone()),
                        });
                    }
                }
            }
            Err(error) => {
                debug!(country = %country.code, %error, "geo hierarchy unavailable");
            }
        }
        if !cities.is_empty() {
            return cities;
        }

        for place in self.text_search_cities(country).await {
            if seen.insert(place.code.clone()) {
                cities.push(CandidateDestination {
                    name: place.title,
                    code: place.code,
                    price: None,
                    country: Some(country.title.clone()),
                });
            }
        }
        cities
    }

    async fn text_search_cities(&self, country: &Place) -> Vec<Place> {
        let mut places = self
            .backend
            .search_places(&country.title)
            .await
            .unwrap_or_default();
        if places.is_empty() {
            places = self
                .backend
                .search_places(&country.code)
                .await
                .unwrap_or_default();
        }

        let needle = country.title.to_lowercase();
        places
            .into_iter()
            .filter(|place| matches!(place.kind, EntityKind::City | EntityKind::Airport))
            .filter(|place| place.subtitle.to_lowercase().contains(&needle))
            .collect()
    }
}

/// Collects qualifying quote entries: both a name and a code present,
/// cheapest price listed and within the ceiling. First occurrence of a
/// code wins. Anything else is silently excluded.
fn collect_quotes(
    quotes: &QuoteResults,
    max_price: f64,
    country: Option<&str>,
    seen: &mut HashSet<String>,
    out: &mut Vec<CandidateDestination>,
) {
    for result in &quotes.results {
        let location = &result.content.location;
        let price = result
            .content
            .flight_quotes
            .cheapest
            .as_ref()
            .and_then(|cheapest| cheapest.raw_price);
        let (Some(name), Some(code), Some(price)) =
            (location.name.as_ref(), location.sky_code.as_ref(), price)
        else {
            continue;
        };
        if price <= 0.0 || price > max_price {
            continue;
        }
        if seen.insert(code.clone()) {
            out.push(CandidateDestination {
                name: name.clone(),
                code: code.clone(),
                price: Some(price),
                country: country.map(str::to_string),
            });
        }
    }
}

/// Walks the geography tree collecting city/airport nodes that belong to
/// `country_code`, either through a country-type ancestor or through an
/// explicit country reference on the node itself.
pub fn collect_country_places(root: &GeoNode, country_code: &str) -> Vec<Place> {
    fn walk(node: &GeoNode, country_code: &str, inside_country: bool, out: &mut Vec<Place>) {
        let kind = EntityKind::from_wire(&node.kind);
        let inside = inside_country
            || (kind == EntityKind::Country && node.sky_code.as_deref() == Some(country_code));
        let references_country = node.country_code.as_deref() == Some(country_code);

        if matches!(kind, EntityKind::City | EntityKind::Airport)
            && (inside_country || references_country)
        {
            if let Some(code) = &node.sky_code {
                out.push(Place {
                    title: node.name.clone(),
                    entity_id: node.entity_id.clone(),
                    code: code.clone(),
                    kind,
                    subtitle: String::new(),
                });
            }
        }
        for child in &node.children {
            walk(child, country_code, inside, out);
        }
    }

    let mut out = Vec::new();
    walk(root, country_code, false, &mut out);
    out
}

/// Prefer an exact code match among lookup results, fall back to the
/// first result.
fn pick_place(matches: &[Place], code: &str) -> Option<Place> {
    matches
        .iter()
        .find(|place| place.code == code)
        .or_else(|| matches.first())
        .cloned()
}

fn progress(sink: &dyn EventSink, current: u32, message: String) {
    sink.emit(SearchEvent::Progress {
        message,
        current,
        total: 100,
    });
}
