//! Wire shapes specific to the hosted flight-search API.

use rotta_core::place::{EntityKind, Place};
use serde::Deserialize;

/// Standard `{ "data": ... }` envelope around every endpoint's payload.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// One entry of the place auto-complete endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SuggestItem {
    pub presentation: Presentation,
    pub navigation: Navigation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Presentation {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct Navigation {
    pub entity_id: String,
    pub entity_type: String,
    pub relevant_flight_params: FlightParams,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct FlightParams {
    pub sky_id: Option<String>,
}

impl SuggestItem {
    /// Entries without a searchable code are unusable and dropped.
    pub fn into_place(self) -> Option<Place> {
        let code = self.navigation.relevant_flight_params.sky_id?;
        Some(Place {
            title: self.presentation.title,
            entity_id: self.navigation.entity_id,
            code,
            kind: EntityKind::from_wire(&self.navigation.entity_type),
            subtitle: self.presentation.subtitle,
        })
    }
}
