use serde::{Deserialize, Serialize};

/// Kind of entity returned by the place auto-complete endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Airport,
    City,
    Country,
    Unknown,
}

impl EntityKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "AIRPORT" => EntityKind::Airport,
            "CITY" => EntityKind::City,
            "COUNTRY" => EntityKind::Country,
            _ => EntityKind::Unknown,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            EntityKind::Airport => "AIRPORT",
            EntityKind::City => "CITY",
            EntityKind::Country => "COUNTRY",
            EntityKind::Unknown => "",
        }
    }
}

/// An airport, city or country as known to the flight-search backend.
///
/// Resolved once per code via the auto-complete lookup and treated as
/// read-only afterwards. `code` is the de-facto unique key used in
/// search requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub title: String,
    pub entity_id: String,
    pub code: String,
    pub kind: EntityKind,
    pub subtitle: String,
}

impl Place {
    pub fn is_country(&self) -> bool {
        self.kind == EntityKind::Country
    }
}

/// Destination of a flight query: a concrete place, or the open-ended
/// "anywhere" marker used by the world scan.
#[derive(Debug, Clone)]
pub enum Destination {
    Place(Place),
    Everywhere,
}
