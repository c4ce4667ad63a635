use serde::{Deserialize, Serialize};

/// An intermediate landing between two flight segments of one itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stopover {
    pub city: String,
    pub code: String,
    /// Arrival at the stopover, "HH:MM" local, empty when unknown.
    pub arrival: String,
    /// Departure from the stopover, "HH:MM" local, empty when unknown.
    pub departure: String,
    /// Wait duration, "Xh YYmin", empty when unknown or non-positive.
    pub wait: String,
}

/// One filtered, normalized itinerary, the unit of search output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub city: String,
    pub country: String,
    pub destination_code: String,
    pub origin_code: String,
    /// Price in the currency implied by the search configuration.
    pub price: f64,
    /// Departure time, "HH:MM" local.
    pub departure: String,
    /// Arrival time, "HH:MM" local.
    pub arrival: String,
    pub duration_minutes: u32,
    /// Human-readable duration, "Xh YYmin".
    pub duration: String,
    pub stop_count: u32,
    pub stopovers: Vec<Stopover>,
    pub carrier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_logo: Option<String>,
}

/// Formats a minute count as "Xh YYmin".
pub fn format_duration(minutes: u32) -> String {
    format!("{}h {:02}min", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0h 00min");
        assert_eq!(format_duration(65), "1h 05min");
        assert_eq!(format_duration(150), "2h 30min");
    }
}
