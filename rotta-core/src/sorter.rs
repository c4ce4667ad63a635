use serde::{Deserialize, Serialize};

use crate::flight::FlightRecord;

/// Sort order for the final flight collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Price,
    Departure,
    Duration,
}

impl SortKey {
    /// Unknown keys fall back to price.
    pub fn parse(value: &str) -> Self {
        match value {
            "departure" => SortKey::Departure,
            "duration" => SortKey::Duration,
            _ => SortKey::Price,
        }
    }
}

/// Stable sort of the aggregate flight list.
///
/// Departure times compare lexicographically as "HH:MM" strings, which
/// matches chronological order within a day.
pub fn sort_flights(flights: &mut [FlightRecord], key: SortKey) {
    match key {
        SortKey::Price => flights.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::Departure => flights.sort_by(|a, b| a.departure.cmp(&b.departure)),
        SortKey::Duration => flights.sort_by_key(|f| f.duration_minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(price: f64, departure: &str, duration_minutes: u32) -> FlightRecord {
        FlightRecord {
            city: "London".into(),
            country: "United Kingdom".into(),
            destination_code: "LON".into(),
            origin_code: "VCE".into(),
            price,
            departure: departure.into(),
            arrival: "23:00".into(),
            duration_minutes,
            duration: crate::flight::format_duration(duration_minutes),
            stop_count: 0,
            stopovers: vec![],
            carrier: "Ryanair".into(),
            carrier_logo: None,
        }
    }

    #[test]
    fn test_sort_by_price_ascending() {
        let mut flights = vec![
            record(80.0, "10:00", 120),
            record(30.0, "11:00", 90),
            record(150.0, "12:00", 60),
        ];
        sort_flights(&mut flights, SortKey::Price);
        let prices: Vec<_> = flights.iter().map(|f| f.price).collect();
        assert_eq!(prices, vec![30.0, 80.0, 150.0]);
    }

    #[test]
    fn test_unknown_key_falls_back_to_price() {
        assert_eq!(SortKey::parse("banana"), SortKey::Price);
        assert_eq!(SortKey::parse(""), SortKey::Price);
        assert_eq!(SortKey::parse("departure"), SortKey::Departure);
        assert_eq!(SortKey::parse("duration"), SortKey::Duration);
    }

    #[test]
    fn test_sort_by_departure_is_lexicographic() {
        let mut flights = vec![
            record(10.0, "18:45", 120),
            record(20.0, "06:10", 90),
            record(30.0, "09:30", 60),
        ];
        sort_flights(&mut flights, SortKey::Departure);
        let times: Vec<_> = flights.iter().map(|f| f.departure.as_str()).collect();
        assert_eq!(times, vec!["06:10", "09:30", "18:45"]);
    }

    #[test]
    fn test_sort_by_duration() {
        let mut flights = vec![
            record(10.0, "18:45", 120),
            record(20.0, "06:10", 90),
        ];
        sort_flights(&mut flights, SortKey::Duration);
        assert_eq!(flights[0].duration_minutes, 90);
    }
}
