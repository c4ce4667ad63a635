use serde::{Deserialize, Serialize};

/// Inclusive minute-of-day window, 0 ..= 1439.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub min_minute: u32,
    pub max_minute: u32,
}

impl TimeWindow {
    /// Window covering whole hours: `from_hours(18, 23)` accepts 18:00
    /// through 23:59.
    pub fn from_hours(min_hour: u32, max_hour: u32) -> Self {
        Self {
            min_minute: min_hour * 60,
            max_minute: max_hour * 60 + 59,
        }
    }

    pub fn contains(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.min_minute && minute_of_day <= self.max_minute
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            min_minute: 0,
            max_minute: 23 * 60 + 59,
        }
    }
}

/// Filter set applied to every itinerary item of one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Price ceiling, in the currency implied by the search configuration.
    pub max_price: f64,
    /// Departure-time window.
    pub departure: TimeWindow,
    /// Optional arrival-time window.
    pub arrival: Option<TimeWindow>,
    /// Reject itineraries with any stopover.
    pub direct_only: bool,
    /// Reject itineraries arriving on a different calendar day.
    pub same_day: bool,
}

impl SearchFilters {
    pub fn with_max_price(max_price: f64) -> Self {
        Self {
            max_price,
            departure: TimeWindow::default(),
            arrival: None,
            direct_only: false,
            same_day: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = TimeWindow::from_hours(18, 23);
        assert!(!window.contains(17 * 60 + 59));
        assert!(window.contains(18 * 60));
        assert!(window.contains(23 * 60 + 59));
    }

    #[test]
    fn test_default_window_accepts_any_minute() {
        let window = TimeWindow::default();
        assert!(window.contains(0));
        assert!(window.contains(1439));
    }
}
