use std::sync::Mutex;

use serde::Serialize;

use crate::flight::FlightRecord;
use crate::orchestrator::SearchStats;

/// Typed event stream of one search.
///
/// The sequence is ordered, progress values never decrease, and exactly
/// one terminal event (`Complete` or `Error`) closes the stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    Progress {
        message: String,
        current: u32,
        total: u32,
    },
    /// Emitted whenever a query pair yields new or improved records.
    Results {
        flights: Vec<FlightRecord>,
        running_count: usize,
    },
    Complete {
        flights: Vec<FlightRecord>,
        stats: SearchStats,
        count: usize,
        search_everywhere: bool,
    },
    Error {
        message: String,
    },
}

impl SearchEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SearchEvent::Progress { .. } => "progress",
            SearchEvent::Results { .. } => "results",
            SearchEvent::Complete { .. } => "complete",
            SearchEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchEvent::Complete { .. } | SearchEvent::Error { .. })
    }
}

/// Destination for the orchestrator's event stream.
///
/// Interactive callers bridge this to a channel; the synchronous path
/// uses [`NullSink`] and only reads the returned aggregate.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SearchEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: SearchEvent) {}
}

/// Sink that buffers events in memory, for batch callers and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<SearchEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SearchEvent> {
        self.events.lock().expect("event buffer poisoned").clone()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: SearchEvent) {
        self.events.lock().expect("event buffer poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = SearchEvent::Progress {
            message: "Scanning".into(),
            current: 10,
            total: 100,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["current"], 10);
        assert_eq!(event.name(), "progress");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        sink.emit(SearchEvent::Progress {
            message: "a".into(),
            current: 1,
            total: 100,
        });
        sink.emit(SearchEvent::Error { message: "b".into() });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }
}
