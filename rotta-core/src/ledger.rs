use std::collections::HashMap;

use crate::flight::FlightRecord;

/// Cross-search dedup key.
///
/// Carrier-inclusive variant: two different carriers at an identical
/// price and time stay distinct, while two prices for the same
/// carrier/time collide and the cheaper one wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlightKey {
    pub origin_code: String,
    pub destination_code: String,
    pub departure: String,
    pub carrier: String,
}

impl FlightKey {
    pub fn of(record: &FlightRecord) -> Self {
        Self {
            origin_code: record.origin_code.clone(),
            destination_code: record.destination_code.clone(),
            departure: record.departure.clone(),
            carrier: record.carrier.clone(),
        }
    }
}

/// Tracks every flight key seen over the lifetime of one search and the
/// slot it occupies in the aggregate list.
///
/// The intra-response itinerary-id layer is a separate concern and lives
/// in the record builder; this ledger only enforces the cross-search key.
#[derive(Debug, Default)]
pub struct FlightLedger {
    slots: HashMap<FlightKey, usize>,
}

impl FlightLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` into `flights`, or merges it into an existing
    /// slot when its key was already seen.
    ///
    /// On collision the cheaper record survives, replacing the previous
    /// entry in place so the order of already-emitted partial results is
    /// preserved. Returns the surviving record's slot when the aggregate
    /// changed, `None` when the duplicate lost the price comparison.
    pub fn insert_or_merge(
        &mut self,
        flights: &mut Vec<FlightRecord>,
        record: FlightRecord,
    ) -> Option<usize> {
        let key = FlightKey::of(&record);
        match self.slots.get(&key) {
            Some(&slot) => {
                if record.price < flights[slot].price {
                    flights[slot] = record;
                    Some(slot)
                } else {
                    None
                }
            }
            None => {
                let slot = flights.len();
                self.slots.insert(key, slot);
                flights.push(record);
                Some(slot)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
