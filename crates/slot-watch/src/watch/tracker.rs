use std::collections::{HashMap, HashSet};

use tracing::info;

use super::domain::LocationId;

/// Difference between a location's previous and fresh qualifying slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotDelta {
    /// Slots absent from the previous poll, in the order the fresh poll listed them.
    pub appeared: Vec<String>,
    /// Slots from the previous poll that are no longer offered.
    pub vanished: Vec<String>,
    /// The stored set after the update.
    pub current: Vec<String>,
}

impl SlotDelta {
    pub fn is_unchanged(&self) -> bool {
        self.appeared.is_empty() && self.vanished.is_empty()
    }
}

/// Remembers, per location, the qualifying slots seen on the most recent poll.
#[derive(Debug, Clone, Default)]
pub struct AppointmentTracker {
    known: HashMap<LocationId, Vec<String>>,
}

impl AppointmentTracker {
    /// Starts an empty set for every configured location.
    pub fn new<'a>(locations: impl IntoIterator<Item = &'a LocationId>) -> Self {
        let known = locations
            .into_iter()
            .map(|location| (location.clone(), Vec::new()))
            .collect();
        Self { known }
    }

    pub fn known(&self, location: &LocationId) -> &[String] {
        self.known
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Replaces the stored set for `location` with `fresh`, returning what changed.
    ///
    /// An empty `fresh` list is how failed or empty fetches are recorded: every
    /// previously known slot vanishes.
    pub fn update(&mut self, location: &LocationId, fresh: Vec<String>) -> SlotDelta {
        let mut seen = HashSet::with_capacity(fresh.len());
        let current: Vec<String> = fresh
            .into_iter()
            .filter(|slot| seen.insert(slot.clone()))
            .collect();

        let previous = self.known.entry(location.clone()).or_default();
        let previous_set: HashSet<&str> = previous.iter().map(String::as_str).collect();

        let appeared: Vec<String> = current
            .iter()
            .filter(|slot| !previous_set.contains(slot.as_str()))
            .cloned()
            .collect();
        let vanished: Vec<String> = previous
            .iter()
            .filter(|slot| !seen.contains(slot.as_str()))
            .cloned()
            .collect();

        for slot in &vanished {
            info!(location = %location, slot = %slot, "appointment no longer available");
        }

        *previous = current.clone();

        SlotDelta {
            appeared,
            vanished,
            current,
        }
    }
}
