use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Weekday};

use crate::watch::directory::LocationDirectory;
use crate::watch::domain::{FetchOutcome, LocationId, RawSlot};
use crate::watch::eligibility::EligibilityRules;
use crate::watch::notifier::{NotificationMessage, Notifier, NotifyError};
use crate::watch::policy::NotificationMode;
use crate::watch::service::{AppointmentWatcher, WatchPlan};
use crate::watch::source::{FetchError, SlotSource};

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

pub(super) fn slot(start: NaiveDateTime, active: bool) -> RawSlot {
    RawSlot { start, active }
}

/// Weekday mornings are off limits and weekends are excluded entirely.
pub(super) fn rules(cutoff: NaiveDate) -> EligibilityRules {
    EligibilityRules::new(cutoff, 8, [Weekday::Sat, Weekday::Sun])
}

pub(super) fn far_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 12, 31).expect("valid date")
}

pub(super) fn jfk() -> LocationId {
    LocationId::from(5140)
}

pub(super) fn sfo() -> LocationId {
    LocationId::from(5446)
}

pub(super) fn directory() -> LocationDirectory {
    let mut directory = LocationDirectory::default();
    directory.insert(jfk(), "JFK International Global Entry EC");
    directory.insert(sfo(), "San Francisco Global Entry Enrollment Center");
    directory
}

pub(super) fn plan(mode: NotificationMode) -> WatchPlan {
    WatchPlan {
        locations: vec![jfk(), sfo()],
        rules: rules(far_cutoff()),
        mode,
        poll_interval: Duration::from_millis(5),
    }
}

pub(super) fn watcher(
    plan: WatchPlan,
    source: &Arc<MemorySource>,
    notifier: &Arc<MemoryNotifier>,
) -> AppointmentWatcher<MemorySource, MemoryNotifier> {
    AppointmentWatcher::new(
        plan,
        source.clone(),
        notifier.clone(),
        Arc::new(directory()),
    )
}

/// Monday 2026-01-05 09:15, a qualifying weekday morning slot.
pub(super) fn monday_slot() -> RawSlot {
    slot(at(2026, 1, 5, 9, 15), true)
}

/// Tuesday 2026-01-06 10:00.
pub(super) fn tuesday_slot() -> RawSlot {
    slot(at(2026, 1, 6, 10, 0), true)
}

pub(super) const MONDAY: &str = "Monday, January 05 @ 09:15AM";
pub(super) const TUESDAY: &str = "Tuesday, January 06 @ 10:00AM";

/// Scripted slot source: each location replays queued responses, then reports no openings.
#[derive(Default)]
pub(super) struct MemorySource {
    responses: Mutex<HashMap<LocationId, VecDeque<Result<FetchOutcome, FetchError>>>>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub(super) fn push(&self, location: &LocationId, response: Result<FetchOutcome, FetchError>) {
        self.responses
            .lock()
            .expect("source mutex poisoned")
            .entry(location.clone())
            .or_default()
            .push_back(response);
    }

    pub(super) fn push_slots(&self, location: &LocationId, slots: Vec<RawSlot>) {
        self.push(location, Ok(FetchOutcome::Slots(slots)));
    }

    pub(super) fn push_failure(&self, location: &LocationId) {
        self.push(location, Err(FetchError::UnexpectedShape("object")));
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SlotSource for MemorySource {
    async fn fetch(&self, location: &LocationId) -> Result<FetchOutcome, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.responses.lock().expect("source mutex poisoned");
        guard
            .get_mut(location)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(FetchOutcome::Empty))
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    messages: Mutex<Vec<NotificationMessage>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub(super) fn messages(&self) -> Vec<NotificationMessage> {
        self.messages.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Notifier for MemoryNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Interrupted("smtp relay unreachable".to_string()));
        }
        self.messages
            .lock()
            .expect("notifier mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}
