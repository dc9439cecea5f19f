use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::directory::LocationDirectory;
use super::domain::{FetchOutcome, LocationId};
use super::eligibility::EligibilityRules;
use super::notifier::{NotificationMessage, Notifier};
use super::policy::{NotificationMode, NotificationPayload, NotificationPolicy};
use super::source::SlotSource;
use super::tracker::AppointmentTracker;

/// Everything the watcher needs to know about what to poll and when to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPlan {
    pub locations: Vec<LocationId>,
    pub rules: EligibilityRules,
    pub mode: NotificationMode,
    pub poll_interval: Duration,
}

/// How the fetch for a location ended this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Slots,
    NoOpenings,
    Failed,
}

/// Whether a notification went out for a location this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    NotRequired,
    Sent,
    Failed { reason: String },
}

/// Outcome of polling a single location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationReport {
    pub location: LocationId,
    pub fetch: FetchStatus,
    pub qualifying: Vec<String>,
    pub appeared: Vec<String>,
    pub vanished: Vec<String>,
    pub notification: Option<NotificationPayload>,
    pub delivery: DeliveryStatus,
}

/// Summary returned once the polling loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub stop: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CutoffReached,
    Cancelled,
}

/// Polls every configured location, tracks qualifying slots and dispatches
/// notifications according to the configured mode.
pub struct AppointmentWatcher<S, N> {
    plan: WatchPlan,
    source: Arc<S>,
    notifier: Arc<N>,
    directory: Arc<LocationDirectory>,
    tracker: AppointmentTracker,
    policy: NotificationPolicy,
}

impl<S, N> AppointmentWatcher<S, N>
where
    S: SlotSource + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        plan: WatchPlan,
        source: Arc<S>,
        notifier: Arc<N>,
        directory: Arc<LocationDirectory>,
    ) -> Self {
        let tracker = AppointmentTracker::new(&plan.locations);
        let policy = NotificationPolicy::new(plan.mode);

        Self {
            plan,
            source,
            notifier,
            directory,
            tracker,
            policy,
        }
    }

    pub fn plan(&self) -> &WatchPlan {
        &self.plan
    }

    pub fn tracker(&self) -> &AppointmentTracker {
        &self.tracker
    }

    /// True once `now` falls on or after the cutoff date.
    pub fn cutoff_reached(&self, now: NaiveDateTime) -> bool {
        now.date() >= self.plan.rules.cutoff_date
    }

    /// Polls every location once. Failures stay local to their location.
    pub async fn poll_cycle(&mut self) -> Vec<LocationReport> {
        let locations = self.plan.locations.clone();
        let mut reports = Vec::with_capacity(locations.len());
        for location in &locations {
            reports.push(self.poll_location(location).await);
        }
        reports
    }

    pub async fn poll_location(&mut self, location: &LocationId) -> LocationReport {
        let location_name = self.directory.display_name(location);

        let (fetch, fresh) = match self.source.fetch(location).await {
            Ok(FetchOutcome::Slots(slots)) => {
                let fresh: Vec<String> = slots
                    .iter()
                    .filter(|slot| slot.active && self.plan.rules.qualifies(slot.start))
                    .map(|slot| slot.display())
                    .collect();
                debug!(
                    location = %location,
                    published = slots.len(),
                    qualifying = fresh.len(),
                    "filtered published slots"
                );
                (FetchStatus::Slots, fresh)
            }
            Ok(FetchOutcome::Empty) => {
                debug!(location = %location, "no appointments available at {}", location_name);
                (FetchStatus::NoOpenings, Vec::new())
            }
            Err(err) => {
                warn!(
                    location = %location,
                    error = %err,
                    "failed to obtain openings for {}",
                    location_name
                );
                (FetchStatus::Failed, Vec::new())
            }
        };

        let delta = self.tracker.update(location, fresh);
        let notification = self
            .policy
            .decide(location, &delta.current, &delta.appeared);

        let delivery = match &notification {
            Some(payload) => self.deliver(payload).await,
            None => DeliveryStatus::NotRequired,
        };

        LocationReport {
            location: location.clone(),
            fetch,
            qualifying: delta.current,
            appeared: delta.appeared,
            vanished: delta.vanished,
            notification,
            delivery,
        }
    }

    async fn deliver(&self, payload: &NotificationPayload) -> DeliveryStatus {
        let message = NotificationMessage::render(payload, &self.directory);
        info!(location = %payload.location, "{}", message.body);

        match self.notifier.send(&message).await {
            Ok(()) => DeliveryStatus::Sent,
            Err(err) => {
                warn!(location = %payload.location, error = %err, "error occurred when sending notification");
                DeliveryStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Runs poll cycles until the cutoff date arrives or `stop` flips to `true`.
    ///
    /// Dropping the sender half of `stop` also ends the loop.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> RunSummary {
        let mut cycles = 0;

        info!(
            locations = self.plan.locations.len(),
            interval = ?self.plan.poll_interval,
            cutoff = %self.plan.rules.cutoff_date,
            mode = self.plan.mode.label(),
            "appointment watcher started"
        );

        loop {
            if *stop.borrow_and_update() {
                return self.finish(cycles, StopReason::Cancelled);
            }
            if self.cutoff_reached(Local::now().naive_local()) {
                return self.finish(cycles, StopReason::CutoffReached);
            }

            let reports = self.poll_cycle().await;
            cycles += 1;
            debug!(
                cycle = cycles,
                notified = reports
                    .iter()
                    .filter(|report| report.notification.is_some())
                    .count(),
                "poll cycle complete"
            );

            let sender_gone = tokio::select! {
                _ = tokio::time::sleep(self.plan.poll_interval) => false,
                changed = stop.changed() => changed.is_err(),
            };
            if sender_gone {
                return self.finish(cycles, StopReason::Cancelled);
            }
        }
    }

    fn finish(&self, cycles: u64, stop: StopReason) -> RunSummary {
        info!(cycles, reason = ?stop, "appointment watcher stopped");
        RunSummary { cycles, stop }
    }
}
