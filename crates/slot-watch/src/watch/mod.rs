//! Appointment slot watching: eligibility rules, per-location tracking of
//! qualifying slots, the notification policy and the polling service that
//! wires them to a slot source and a notifier.

pub mod directory;
pub mod domain;
pub mod eligibility;
pub mod notifier;
pub mod policy;
pub mod service;
pub mod source;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use directory::{DirectoryError, LocationDirectory};
pub use domain::{format_slot, FetchOutcome, LocationId, RawSlot};
pub use eligibility::{weekday_from_index, EligibilityRules};
pub use notifier::{
    DeliveryChannel, EmailNotifier, EmailSettings, LogNotifier, NotificationMessage, Notifier,
    NotifyError,
};
pub use policy::{NotificationMode, NotificationPayload, NotificationPolicy, PayloadScope};
pub use service::{
    AppointmentWatcher, DeliveryStatus, FetchStatus, LocationReport, RunSummary, StopReason,
    WatchPlan,
};
pub use source::{parse_slots, FetchError, SchedulerApiSource, SlotSource, SourceConfig};
pub use tracker::{AppointmentTracker, SlotDelta};
