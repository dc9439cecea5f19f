use serde::{Deserialize, Serialize};

use super::domain::LocationId;

/// Controls how often qualifying slots are announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationMode {
    /// Announce every qualifying slot on every poll while any exist.
    Spam,
    /// Announce only slots that were not present on the previous poll.
    NewOnly,
}

impl NotificationMode {
    /// Translates the `no_spamming` configuration switch.
    pub fn from_no_spamming(no_spamming: bool) -> Self {
        if no_spamming {
            Self::NewOnly
        } else {
            Self::Spam
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationMode::Spam => "every poll",
            NotificationMode::NewOnly => "new slots only",
        }
    }
}

/// Which slots a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadScope {
    AllCurrent,
    NewlyAppeared,
}

/// Slots to announce for a single location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub location: LocationId,
    pub scope: PayloadScope,
    pub slots: Vec<String>,
}

/// Decides whether a poll result warrants a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPolicy {
    mode: NotificationMode,
}

impl NotificationPolicy {
    pub fn new(mode: NotificationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> NotificationMode {
        self.mode
    }

    /// Spam mode is checked first; vanished-only changes never notify.
    pub fn decide(
        &self,
        location: &LocationId,
        current: &[String],
        appeared: &[String],
    ) -> Option<NotificationPayload> {
        if !current.is_empty() && self.mode == NotificationMode::Spam {
            return Some(NotificationPayload {
                location: location.clone(),
                scope: PayloadScope::AllCurrent,
                slots: current.to_vec(),
            });
        }

        if !appeared.is_empty() {
            return Some(NotificationPayload {
                location: location.clone(),
                scope: PayloadScope::NewlyAppeared,
                slots: appeared.to_vec(),
            });
        }

        None
    }
}
