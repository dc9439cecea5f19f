use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// Acceptability rules a slot must satisfy before it is worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityRules {
    /// Slots on or after this date are too late.
    pub cutoff_date: NaiveDate,
    /// Slots starting at or before this hour of the day are rejected.
    pub excluded_through_hour: u32,
    pub excluded_weekdays: HashSet<Weekday>,
}

impl EligibilityRules {
    pub fn new(
        cutoff_date: NaiveDate,
        excluded_through_hour: u32,
        excluded_weekdays: impl IntoIterator<Item = Weekday>,
    ) -> Self {
        Self {
            cutoff_date,
            excluded_through_hour,
            excluded_weekdays: excluded_weekdays.into_iter().collect(),
        }
    }

    pub fn qualifies(&self, start: NaiveDateTime) -> bool {
        if start.date() >= self.cutoff_date {
            return false;
        }

        if start.hour() <= self.excluded_through_hour {
            return false;
        }

        !self.excluded_weekdays.contains(&start.weekday())
    }
}

/// Maps a Monday-based weekday index (Monday = 0, Sunday = 6) to a [`Weekday`].
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}
