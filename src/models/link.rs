//! Listing descriptors and per-page source metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::date::{parse_meet_date, season_year};

/// A result page discovered on a meet-listing calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescriptor {
    /// Absolute URL of the result page
    pub link: String,

    /// Meet date as printed in the calendar row
    pub event_date: String,

    pub total_registrations: String,

    pub total_participants: String,
}

impl fmt::Display for LinkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.link, self.event_date)
    }
}

/// Metadata that belongs to a whole page rather than an individual row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub event_date: Option<String>,
    pub total_registrations: Option<String>,
    pub total_participants: Option<String>,

    /// Season year used to derive competitor ages
    pub competition_year: Option<i32>,

    /// Caller-supplied event name that bypasses header parsing
    pub event_override: Option<String>,
}

impl PageContext {
    /// Build the context for a listed result page.
    ///
    /// Only the leading date token of `event_date` is kept, and the
    /// competition year follows the season rule.
    pub fn from_link(link: &LinkDescriptor, season_start_month: u32) -> Self {
        let date_token = link
            .event_date
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();
        let competition_year =
            parse_meet_date(&date_token).map(|date| season_year(date, season_start_month));

        Self {
            event_date: Some(date_token).filter(|d| !d.is_empty()),
            total_registrations: Some(link.total_registrations.clone()),
            total_participants: Some(link.total_participants.clone()),
            competition_year,
            event_override: None,
        }
    }

    pub fn with_event_override(mut self, event: Option<String>) -> Self {
        self.event_override = event;
        self
    }
}
