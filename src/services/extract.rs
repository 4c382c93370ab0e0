//! Positional-to-semantic record mapping.
//!
//! Both sources end up here: PDF text arrives as a flat token stream that is
//! cut into fixed-width windows, HTML arrives as table rows of eight cells.

use crate::models::{Gender, PageContext, ResultRecord};
use crate::services::normalize::normalize;

/// Slots per PDF record: eight data fields, then the position, which is the
/// first slot of the following window.
pub const PDF_RECORD_WIDTH: usize = 9;

/// Cells in an HTML result row.
pub const HTML_ROW_CELLS: usize = 8;

/// A PDF text item in both orientations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    /// As stored in the document
    pub raw: String,
    /// After directional normalization
    pub display: String,
}

impl TextItem {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let display = normalize(&raw);
        Self { raw, display }
    }
}

/// Event attributes shared by every row under one header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    pub event: String,
    pub pool_length: Option<String>,
    pub gender: Option<Gender>,
}

/// Map a data stream that starts at the data-start sentinel into records.
///
/// Window `i` covers `items[9i..9i+9]`; slots 1 to 8 hold score, time,
/// club, birth year, first name, last name, lane and heat, and the position
/// is read from `items[9i+9]`. A window without that trailing slot is
/// dropped.
pub fn records_from_stream(
    items: &[TextItem],
    event: &EventContext,
    page: &PageContext,
) -> Vec<ResultRecord> {
    let mut records = Vec::new();
    let mut start = 0;
    while start + PDF_RECORD_WIDTH < items.len() {
        let slot = |offset: usize| items[start + offset].display.clone();
        let birth_year = slot(4);

        records.push(ResultRecord {
            score: slot(1),
            time: items[start + 2].raw.clone(),
            club: slot(3),
            age: derive_age(page.competition_year, &birth_year),
            birth_year,
            first_name: slot(5),
            last_name: slot(6),
            lane: slot(7),
            heat: slot(8),
            position: slot(9),
            ..base_record(event, page)
        });
        start += PDF_RECORD_WIDTH;
    }
    records
}

/// Map one result-table row into a record.
///
/// Cells are, left to right: position, full name, birth year, club, heat,
/// lane, time, score. Rows with any other cell count are headers or
/// footnotes and yield nothing.
pub fn record_from_row(
    cells: &[String],
    event: &EventContext,
    page: &PageContext,
) -> Option<ResultRecord> {
    if cells.len() != HTML_ROW_CELLS {
        return None;
    }

    let full_name = normalize(&cells[1]);
    let (last_name, first_name) = split_full_name(&full_name);
    let birth_year = cells[2].clone();

    Some(ResultRecord {
        position: cells[0].clone(),
        first_name,
        last_name,
        age: derive_age(page.competition_year, &birth_year),
        birth_year,
        club: normalize(&cells[3]),
        heat: cells[4].clone(),
        lane: cells[5].clone(),
        time: cells[6].clone(),
        score: cells[7].clone(),
        ..base_record(event, page)
    })
}

/// Split a family-name-first display name into `(last, first)`.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut tokens = full_name.split_whitespace();
    let last = tokens.next().unwrap_or("").to_string();
    let first = tokens.collect::<Vec<_>>().join(" ");
    (last, first)
}

/// Competition year minus birth year, when both are known.
pub fn derive_age(competition_year: Option<i32>, birth_year: &str) -> Option<i32> {
    let birth: i32 = birth_year.trim().parse().ok()?;
    competition_year.map(|year| year - birth)
}

fn base_record(event: &EventContext, page: &PageContext) -> ResultRecord {
    ResultRecord {
        event: event.event.clone(),
        pool_length: event.pool_length.clone(),
        gender: event.gender,
        event_date: page.event_date.clone(),
        total_registrations: page.total_registrations.clone(),
        total_participants: page.total_participants.clone(),
        ..ResultRecord::default()
    }
}
