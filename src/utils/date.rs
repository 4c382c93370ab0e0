// src/utils/date.rs

//! Meet date parsing and season arithmetic.

use chrono::{Datelike, NaiveDate};

/// Parse a meet date in `DD/MM/YYYY` or ISO `YYYY-MM-DD` form.
///
/// Anything after the first whitespace (a start time, usually) is ignored.
pub fn parse_meet_date(text: &str) -> Option<NaiveDate> {
    let token = text.split_whitespace().next()?;
    NaiveDate::parse_from_str(token, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(token, "%Y-%m-%d"))
        .ok()
}

/// Competition year of a meet: seasons run from `start_month` to the
/// following summer and are named after the year they end in.
pub fn season_year(date: NaiveDate, start_month: u32) -> i32 {
    if date.month() >= start_month {
        date.year() + 1
    } else {
        date.year()
    }
}
