//! Merging a new result set into a persisted one.

use crate::error::{AppError, Result};
use crate::models::ResultSet;

/// Combine `existing` with `incoming`.
///
/// Flat sets are concatenated with `existing` first. Grouped sets are
/// key-unioned: a key present in both takes the incoming group whole, and
/// the existing group for that key is discarded. Mixing a flat set with a
/// grouped one is rejected.
pub fn merge(existing: ResultSet, incoming: ResultSet) -> Result<ResultSet> {
    match (existing, incoming) {
        (ResultSet::Flat(mut existing), ResultSet::Flat(incoming)) => {
            existing.extend(incoming);
            Ok(ResultSet::Flat(existing))
        }
        (ResultSet::Grouped(mut existing), ResultSet::Grouped(incoming)) => {
            for (key, records) in incoming {
                if existing.insert(key.clone(), records).is_some() {
                    log::warn!("Group '{}' replaced by incoming records", key);
                }
            }
            Ok(ResultSet::Grouped(existing))
        }
        (ResultSet::Flat(_), ResultSet::Grouped(_)) => Err(AppError::validation(
            "cannot merge grouped records into a flat list",
        )),
        (ResultSet::Grouped(_), ResultSet::Flat(_)) => Err(AppError::validation(
            "cannot merge a flat list into grouped records",
        )),
    }
}
