//! Duplicate removal.

use std::collections::HashSet;

use crate::models::ResultRecord;

/// Fields that identify a swim, borrowed from the record.
#[derive(Debug, PartialEq, Eq, Hash)]
struct IdentityKey<'a> {
    first_name: &'a str,
    last_name: &'a str,
    event: &'a str,
    event_date: Option<&'a str>,
    age: Option<i32>,
    total_registrations: Option<&'a str>,
    total_participants: Option<&'a str>,
    position: &'a str,
    heat: &'a str,
    lane: &'a str,
    birth_year: &'a str,
}

impl<'a> IdentityKey<'a> {
    fn of(r: &'a ResultRecord) -> Self {
        Self {
            first_name: &r.first_name,
            last_name: &r.last_name,
            event: &r.event,
            event_date: r.event_date.as_deref(),
            age: r.age,
            total_registrations: r.total_registrations.as_deref(),
            total_participants: r.total_participants.as_deref(),
            position: &r.position,
            heat: &r.heat,
            lane: &r.lane,
            birth_year: &r.birth_year,
        }
    }
}

/// Drop records whose identity key was already seen.
///
/// The first occurrence survives and input order is preserved.
pub fn dedupe(records: Vec<ResultRecord>) -> Vec<ResultRecord> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::new();
        records
            .iter()
            .map(|r| seen.insert(IdentityKey::of(r)))
            .collect()
    };

    let before = records.len();
    let deduped: Vec<ResultRecord> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect();

    if deduped.len() < before {
        log::info!("Removed {} duplicate records", before - deduped.len());
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first: &str, position: &str, score: &str) -> ResultRecord {
        ResultRecord {
            first_name: first.to_string(),
            last_name: "כהן".to_string(),
            event: "Freestyle 50".to_string(),
            event_date: Some("14/11/2024".to_string()),
            position: position.to_string(),
            score: score.to_string(),
            ..ResultRecord::default()
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let records = vec![
            record("נועה", "1", "500"),
            record("דניאל", "2", "480"),
            record("נועה", "1", "999"),
        ];
        let deduped = dedupe(records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].score, "500");
        assert_eq!(deduped[1].first_name, "דניאל");
    }

    #[test]
    fn test_fields_outside_key_do_not_distinguish() {
        let mut a = record("נועה", "1", "500");
        let mut b = a.clone();
        a.club = "מכבי".to_string();
        b.club = "הפועל".to_string();
        b.time = "00:40.00".to_string();
        assert_eq!(dedupe(vec![a, b]).len(), 1);
    }

    #[test]
    fn test_key_fields_distinguish() {
        let a = record("נועה", "1", "500");
        let mut b = a.clone();
        b.lane = "4".to_string();
        let mut c = a.clone();
        c.event_date = None;
        assert_eq!(dedupe(vec![a, b, c]).len(), 3);
    }
}
