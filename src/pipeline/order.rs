//! Result ordering.

use crate::models::ResultRecord;
use crate::services::normalize::is_time;

/// Sort by race time, fastest first.
///
/// Records without a `MM:SS.ss` time (DQ, DNS and the like) follow the timed
/// ones in their input order. The sort is stable.
pub fn sort_by_time(records: &mut [ResultRecord]) {
    // The fixed-width format orders correctly as text.
    records.sort_by(|a, b| time_key(a).cmp(&time_key(b)));
}

fn time_key(record: &ResultRecord) -> (bool, &str) {
    if is_time(&record.time) {
        (false, record.time.as_str())
    } else {
        (true, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time: &str, last_name: &str) -> ResultRecord {
        ResultRecord {
            time: time.to_string(),
            last_name: last_name.to_string(),
            ..ResultRecord::default()
        }
    }

    #[test]
    fn test_sort_by_time() {
        let mut records = vec![
            record("00:35.10", "a"),
            record("DQ", "b"),
            record("00:31.45", "c"),
            record("01:02.00", "d"),
            record("", "e"),
            record("00:35.10", "f"),
        ];
        sort_by_time(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.last_name.as_str()).collect();
        assert_eq!(order, ["c", "a", "f", "d", "b", "e"]);
    }
}
