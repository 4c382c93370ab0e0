//! Grouping by field value.

use crate::models::{Field, GroupedCollection, ResultRecord};

/// Partition `records` by the text of `field`.
///
/// Groups appear in the order their value is first seen, and records keep
/// their input order within a group.
pub fn group_by(records: Vec<ResultRecord>, field: Field) -> GroupedCollection {
    let mut groups = GroupedCollection::new();
    for record in records {
        let key = record.field(field).into_owned();
        groups.entry(key).or_default().push(record);
    }
    groups
}
