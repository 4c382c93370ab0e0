//! Criteria filtering over result records.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AppError, Result};
use crate::models::{Field, Gender, ResultRecord};
use crate::services::normalize::normalize;

/// A single match predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// The field's text contains `needle`
    Contains { field: Field, needle: String },
    /// The record's position is one of these ("top N")
    Positions(BTreeSet<u32>),
}

impl Criterion {
    fn matches(&self, record: &ResultRecord) -> bool {
        match self {
            Criterion::Contains { field, needle } => record.field(*field).contains(needle.as_str()),
            Criterion::Positions(accepted) => record
                .position
                .trim()
                .parse::<u32>()
                .is_ok_and(|p| accepted.contains(&p)),
        }
    }
}

/// Conjunction of criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    criteria: Vec<Criterion>,
}

impl Criteria {
    /// Build criteria from `key = value` pairs.
    ///
    /// Keys must be record field names; anything else is rejected. Empty
    /// values are ignored. A `position` value `N` accepts positions `1..=N`,
    /// and text values are normalized like record fields so they compare
    /// in the same orientation.
    pub fn build(entries: &BTreeMap<String, String>) -> Result<Self> {
        let mut criteria = Vec::new();
        for (key, value) in entries {
            let field: Field = key.parse()?;
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            let criterion = match field {
                Field::Position => {
                    let top: u32 = value.parse().map_err(|_| {
                        AppError::validation(format!("position criterion must be a number, got '{value}'"))
                    })?;
                    Criterion::Positions((1..=top).collect())
                }
                field => Criterion::Contains {
                    field,
                    needle: normalize(value),
                },
            };
            criteria.push(criterion);
        }
        Ok(Self { criteria })
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Whether `record` satisfies every criterion.
    pub fn matches(&self, record: &ResultRecord) -> bool {
        self.criteria.iter().all(|c| c.matches(record))
    }

    /// Keep the records that satisfy every criterion, in input order.
    pub fn apply(&self, records: Vec<ResultRecord>) -> Vec<ResultRecord> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Whether a page of `gender` results cannot contain a match.
    pub fn conflicts_with_gender(&self, gender: Gender) -> bool {
        self.criteria.iter().any(|c| match c {
            Criterion::Contains {
                field: Field::Gender,
                needle,
            } => !gender.as_str().contains(needle.as_str()),
            _ => false,
        })
    }
}
