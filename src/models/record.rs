//! Result record data structures.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::normalize::normalize;

/// Competitor gender as printed in result headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One competitor's result in one event.
///
/// Text fields are stored in display orientation. Numeric-looking fields are
/// kept as strings because the sources mix numbers with markers such as
/// `DNF` or `DQ`; persisted files written by older tools may hold them as
/// JSON numbers, which are accepted on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Canonical event descriptor, e.g. "Freestyle 50"
    #[serde(default, deserialize_with = "lenient::string")]
    pub event: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub event_date: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub total_registrations: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub total_participants: Option<String>,

    /// Competition year minus birth year
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_int"
    )]
    pub age: Option<i32>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub pool_length: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub score: String,

    /// `MM:SS.ss`, or the source's marker passed through untouched
    #[serde(default, deserialize_with = "lenient::string")]
    pub time: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub club: String,

    #[serde(rename = "birthYear", default, deserialize_with = "lenient::string")]
    pub birth_year: String,

    #[serde(rename = "firstName", default, deserialize_with = "lenient::string")]
    pub first_name: String,

    #[serde(rename = "lastName", default, deserialize_with = "lenient::string")]
    pub last_name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub lane: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub heat: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub position: String,
}

impl ResultRecord {
    /// Stringified value of a field, empty when the field is absent.
    pub fn field(&self, field: Field) -> Cow<'_, str> {
        fn opt(value: &Option<String>) -> Cow<'_, str> {
            Cow::Borrowed(value.as_deref().unwrap_or(""))
        }

        match field {
            Field::Event => Cow::Borrowed(&self.event),
            Field::EventDate => opt(&self.event_date),
            Field::TotalRegistrations => opt(&self.total_registrations),
            Field::TotalParticipants => opt(&self.total_participants),
            Field::Age => self
                .age
                .map_or(Cow::Borrowed(""), |age| Cow::Owned(age.to_string())),
            Field::PoolLength => opt(&self.pool_length),
            Field::Gender => Cow::Borrowed(self.gender.map_or("", |g| g.as_str())),
            Field::Score => Cow::Borrowed(&self.score),
            Field::Time => Cow::Borrowed(&self.time),
            Field::Club => Cow::Borrowed(&self.club),
            Field::BirthYear => Cow::Borrowed(&self.birth_year),
            Field::FirstName => Cow::Borrowed(&self.first_name),
            Field::LastName => Cow::Borrowed(&self.last_name),
            Field::Lane => Cow::Borrowed(&self.lane),
            Field::Heat => Cow::Borrowed(&self.heat),
            Field::Position => Cow::Borrowed(&self.position),
        }
    }

    /// Re-run directional normalization over the text fields.
    ///
    /// For files persisted in storage orientation by older tools. `event`
    /// is already canonical and `time` must never be reordered, so both are
    /// left alone.
    pub fn reoriented(&self) -> Self {
        let flip = |value: &str| normalize(value);
        let flip_opt = |value: &Option<String>| value.as_deref().map(normalize);

        Self {
            event: self.event.clone(),
            event_date: flip_opt(&self.event_date),
            total_registrations: flip_opt(&self.total_registrations),
            total_participants: flip_opt(&self.total_participants),
            age: self.age,
            pool_length: flip_opt(&self.pool_length),
            gender: self.gender,
            score: flip(&self.score),
            time: self.time.clone(),
            club: flip(&self.club),
            birth_year: flip(&self.birth_year),
            first_name: flip(&self.first_name),
            last_name: flip(&self.last_name),
            lane: flip(&self.lane),
            heat: flip(&self.heat),
            position: flip(&self.position),
        }
    }
}

/// The closed set of record fields that criteria and grouping can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Event,
    EventDate,
    TotalRegistrations,
    TotalParticipants,
    Age,
    PoolLength,
    Gender,
    Score,
    Time,
    Club,
    BirthYear,
    FirstName,
    LastName,
    Lane,
    Heat,
    Position,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Event,
        Field::EventDate,
        Field::TotalRegistrations,
        Field::TotalParticipants,
        Field::Age,
        Field::PoolLength,
        Field::Gender,
        Field::Score,
        Field::Time,
        Field::Club,
        Field::BirthYear,
        Field::FirstName,
        Field::LastName,
        Field::Lane,
        Field::Heat,
        Field::Position,
    ];

    /// Key used in persisted JSON and in criteria maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Event => "event",
            Field::EventDate => "event_date",
            Field::TotalRegistrations => "total_registrations",
            Field::TotalParticipants => "total_participants",
            Field::Age => "age",
            Field::PoolLength => "pool_length",
            Field::Gender => "gender",
            Field::Score => "score",
            Field::Time => "time",
            Field::Club => "club",
            Field::BirthYear => "birthYear",
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Lane => "lane",
            Field::Heat => "heat",
            Field::Position => "position",
        }
    }
}

impl FromStr for Field {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| AppError::UnknownCriterion(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records partitioned by a field value, in first-seen order.
pub type GroupedCollection = IndexMap<String, Vec<ResultRecord>>;

/// Shape of a persisted result file: a flat array or a grouped object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultSet {
    Flat(Vec<ResultRecord>),
    Grouped(GroupedCollection),
}

impl ResultSet {
    /// Total number of records across all groups.
    pub fn len(&self) -> usize {
        match self {
            ResultSet::Flat(records) => records.len(),
            ResultSet::Grouped(groups) => groups.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a single sequence, group by group.
    pub fn into_records(self) -> Vec<ResultRecord> {
        match self {
            ResultSet::Flat(records) => records,
            ResultSet::Grouped(groups) => groups.into_values().flatten().collect(),
        }
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        ResultSet::Flat(Vec::new())
    }
}

/// Deserializers that accept strings, numbers or null for text fields.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(to_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(to_text(Value::deserialize(deserializer)?))
    }

    pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        let parsed = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(parsed)
    }
}
