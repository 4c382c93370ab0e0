//! Pipeline entry points.
//!
//! - `run_pipeline`: ingest a source, filter, dedupe, shape and persist
//! - `run_merge`: merge two persisted result files
//! - `run_reorient`: re-normalize a file written in storage orientation

pub mod criteria;
pub mod dedup;
pub mod group;
pub mod ingest;
pub mod merge;
pub mod order;

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Config, Field, ResultRecord, ResultSet};
use crate::storage::{ResultStorage, WriteMetadata, WriteMode};
use crate::utils::http::PageFetcher;

pub use criteria::{Criteria, Criterion};
pub use dedup::dedupe;
pub use group::group_by;
pub use ingest::{IngestOutcome, IngestRequest, Source, collect_isolated, ingest};
pub use merge::merge;
pub use order::sort_by_time;

/// Shape and destination of a run's output.
#[derive(Debug, Clone)]
pub struct OutputPlan {
    pub destination: String,
    pub mode: WriteMode,
    pub group_by: Option<Field>,
    /// Write each group to its own file derived from `destination`
    pub split_groups: bool,
    pub sort_by_time: bool,
}

impl OutputPlan {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            mode: WriteMode::Create,
            group_by: None,
            split_groups: false,
            sort_by_time: false,
        }
    }
}

/// Summary of a pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Records extracted before filtering
    pub extracted: usize,
    /// Records left after filtering and dedup
    pub kept: usize,
    pub item_total: usize,
    pub item_failures: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub writes: Vec<WriteMetadata>,
}

/// Sort and group records as `plan` asks.
pub fn shape(mut records: Vec<ResultRecord>, plan: &OutputPlan) -> ResultSet {
    if plan.sort_by_time {
        sort_by_time(&mut records);
    }
    match plan.group_by {
        Some(field) => ResultSet::Grouped(group_by(records, field)),
        None => ResultSet::Flat(records),
    }
}

/// Destination for one group when groups are written separately.
///
/// `results.json` and group `Freestyle 50` give `results-Freestyle-50.json`.
/// Path separators in the key are replaced too, so a date key stays one file.
pub fn group_destination(destination: &str, key: &str) -> String {
    let stem = destination.strip_suffix(".json").unwrap_or(destination);
    format!("{}-{}.json", stem, key.replace([' ', '/', '\\'], "-"))
}

/// Run the full ingestion pipeline.
pub async fn run_pipeline(
    config: &Config,
    request: &IngestRequest,
    plan: &OutputPlan,
    fetcher: &dyn PageFetcher,
    storage: &dyn ResultStorage,
) -> Result<RunReport> {
    let start_time = Utc::now();

    // Refuse before crawling anything.
    if plan.mode == WriteMode::Create
        && !plan.split_groups
        && storage.exists(&plan.destination).await?
    {
        return Err(AppError::Conflict(plan.destination.clone()));
    }

    let outcome = ingest(config, request, fetcher, storage).await?;
    let extracted = outcome.records.len();
    let records = dedupe(request.criteria.apply(outcome.records));
    let kept = records.len();
    log::info!("Kept {} of {} extracted records", kept, extracted);

    let outputs: Vec<(String, ResultSet)> = match shape(records, plan) {
        ResultSet::Grouped(groups) if plan.split_groups => groups
            .into_iter()
            .map(|(key, records)| {
                log::info!("Group '{}': {} records", key, records.len());
                (
                    group_destination(&plan.destination, &key),
                    ResultSet::Flat(records),
                )
            })
            .collect(),
        set => vec![(plan.destination.clone(), set)],
    };

    // Nothing is written unless every destination is free.
    if plan.mode == WriteMode::Create {
        let mut claimed = HashSet::new();
        for (destination, _) in &outputs {
            if !claimed.insert(destination.as_str()) || storage.exists(destination).await? {
                return Err(AppError::Conflict(destination.clone()));
            }
        }
    }

    let mut writes = Vec::with_capacity(outputs.len());
    for (destination, set) in outputs {
        writes.push(storage.write(&destination, set, plan.mode).await?);
    }

    Ok(RunReport {
        start_time,
        end_time: Utc::now(),
        extracted,
        kept,
        item_total: outcome.item_total,
        item_failures: outcome.item_failures,
        first_date: outcome.first_date,
        last_date: outcome.last_date,
        writes,
    })
}

/// Merge two persisted files into `output`.
pub async fn run_merge(
    storage: &dyn ResultStorage,
    first: &str,
    second: &str,
    output: &str,
) -> Result<WriteMetadata> {
    let existing = load_required(storage, first).await?;
    let incoming = load_required(storage, second).await?;
    let merged = merge(existing, incoming)?;
    storage.write(output, merged, WriteMode::Create).await
}

/// Re-run directional normalization over a persisted file.
pub async fn run_reorient(
    storage: &dyn ResultStorage,
    input: &str,
    output: &str,
) -> Result<WriteMetadata> {
    let set = match load_required(storage, input).await? {
        ResultSet::Flat(records) => ResultSet::Flat(reorient_all(&records)),
        ResultSet::Grouped(groups) => ResultSet::Grouped(
            groups
                .into_iter()
                .map(|(key, records)| (key, reorient_all(&records)))
                .collect(),
        ),
    };
    storage.write(output, set, WriteMode::Create).await
}

fn reorient_all(records: &[ResultRecord]) -> Vec<ResultRecord> {
    records.iter().map(ResultRecord::reoriented).collect()
}

async fn load_required(storage: &dyn ResultStorage, key: &str) -> Result<ResultSet> {
    storage
        .load(key)
        .await?
        .ok_or_else(|| AppError::fetch(key, "no such file"))
}
