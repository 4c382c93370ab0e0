//! Source traversal.
//!
//! Every source is reduced to a list of items (result pages, PDF dumps,
//! record files) that are processed in order. A failure confined to one
//! item is logged and that item contributes no records; anything else
//! stops the run.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{Config, PageContext, ResultRecord, ResultSet};
use crate::pipeline::criteria::Criteria;
use crate::services::{DateWindow, HtmlResultsAdapter, PdfPage, PdfResultsAdapter};
use crate::storage::ResultStorage;
use crate::utils::http::PageFetcher;

/// Where records come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// A meet-listing page; result pages dated inside `window` are read
    Listing { url: String, window: DateWindow },
    /// Text items extracted from a results PDF, as a JSON array of pages
    PdfItems { path: PathBuf },
    /// A previously persisted result file
    File { path: PathBuf },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Listing { url, .. } => write!(f, "listing {url}"),
            Source::PdfItems { path } => write!(f, "PDF items {}", path.display()),
            Source::File { path } => write!(f, "file {}", path.display()),
        }
    }
}

/// One ingestion run.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub source: Source,
    pub criteria: Criteria,
    /// Event name to use instead of parsing headers
    pub event_override: Option<String>,
    /// Competition year for PDF sources, which carry no meet date
    pub competition_year: Option<i32>,
}

/// Records gathered from a list of items.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: Vec<ResultRecord>,
    pub item_total: usize,
    pub item_failures: usize,
}

/// Summary of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub records: Vec<ResultRecord>,
    pub item_total: usize,
    pub item_failures: usize,
    /// First and last meet dates of a listing, in listing order
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

impl From<Batch> for IngestOutcome {
    fn from(batch: Batch) -> Self {
        Self {
            records: batch.records,
            item_total: batch.item_total,
            item_failures: batch.item_failures,
            ..Self::default()
        }
    }
}

/// Run `task` over `items` and concatenate the records in item order.
///
/// At most `max_concurrent` tasks are in flight; with 1 the traversal is
/// strictly sequential. Isolated errors (see [`AppError::is_isolated`])
/// are logged and counted. Any other error is returned immediately.
pub async fn collect_isolated<T, F, Fut>(
    items: Vec<T>,
    max_concurrent: usize,
    delay: Duration,
    task: F,
) -> Result<Batch>
where
    T: fmt::Display,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<Vec<ResultRecord>>>,
{
    let mut batch = Batch {
        item_total: items.len(),
        ..Batch::default()
    };

    let task = &task;
    let mut results = stream::iter(items)
        .map(|item| async move {
            let label = item.to_string();
            (label, task(item).await)
        })
        .buffered(max_concurrent.max(1));

    while let Some((label, result)) = results.next().await {
        match result {
            Ok(records) => {
                log::debug!("{}: {} records", label, records.len());
                batch.records.extend(records);
            }
            Err(error) if error.is_isolated() => {
                batch.item_failures += 1;
                log::warn!("Skipping {}: {}", label, error);
            }
            Err(error) => return Err(error),
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(batch)
}

/// Gather raw records from the request's source.
///
/// Criteria are only used here for the page-level gender skip; record
/// filtering happens afterwards.
pub async fn ingest(
    config: &Config,
    request: &IngestRequest,
    fetcher: &dyn PageFetcher,
    storage: &dyn ResultStorage,
) -> Result<IngestOutcome> {
    let crawler = &config.crawler;
    let delay = Duration::from_millis(crawler.request_delay_ms);
    log::info!("Ingesting from {}", request.source);

    match &request.source {
        Source::Listing { url, window } => {
            let adapter = HtmlResultsAdapter::new(config);
            let scan = adapter.list_result_links(fetcher, url, window).await?;
            let (first_date, last_date) = (scan.first_date, scan.last_date);

            let batch = collect_isolated(scan.links, crawler.max_concurrent, delay, |link| {
                let adapter = &adapter;
                async move {
                    log::info!("Event date: {}, scraping {}", link.event_date, link.link);
                    let page = fetcher.fetch_text(&link.link).await?;
                    let context = PageContext::from_link(&link, config.season.start_month)
                        .with_event_override(request.event_override.clone());
                    adapter.parse_result_page(&page, &context, &request.criteria)
                }
            })
            .await?;

            Ok(IngestOutcome {
                first_date,
                last_date,
                ..IngestOutcome::from(batch)
            })
        }
        Source::PdfItems { path } => {
            let adapter = PdfResultsAdapter::new(config);
            let context = PageContext {
                competition_year: request.competition_year,
                event_override: request.event_override.clone(),
                ..PageContext::default()
            };

            let label = path.display().to_string();
            let batch = collect_isolated(vec![label], 1, Duration::ZERO, |label| {
                let (adapter, context) = (&adapter, &context);
                async move {
                    let pages = read_pdf_items(path, &label).await?;
                    Ok(adapter.extract_pdf_records(&pages, context))
                }
            })
            .await?;
            Ok(batch.into())
        }
        Source::File { path } => {
            let key = path.to_string_lossy();
            let batch = collect_isolated(vec![key.as_ref()], 1, Duration::ZERO, |item| async move {
                storage
                    .load(item)
                    .await?
                    .map(ResultSet::into_records)
                    .ok_or_else(|| AppError::fetch(item, "no such file"))
            })
            .await?;
            Ok(batch.into())
        }
    }
}

async fn read_pdf_items(path: &Path, label: &str) -> Result<Vec<PdfPage>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::fetch(label, e))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::parse(label, e))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::storage::{LocalStorage, WriteMode};

    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::fetch(url, "not found"))
        }
    }

    fn request(source: Source) -> IngestRequest {
        IngestRequest {
            source,
            criteria: Criteria::default(),
            event_override: None,
            competition_year: None,
        }
    }

    fn record(position: &str) -> ResultRecord {
        ResultRecord {
            position: position.to_string(),
            ..ResultRecord::default()
        }
    }

    #[tokio::test]
    async fn test_collect_isolated_skips_failed_items() {
        let items = vec!["a", "b", "c"];
        let batch = collect_isolated(items, 1, Duration::ZERO, |item| async move {
            match item {
                "b" => Err(AppError::parse(item, "broken table")),
                _ => Ok(vec![record(item)]),
            }
        })
        .await
        .unwrap();

        assert_eq!(batch.item_total, 3);
        assert_eq!(batch.item_failures, 1);
        let positions: Vec<&str> = batch.records.iter().map(|r| r.position.as_str()).collect();
        assert_eq!(positions, ["a", "c"]);
    }

    #[tokio::test]
    async fn test_collect_isolated_aborts_on_fatal_error() {
        let calls = AtomicUsize::new(0);
        let result = collect_isolated(vec![1, 2, 3], 1, Duration::ZERO, |item| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if item == 2 {
                    Err(AppError::malformed("item 2", "not a record"))
                } else {
                    Ok(Vec::new())
                }
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::MalformedData { .. })));
        assert!(calls.load(Ordering::SeqCst) < 3);
    }

    #[tokio::test]
    async fn test_collect_isolated_keeps_order_when_concurrent() {
        let batch = collect_isolated(vec![3u64, 1, 2], 3, Duration::ZERO, |item| async move {
            tokio::time::sleep(Duration::from_millis(item * 5)).await;
            Ok(vec![record(&item.to_string())])
        })
        .await
        .unwrap();

        let positions: Vec<&str> = batch.records.iter().map(|r| r.position.as_str()).collect();
        assert_eq!(positions, ["3", "1", "2"]);
    }

    #[tokio::test]
    async fn test_ingest_pdf_items() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.json");
        let pages = serde_json::json!([
            ["50 גב -1- תוצאות םינב", "גמר ישיר", "500", "00:40.12", "יבכמ", "2013", "יסוי", "ןהכ", "3", "1"],
            ["1", "footer"]
        ]);
        std::fs::write(&path, pages.to_string()).unwrap();

        let config = Config::default();
        let fetcher = FakeFetcher {
            pages: HashMap::new(),
        };
        let storage = LocalStorage::new(tmp.path());
        let mut req = request(Source::PdfItems { path });
        req.competition_year = Some(2025);

        let outcome = ingest(&config, &req, &fetcher, &storage).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        let r = &outcome.records[0];
        assert_eq!(r.event, "Backstroke 50");
        assert_eq!(r.last_name, "כהן");
        assert_eq!(r.position, "1");
        assert_eq!(r.age, Some(12));
    }

    #[tokio::test]
    async fn test_ingest_missing_pdf_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let fetcher = FakeFetcher {
            pages: HashMap::new(),
        };
        let storage = LocalStorage::new(tmp.path());
        let req = request(Source::PdfItems {
            path: tmp.path().join("missing.json"),
        });

        let outcome = ingest(&config, &req, &fetcher, &storage).await.unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.item_failures, 1);
    }

    #[tokio::test]
    async fn test_ingest_file_source() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let path = tmp.path().join("old.json");
        storage
            .write(
                &path.to_string_lossy(),
                ResultSet::Flat(vec![record("1"), record("2")]),
                WriteMode::Create,
            )
            .await
            .unwrap();

        let config = Config::default();
        let fetcher = FakeFetcher {
            pages: HashMap::new(),
        };
        let outcome = ingest(&config, &request(Source::File { path }), &fetcher, &storage)
            .await
            .unwrap();
        assert_eq!(outcome.records.len(), 2);
    }

    #[tokio::test]
    async fn test_ingest_malformed_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();

        let config = Config::default();
        let fetcher = FakeFetcher {
            pages: HashMap::new(),
        };
        let storage = LocalStorage::new(tmp.path());
        let err = ingest(&config, &request(Source::File { path }), &fetcher, &storage)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedData { .. }));
    }
}
