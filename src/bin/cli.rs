//! Swim Results Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};
use swim_crawler::{
    error::{AppError, Result},
    models::{Config, Field},
    pipeline::{self, Criteria, IngestRequest, OutputPlan, Source},
    services::DateWindow,
    storage::{LocalStorage, WriteMode},
    utils::{date::parse_meet_date, http::HttpFetcher},
};

/// Swim meet results crawler
#[derive(Parser, Debug)]
#[command(
    name = "swim-crawler",
    version,
    about = "Extracts swim-meet results from HTML listings and PDF text"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract records from a listing, PDF text items, or an existing file
    Ingest(IngestArgs),

    /// Merge two result files into a new one
    Merge {
        #[arg(long)]
        first: String,

        #[arg(long)]
        second: String,

        #[arg(short, long)]
        output: String,
    },

    /// Re-normalize the text fields of a result file
    Reorient {
        #[arg(short, long)]
        input: String,

        #[arg(short, long)]
        output: String,
    },

    /// Validate the configuration file
    Validate,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["url", "pdf_items", "file"])
))]
struct IngestArgs {
    /// Meet listing URL
    #[arg(long)]
    url: Option<String>,

    /// JSON array with the text items of each PDF page
    #[arg(long)]
    pdf_items: Option<PathBuf>,

    /// Previously written result file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = "swimming_results.json")]
    output: String,

    /// Merge into the output file if it already exists
    #[arg(long)]
    append: bool,

    /// Use this event name instead of parsing headers
    #[arg(long)]
    event_name: Option<String>,

    /// Competition year, used for ages in PDF input
    #[arg(long)]
    year: Option<i32>,

    /// First meet date to include (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    start_date: Option<NaiveDate>,

    /// Last meet date to include (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    last_date: Option<NaiveDate>,

    /// Group records by this field
    #[arg(long, value_parser = parse_field)]
    group: Option<Field>,

    /// Write every group to its own file
    #[arg(long, requires = "group")]
    split_groups: bool,

    /// Keep only records matching FIELD=VALUE (repeatable)
    #[arg(long = "filter", value_name = "FIELD=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Sort records by time, fastest first
    #[arg(long)]
    sort_time: bool,
}

impl IngestArgs {
    fn source(&self) -> Result<Source> {
        if let Some(url) = &self.url {
            return Ok(Source::Listing {
                url: url.clone(),
                window: DateWindow::new(self.start_date, self.last_date),
            });
        }
        if let Some(path) = &self.pdf_items {
            return Ok(Source::PdfItems { path: path.clone() });
        }
        if let Some(path) = &self.file {
            return Ok(Source::File { path: path.clone() });
        }
        Err(AppError::config("one of --url, --pdf-items or --file is required"))
    }

    fn plan(&self) -> OutputPlan {
        OutputPlan {
            mode: if self.append {
                WriteMode::Append
            } else {
                WriteMode::Create
            },
            group_by: self.group,
            split_groups: self.split_groups,
            sort_by_time: self.sort_time,
            ..OutputPlan::new(&self.output)
        }
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_meet_date(s).ok_or_else(|| format!("'{s}' is not DD/MM/YYYY or YYYY-MM-DD"))
}

fn parse_field(s: &str) -> std::result::Result<Field, String> {
    s.parse().map_err(|e: AppError| e.to_string())
}

fn parse_filter(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
    Ok((key.trim().to_string(), value.to_string()))
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Swim results crawler starting...");

    let config = Config::load_or_default(&cli.config);
    let storage = LocalStorage::new(".");

    match cli.command {
        Command::Ingest(args) => {
            config.validate()?;

            let mut entries = config.criteria.clone();
            entries.extend(args.filters.iter().cloned());
            let criteria = Criteria::build(&entries)?;

            let request = IngestRequest {
                source: args.source()?,
                criteria,
                event_override: args.event_name.clone(),
                competition_year: args.year,
            };
            let plan = args.plan();
            let fetcher = HttpFetcher::new(&config.crawler)?;

            let report =
                pipeline::run_pipeline(&config, &request, &plan, &fetcher, &storage).await?;

            log::info!(
                "Extracted {} records, kept {} ({} of {} items failed)",
                report.extracted,
                report.kept,
                report.item_failures,
                report.item_total
            );
            if let (Some(first), Some(last)) = (&report.first_date, &report.last_date) {
                log::info!("Meets from {} to {}", first, last);
            }
            for write in &report.writes {
                log::info!(
                    "{}: {} records{}",
                    write.key,
                    write.total_records,
                    if write.merged { " (merged)" } else { "" }
                );
            }
            log::info!(
                "Finished in {}s",
                (report.end_time - report.start_time).num_seconds()
            );
        }

        Command::Merge {
            first,
            second,
            output,
        } => {
            let meta = pipeline::run_merge(&storage, &first, &second, &output).await?;
            log::info!("Merged {} records into {}", meta.total_records, meta.key);
        }

        Command::Reorient { input, output } => {
            let meta = pipeline::run_reorient(&storage, &input, &output).await?;
            log::info!("Reoriented {} records into {}", meta.total_records, meta.key);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            Criteria::build(&config.criteria)?;
            log::info!("✓ Config OK ({} event names)", config.tables.events.len());
        }
    }

    log::info!("Done!");

    Ok(())
}
