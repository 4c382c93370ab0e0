//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Gender;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and traversal behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Event-name and gender keyword tables
    #[serde(default)]
    pub tables: NameTables,

    /// PDF sentinels and header layout
    #[serde(default)]
    pub pdf: PdfConfig,

    /// Listing and result page selectors
    #[serde(default)]
    pub html: HtmlConfig,

    /// Season calendar rules
    #[serde(default)]
    pub season: SeasonConfig,

    /// Default criteria, keyed by record field name
    #[serde(default)]
    pub criteria: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.tables.events.is_empty() {
            return Err(AppError::validation("No event names defined"));
        }
        if self.tables.gender.male.is_empty() {
            return Err(AppError::validation("No male gender keywords defined"));
        }
        if self.pdf.header_marker.is_empty() || self.pdf.data_start_marker.is_empty() {
            return Err(AppError::validation("PDF markers must not be empty"));
        }
        if self.html.results_marker.is_empty() {
            return Err(AppError::validation("html.results_marker is empty"));
        }
        if !(1..=12).contains(&self.season.start_month) {
            return Err(AppError::validation("season.start_month must be 1-12"));
        }
        for selector in self.html.selectors() {
            Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// HTTP client and traversal behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between result page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Result pages in flight at once; output order never depends on it
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Lookup tables used while resolving headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameTables {
    /// Hebrew event roots and their canonical English names
    #[serde(default = "defaults::event_names")]
    pub events: Vec<EventNameMapping>,

    #[serde(default)]
    pub gender: GenderKeywords,
}

impl NameTables {
    /// Canonical English name for a stripped Hebrew event root.
    pub fn translate(&self, hebrew: &str) -> Option<&str> {
        self.events
            .iter()
            .find(|m| m.hebrew == hebrew)
            .map(|m| m.english.as_str())
    }
}

impl Default for NameTables {
    fn default() -> Self {
        Self {
            events: defaults::event_names(),
            gender: GenderKeywords::default(),
        }
    }
}

/// Mapping from a Hebrew event root to its canonical name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventNameMapping {
    /// Event root with spaces, digits and dashes removed
    pub hebrew: String,

    pub english: String,
}

/// Keywords that identify the gender printed in a header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenderKeywords {
    #[serde(default = "defaults::male_keywords")]
    pub male: Vec<String>,

    #[serde(default = "defaults::female_keywords")]
    pub female: Vec<String>,
}

impl GenderKeywords {
    /// Male when any male keyword appears, female otherwise.
    pub fn classify(&self, text: &str) -> Gender {
        if self.male.iter().any(|k| text.contains(k.as_str())) {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    /// Whether a header token is a gender word rather than part of a name.
    pub fn is_gender_word(&self, token: &str) -> bool {
        self.male.iter().chain(&self.female).any(|k| k == token)
    }
}

impl Default for GenderKeywords {
    fn default() -> Self {
        Self {
            male: defaults::male_keywords(),
            female: defaults::female_keywords(),
        }
    }
}

/// How an event header joins its name and pool length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderLayout {
    /// `"50 גב -1- ..."`: name and pool length in the first dash segment
    DashJoined,
    /// `"... 50 גב"`: pool length immediately before the trailing name
    SpaceJoined,
}

/// Sentinels and layout for PDF text items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Substring of a normalized item that marks an event header
    #[serde(default = "defaults::pdf_header_marker")]
    pub header_marker: String,

    /// Normalized item that marks the start of tabular data
    #[serde(default = "defaults::pdf_data_start_marker")]
    pub data_start_marker: String,

    #[serde(default = "defaults::dash_layout")]
    pub layout: HeaderLayout,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            header_marker: defaults::pdf_header_marker(),
            data_start_marker: defaults::pdf_data_start_marker(),
            layout: defaults::dash_layout(),
        }
    }
}

/// Selectors and markers for listing and result pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    /// Inline frame that wraps the real listing
    #[serde(default = "defaults::frame_selector")]
    pub frame_selector: String,

    /// Calendar row on the listing page
    #[serde(default = "defaults::calendar_row_selector")]
    pub calendar_row_selector: String,

    /// Cell within a calendar row
    #[serde(default = "defaults::cell_selector")]
    pub cell_selector: String,

    /// Result link within a calendar row
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// Column holding the meet date
    #[serde(default)]
    pub date_cell: usize,

    /// Column holding the registration count
    #[serde(default = "defaults::registrations_cell")]
    pub registrations_cell: usize,

    /// Column holding the participant count
    #[serde(default = "defaults::participants_cell")]
    pub participants_cell: usize,

    /// Anchor text marking a results link
    #[serde(default = "defaults::results_marker")]
    pub results_marker: String,

    /// Anchor text marking per-heat results, which are skipped
    #[serde(default = "defaults::heat_results_marker")]
    pub heat_results_marker: String,

    /// Header block of a result page
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Data rows of a result table
    #[serde(default = "defaults::result_row_selector")]
    pub result_row_selector: String,

    /// Index of the gender segment when the title is split on `" - "`
    #[serde(default = "defaults::gender_segment")]
    pub gender_segment: usize,

    /// Line of the title that carries the event descriptor
    #[serde(default = "defaults::event_line")]
    pub event_line: usize,

    #[serde(default = "defaults::dash_layout")]
    pub layout: HeaderLayout,

    /// The event line ends with a gender word that is not part of the name
    #[serde(default)]
    pub header_includes_gender: bool,
}

impl HtmlConfig {
    fn selectors(&self) -> [&str; 6] {
        [
            self.frame_selector.as_str(),
            self.calendar_row_selector.as_str(),
            self.cell_selector.as_str(),
            self.link_selector.as_str(),
            self.title_selector.as_str(),
            self.result_row_selector.as_str(),
        ]
    }
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            frame_selector: defaults::frame_selector(),
            calendar_row_selector: defaults::calendar_row_selector(),
            cell_selector: defaults::cell_selector(),
            link_selector: defaults::link_selector(),
            date_cell: 0,
            registrations_cell: defaults::registrations_cell(),
            participants_cell: defaults::participants_cell(),
            results_marker: defaults::results_marker(),
            heat_results_marker: defaults::heat_results_marker(),
            title_selector: defaults::title_selector(),
            result_row_selector: defaults::result_row_selector(),
            gender_segment: defaults::gender_segment(),
            event_line: defaults::event_line(),
            layout: defaults::dash_layout(),
            header_includes_gender: false,
        }
    }
}

/// Season calendar rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonConfig {
    /// First month of a season; meets from this month count toward next year
    #[serde(default = "defaults::season_start_month")]
    pub start_month: u32,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            start_month: defaults::season_start_month(),
        }
    }
}

mod defaults {
    use super::{EventNameMapping, HeaderLayout};

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; swim-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }
    pub fn max_concurrent() -> usize {
        1
    }

    // Name tables
    pub fn event_names() -> Vec<EventNameMapping> {
        [
            ("מעורבאישי", "Individual medley"),
            ("חופשי", "Freestyle"),
            ("גב", "Backstroke"),
            ("חזה", "Breaststroke"),
            ("פרפר", "Butterfly"),
            ("חופשישליחים", "Freestyle relay"),
            ("מעורבשליחים", "Medley relay"),
        ]
        .into_iter()
        .map(|(hebrew, english)| EventNameMapping {
            hebrew: hebrew.to_string(),
            english: english.to_string(),
        })
        .collect()
    }
    pub fn male_keywords() -> Vec<String> {
        vec!["בנים".into(), "גברים".into()]
    }
    pub fn female_keywords() -> Vec<String> {
        vec!["בנות".into(), "נשים".into()]
    }

    // PDF defaults
    pub fn pdf_header_marker() -> String {
        "תואצות".into()
    }
    pub fn pdf_data_start_marker() -> String {
        "רישי רמג".into()
    }
    pub fn dash_layout() -> HeaderLayout {
        HeaderLayout::DashJoined
    }

    // HTML defaults
    pub fn frame_selector() -> String {
        "iframe[src]".into()
    }
    pub fn calendar_row_selector() -> String {
        "table tr".into()
    }
    pub fn cell_selector() -> String {
        "td".into()
    }
    pub fn link_selector() -> String {
        "a[href]".into()
    }
    pub fn registrations_cell() -> usize {
        3
    }
    pub fn participants_cell() -> usize {
        4
    }
    pub fn results_marker() -> String {
        "תוצאות".into()
    }
    pub fn heat_results_marker() -> String {
        "תוצאות מקצים".into()
    }
    pub fn title_selector() -> String {
        ".disciplines-title h4".into()
    }
    pub fn result_row_selector() -> String {
        "table.res-table tbody tr".into()
    }
    pub fn gender_segment() -> usize {
        3
    }
    pub fn event_line() -> usize {
        1
    }

    // Season defaults
    pub fn season_start_month() -> u32 {
        9
    }
}
