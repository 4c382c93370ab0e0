//! HTML result adapter.
//!
//! Two stages: a meet-listing calendar yields result-page descriptors, and
//! each result page yields records for one event.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, LinkDescriptor, PageContext, ResultRecord};
use crate::pipeline::criteria::Criteria;
use crate::services::event_name::EventNameResolver;
use crate::services::extract::{EventContext, record_from_row};
use crate::utils::date::parse_meet_date;
use crate::utils::http::PageFetcher;
use crate::utils::{resolve_url, squash_whitespace};

/// Inclusive meet-date range. An open end accepts every date on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Result of scanning a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingScan {
    pub links: Vec<LinkDescriptor>,
    /// Date of the first kept row, in listing order
    pub first_date: Option<String>,
    /// Date of the last kept row, in listing order
    pub last_date: Option<String>,
}

impl ListingScan {
    fn push(&mut self, descriptor: LinkDescriptor) {
        let date = descriptor
            .event_date
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();
        if self.first_date.is_none() {
            self.first_date = Some(date.clone());
        }
        self.last_date = Some(date);
        self.links.push(descriptor);
    }
}

/// Adapter for meet listings and per-event result pages.
pub struct HtmlResultsAdapter<'a> {
    config: &'a Config,
}

impl<'a> HtmlResultsAdapter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Fetch a listing page and collect its result links within `window`.
    ///
    /// A listing that embeds the real calendar in an inline frame is
    /// followed once.
    pub async fn list_result_links(
        &self,
        fetcher: &dyn PageFetcher,
        url: &str,
        window: &DateWindow,
    ) -> Result<ListingScan> {
        let mut base = Url::parse(url)?;
        let mut page = fetcher.fetch_text(url).await?;

        if let Some(frame) = self.find_frame_src(&page, &base)? {
            log::info!("Following listing frame {}", frame);
            page = fetcher.fetch_text(&frame).await?;
            base = Url::parse(&frame)?;
        }

        let scan = self.scan_listing(&page, &base, window)?;
        log::info!(
            "Found {} result links ({} to {})",
            scan.links.len(),
            scan.first_date.as_deref().unwrap_or("-"),
            scan.last_date.as_deref().unwrap_or("-")
        );
        Ok(scan)
    }

    /// Absolute URL of the first inline frame, if the page has one.
    pub fn find_frame_src(&self, page: &str, base: &Url) -> Result<Option<String>> {
        let frame_sel = Self::parse_selector(&self.config.html.frame_selector)?;
        let document = Html::parse_document(page);

        let src = document
            .select(&frame_sel)
            .filter_map(|frame| frame.value().attr("src"))
            .map(str::trim)
            .find(|src| !src.is_empty())
            .map(|src| resolve_url(base, src));
        Ok(src)
    }

    /// Scan calendar rows for result links.
    ///
    /// Rows without a parsable date in the date column, or dated outside
    /// `window`, are skipped. Within a kept row every anchor whose text
    /// carries the results marker, but not the heat-results marker, yields
    /// a descriptor.
    pub fn scan_listing(&self, page: &str, base: &Url, window: &DateWindow) -> Result<ListingScan> {
        let html = &self.config.html;
        let row_sel = Self::parse_selector(&html.calendar_row_selector)?;
        let cell_sel = Self::parse_selector(&html.cell_selector)?;
        let link_sel = Self::parse_selector(&html.link_selector)?;

        let document = Html::parse_document(page);
        let mut scan = ListingScan::default();

        for row in document.select(&row_sel) {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            let Some(event_date) = cells.get(html.date_cell).map(element_text) else {
                continue;
            };
            match parse_meet_date(&event_date) {
                Some(date) if window.contains(date) => {}
                _ => continue,
            }
            let cell_text = |index: usize| cells.get(index).map(element_text).unwrap_or_default();

            for anchor in row.select(&link_sel) {
                let text = element_text(&anchor);
                if !text.contains(html.results_marker.as_str())
                    || text.contains(html.heat_results_marker.as_str())
                {
                    continue;
                }
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };

                scan.push(LinkDescriptor {
                    link: resolve_url(base, href.trim()),
                    event_date: event_date.clone(),
                    total_registrations: cell_text(html.registrations_cell),
                    total_participants: cell_text(html.participants_cell),
                });
            }
        }

        Ok(scan)
    }

    /// Parse one result page into records.
    ///
    /// The header block gives the gender and the event line. A page whose
    /// gender conflicts with `criteria` is skipped whole before any row is
    /// read. Only rows with exactly eight cells are mapped.
    pub fn parse_result_page(
        &self,
        page: &str,
        context: &PageContext,
        criteria: &Criteria,
    ) -> Result<Vec<ResultRecord>> {
        let html = &self.config.html;
        let title_sel = Self::parse_selector(&html.title_selector)?;
        let row_sel = Self::parse_selector(&html.result_row_selector)?;
        let cell_sel = Self::parse_selector(&html.cell_selector)?;

        let document = Html::parse_document(page);
        let title: String = document
            .select(&title_sel)
            .next()
            .map(|el| el.text().collect())
            .ok_or_else(|| {
                AppError::parse("result page", format!("nothing matches '{}'", html.title_selector))
            })?;
        let title = title.trim();

        let gender_text = title.split(" - ").nth(html.gender_segment).ok_or_else(|| {
            AppError::parse("result title", format!("no gender segment in '{title}'"))
        })?;
        let gender = self.config.tables.gender.classify(gender_text);
        if criteria.conflicts_with_gender(gender) {
            log::info!("Skipping {} results page, gender criterion does not match", gender);
            return Ok(Vec::new());
        }

        let event_line = title.lines().nth(html.event_line).map(str::trim).ok_or_else(|| {
            AppError::parse("result title", format!("no event line in '{title}'"))
        })?;
        let resolved = EventNameResolver::new(&self.config.tables)
            .with_trailing_gender(html.header_includes_gender)
            .resolve(event_line, html.layout, context.event_override.as_deref())?;

        let event = EventContext {
            event: resolved.event_name,
            pool_length: resolved.pool_length,
            gender: Some(gender),
        };

        let records: Vec<ResultRecord> = document
            .select(&row_sel)
            .filter_map(|row| {
                let cells: Vec<String> = row
                    .select(&cell_sel)
                    .map(|cell| cell.text().collect::<String>().trim().to_string())
                    .collect();
                record_from_row(&cells, &event, context)
            })
            .collect();

        log::debug!("{}: {} records", event.event, records.len());
        Ok(records)
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

fn element_text(element: &ElementRef) -> String {
    squash_whitespace(&element.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use async_trait::async_trait;

    use super::*;
    use crate::models::Gender;

    const LISTING: &str = r#"
        <html><body><table>
          <tr><th>Date</th><th>Meet</th><th>Pool</th><th>Registered</th><th>Swam</th><th></th></tr>
          <tr>
            <td>14/11/2024 09:00</td><td>Winter Cup</td><td>Haifa</td><td>120</td><td>98</td>
            <td><a href="/Results/1">תוצאות</a> <a href="/Results/1/heats">תוצאות מקצים</a></td>
          </tr>
          <tr>
            <td>20/12/2024</td><td>Hanukkah Meet</td><td>Tel Aviv</td><td>80</td><td>75</td>
            <td><a href="/Results/2">תוצאות</a></td>
          </tr>
          <tr>
            <td>05/03/2025</td><td>Spring Open</td><td>Netanya</td><td>60</td><td>58</td>
            <td><a href="/Results/3">תוצאות</a></td>
          </tr>
          <tr>
            <td>21/12/2024</td><td>Registration</td><td>Eilat</td><td>0</td><td>0</td>
            <td><a href="/Register/4">הרשמה</a></td>
          </tr>
        </table></body></html>
    "#;

    const RESULT_PAGE: &str = r#"
        <html><body>
        <div class="disciplines-title"><h4>Winter Cup - Haifa - 2024 - בנים
        50 גב - גמר</h4></div>
        <table class="res-table">
          <thead><tr><th>#</th><th>Name</th></tr></thead>
          <tbody>
            <tr><td>1</td><td> ןהכ העונ </td><td>2012</td><td>לעופה</td><td>2</td><td>4</td><td>00:31.45</td><td>488</td></tr>
            <tr><td>2</td><td>יול לאינד</td><td>2013</td><td>יבכמ</td><td>2</td><td>5</td><td>00:32.10</td><td>470</td></tr>
            <tr><td colspan="8">Records: 00:29.80</td></tr>
            <tr><td>1</td><td>2</td><td>3</td><td>4</td><td>5</td><td>6</td><td>7</td></tr>
            <tr><td>1</td><td>2</td><td>3</td><td>4</td><td>5</td><td>6</td><td>7</td><td>8</td><td>9</td></tr>
          </tbody>
        </table>
        </body></html>
    "#;

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

    fn base() -> Url {
        Url::parse("https://meets.example:2053/Calendar/10358").unwrap()
    }

    fn date(text: &str) -> Option<NaiveDate> {
        parse_meet_date(text)
    }

    fn criteria(pairs: &[(&str, &str)]) -> Criteria {
        let entries: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Criteria::build(&entries).unwrap()
    }

    #[test]
    fn test_scan_listing_filters_by_window_and_marker() {
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);
        let window = DateWindow::new(date("01/11/2024"), date("31/12/2024"));

        let scan = adapter.scan_listing(LISTING, &base(), &window).unwrap();
        assert_eq!(scan.links.len(), 2);
        assert_eq!(scan.links[0].link, "https://meets.example:2053/Results/1");
        assert_eq!(scan.links[0].event_date, "14/11/2024 09:00");
        assert_eq!(scan.links[0].total_registrations, "120");
        assert_eq!(scan.links[0].total_participants, "98");
        assert_eq!(scan.links[1].link, "https://meets.example:2053/Results/2");
        assert_eq!(scan.first_date.as_deref(), Some("14/11/2024"));
        assert_eq!(scan.last_date.as_deref(), Some("20/12/2024"));
    }

    #[test]
    fn test_scan_listing_window_is_inclusive() {
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);
        let window = DateWindow::new(date("20/12/2024"), date("05/03/2025"));

        let scan = adapter.scan_listing(LISTING, &base(), &window).unwrap();
        let links: Vec<&str> = scan.links.iter().map(|l| l.link.as_str()).collect();
        assert_eq!(
            links,
            [
                "https://meets.example:2053/Results/2",
                "https://meets.example:2053/Results/3"
            ]
        );
    }

    #[test]
    fn test_open_window_accepts_everything() {
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);
        let scan = adapter
            .scan_listing(LISTING, &base(), &DateWindow::default())
            .unwrap();
        assert_eq!(scan.links.len(), 3);
    }

    #[test]
    fn test_find_frame_src() {
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);
        let page = r#"<html><body><iframe src="/Embedded/Calendar"></iframe></body></html>"#;
        assert_eq!(
            adapter.find_frame_src(page, &base()).unwrap().as_deref(),
            Some("https://meets.example:2053/Embedded/Calendar")
        );
        assert_eq!(adapter.find_frame_src(LISTING, &base()).unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_result_links_follows_frame_once() {
        let outer = r#"<html><body><iframe src="/Embedded/Calendar"></iframe></body></html>"#;
        let fetcher = FakeFetcher {
            pages: HashMap::from([
                (base().to_string(), outer.to_string()),
                (
                    "https://meets.example:2053/Embedded/Calendar".to_string(),
                    LISTING.to_string(),
                ),
            ]),
        };
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);

        let scan = adapter
            .list_result_links(&fetcher, base().as_str(), &DateWindow::default())
            .await
            .unwrap();
        assert_eq!(scan.links.len(), 3);
    }

    #[tokio::test]
    async fn test_list_result_links_surfaces_fetch_error() {
        let fetcher = FakeFetcher {
            pages: HashMap::new(),
        };
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);

        let err = adapter
            .list_result_links(&fetcher, base().as_str(), &DateWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SourceFetch { .. }));
    }

    #[test]
    fn test_parse_result_page_keeps_eight_cell_rows() {
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);
        let context = PageContext {
            event_date: Some("14/11/2024".to_string()),
            competition_year: Some(2025),
            ..PageContext::default()
        };

        let records = adapter
            .parse_result_page(RESULT_PAGE, &context, &Criteria::default())
            .unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.event, "Backstroke 50");
        assert_eq!(first.gender, Some(Gender::Male));
        assert_eq!(first.position, "1");
        assert_eq!(first.last_name, "נועה");
        assert_eq!(first.first_name, "כהן");
        assert_eq!(first.club, "הפועל");
        assert_eq!(first.time, "00:31.45");
        assert_eq!(first.score, "488");
        assert_eq!(first.age, Some(13));
        assert_eq!(records[1].last_name, "דניאל");
        assert_eq!(records[1].first_name, "לוי");
    }

    #[test]
    fn test_parse_result_page_skips_conflicting_gender() {
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);
        let records = adapter
            .parse_result_page(
                RESULT_PAGE,
                &PageContext::default(),
                &criteria(&[("gender", "female")]),
            )
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_result_page_without_title_is_parse_error() {
        let config = Config::default();
        let adapter = HtmlResultsAdapter::new(&config);
        let err = adapter
            .parse_result_page("<html><body></body></html>", &PageContext::default(), &Criteria::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
        assert!(err.is_isolated());
    }

    #[test]
    fn test_date_window_bounds() {
        let window = DateWindow::new(date("01/11/2024"), None);
        assert!(window.contains(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2024, 10, 31).unwrap()));
    }
}
