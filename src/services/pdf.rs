//! PDF result adapter.
//!
//! Consumes the text items of each page, in the order the PDF library
//! emits them, and turns every results table into records.

use serde::{Deserialize, Serialize};

use crate::models::{Config, PageContext, ResultRecord};
use crate::services::event_name::EventNameResolver;
use crate::services::extract::{EventContext, TextItem, records_from_stream};

/// Text items of one PDF page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PdfPage {
    pub items: Vec<String>,
}

impl PdfPage {
    pub fn new<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Where the scan is within the current event section.
enum Section {
    /// Before the first data-start sentinel; items are discarded
    Preamble,
    /// Collecting the table stream, starting at the sentinel
    Data(Vec<TextItem>),
    /// Header could not be resolved; everything up to the next header is dropped
    Skipped,
}

/// Adapter for positional-text PDFs.
pub struct PdfResultsAdapter<'a> {
    config: &'a Config,
}

impl<'a> PdfResultsAdapter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Extract every record from the given pages.
    ///
    /// Sentinels and gender words are matched on the normalized text, the
    /// event name is resolved from the item as stored. Items before the
    /// first data-start sentinel are discarded and the rest is mapped in
    /// fixed windows. Each header sentinel sets the event and gender for
    /// the rows that follow it; once data has started, the header itself
    /// takes the sentinel's slot in a fresh stream. A repeated data-start
    /// sentinel restarts the window alignment.
    pub fn extract_pdf_records(&self, pages: &[PdfPage], page: &PageContext) -> Vec<ResultRecord> {
        let markers = &self.config.pdf;
        let resolver = EventNameResolver::new(&self.config.tables);

        let mut event = EventContext {
            event: page.event_override.clone().unwrap_or_default(),
            ..EventContext::default()
        };
        let mut section = Section::Preamble;
        let mut data_started = false;
        let mut records = Vec::new();

        for raw in pages.iter().flat_map(|p| &p.items) {
            let item = TextItem::new(raw.as_str());
            if item.display.trim().is_empty() {
                continue;
            }

            if item.display.contains(&markers.header_marker) {
                Self::flush(&mut section, &event, page, &mut records);
                section = match self.header_context(&resolver, &item, page) {
                    Some(context) if data_started => {
                        event = context;
                        Section::Data(vec![item])
                    }
                    Some(context) => {
                        event = context;
                        Section::Preamble
                    }
                    None => Section::Skipped,
                };
                continue;
            }

            if item.display == markers.data_start_marker {
                if matches!(section, Section::Skipped) {
                    continue;
                }
                Self::flush(&mut section, &event, page, &mut records);
                section = Section::Data(vec![item]);
                data_started = true;
                continue;
            }

            if let Section::Data(stream) = &mut section {
                stream.push(item);
            }
        }
        Self::flush(&mut section, &event, page, &mut records);

        log::debug!("PDF extraction produced {} records", records.len());
        records
    }

    fn header_context(
        &self,
        resolver: &EventNameResolver<'_>,
        item: &TextItem,
        page: &PageContext,
    ) -> Option<EventContext> {
        let gender = self.config.tables.gender.classify(&item.display);
        match resolver.resolve(
            &item.raw,
            self.config.pdf.layout,
            page.event_override.as_deref(),
        ) {
            Ok(resolved) => {
                log::debug!("PDF section: {} ({})", resolved.event_name, gender);
                Some(EventContext {
                    event: resolved.event_name,
                    pool_length: resolved.pool_length,
                    gender: Some(gender),
                })
            }
            Err(e) => {
                log::warn!("Skipping PDF section under '{}': {}", item.display, e);
                None
            }
        }
    }

    fn flush(
        section: &mut Section,
        event: &EventContext,
        page: &PageContext,
        records: &mut Vec<ResultRecord>,
    ) {
        if let Section::Data(stream) = std::mem::replace(section, Section::Preamble) {
            records.extend(records_from_stream(&stream, event, page));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    // Stored orientation; normalized they read "בנות תואצות -1- בג 50" and "רישי רמג"
    const HEADER: &str = "50 גב -1- תוצאות תונב";
    const DATA_START: &str = "גמר ישיר";

    fn row(position_of_previous: &str, last: &str) -> Vec<String> {
        [position_of_previous, "500", "00:40.12", "יבכמ", "2013", "יסוי", last, "3", "1"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn extract(pages: &[PdfPage]) -> Vec<ResultRecord> {
        let config = Config::default();
        PdfResultsAdapter::new(&config).extract_pdf_records(pages, &PageContext::default())
    }

    #[test]
    fn test_nine_items_after_sentinel_make_one_record() {
        let page = PdfPage::new([
            "noise", DATA_START, "500", "00:40.12", "יבכמ", "2013", "יסוי", "ןהכ", "3", "1", "1",
        ]);
        let records = extract(&[page]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, "500");
        assert_eq!(records[0].last_name, "כהן");
        assert_eq!(records[0].position, "1");
    }

    #[test]
    fn test_trailing_partial_group_is_dropped() {
        let mut items = vec![DATA_START.to_string()];
        items.extend(row("ignored", "ןהכ").into_iter().skip(1));
        items.push("1".to_string());
        items.extend(["a", "b", "c", "d", "e"].map(String::from));
        let records = extract(&[PdfPage { items }]);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_header_sets_event_and_gender() {
        let mut items = vec![HEADER.to_string(), "page 1".to_string(), DATA_START.to_string()];
        items.extend(row("ignored", "ןהכ").into_iter().skip(1));
        items.extend(row("1", "יול"));
        items.push("2".to_string());

        let records = extract(&[PdfPage { items }]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event, "Backstroke 50");
        assert_eq!(records[0].pool_length.as_deref(), Some("50"));
        assert_eq!(records[0].gender, Some(Gender::Female));
        assert_eq!(records[0].position, "1");
        assert_eq!(records[1].last_name, "לוי");
        assert_eq!(records[1].position, "2");
    }

    #[test]
    fn test_sections_across_pages_keep_their_own_event() {
        let mut first = vec![HEADER.to_string(), DATA_START.to_string()];
        first.extend(row("ignored", "ןהכ").into_iter().skip(1));
        first.push("1".to_string());

        let mut second = vec!["100 חזה - תוצאות םינב".to_string(), DATA_START.to_string()];
        second.extend(row("ignored", "יול").into_iter().skip(1));
        second.push("1".to_string());

        let records = extract(&[PdfPage { items: first }, PdfPage { items: second }]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event, "Backstroke 50");
        assert_eq!(records[1].event, "Breaststroke 100");
        assert_eq!(records[1].gender, Some(Gender::Male));
    }

    #[test]
    fn test_later_header_switches_event_without_new_sentinel() {
        let mut items = vec![HEADER.to_string(), DATA_START.to_string()];
        items.extend(row("ignored", "ןהכ").into_iter().skip(1));
        items.push("1".to_string());
        items.push("100 חזה - תוצאות םינב".to_string());
        items.extend(row("ignored", "יול").into_iter().skip(1));
        items.extend(row("1", "יול"));
        items.push("2".to_string());

        let records = extract(&[PdfPage { items }]);
        let events: Vec<&str> = records.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(events, ["Backstroke 50", "Breaststroke 100", "Breaststroke 100"]);
        assert_eq!(records[0].gender, Some(Gender::Female));
        assert_eq!(records[1].gender, Some(Gender::Male));
        assert_eq!(records[1].last_name, "לוי");
        assert_eq!(records[2].position, "2");
    }

    #[test]
    fn test_unparsable_header_skips_section() {
        let mut items = vec!["12 - תוצאות - 34".to_string(), DATA_START.to_string()];
        items.extend(row("ignored", "ןהכ").into_iter().skip(1));
        items.push("1".to_string());
        assert!(extract(&[PdfPage { items }]).is_empty());
    }

    #[test]
    fn test_blank_items_are_ignored() {
        let page = PdfPage::new([
            DATA_START, " ", "500", "", "00:40.12", "יבכמ", "2013", "יסוי", "ןהכ", "3", "1", "1",
        ]);
        let records = extract(&[page]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time, "00:40.12");
    }

    #[test]
    fn test_override_replaces_header_name() {
        let mut items = vec![HEADER.to_string(), DATA_START.to_string()];
        items.extend(row("ignored", "ןהכ").into_iter().skip(1));
        items.push("1".to_string());

        let config = Config::default();
        let context = PageContext {
            event_override: Some("Backstroke 50m LCM".to_string()),
            ..PageContext::default()
        };
        let records =
            PdfResultsAdapter::new(&config).extract_pdf_records(&[PdfPage { items }], &context);
        assert_eq!(records[0].event, "Backstroke 50m LCM");
    }
}
