//! Rendering of harvested listings as text, CSV or JSON downloads.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::app::{HarvestError, Result};
use crate::domain::listing::or_unavailable;
use crate::domain::{ListingRecord, SearchParams, UNAVAILABLE};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const CSV_HEADER: [&str; 13] = [
    "Name",
    "Category",
    "Address",
    "Phone",
    "Website",
    "Opening Hours",
    "Average Rating",
    "Review Count",
    "Introduction",
    "Store Shopping",
    "In-store Pickup",
    "Delivery",
    "Maps URL",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json; charset=utf-8",
        }
    }

    /// `results_YYYYmmdd_HHMMSS.<ext>`
    pub fn file_name<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!("results_{}.{}", at.format("%Y%m%d_%H%M%S"), self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Txt),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(HarvestError::InvalidRequest(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

/// Body of the results endpoint and the JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsPayload {
    pub search_params: Option<SearchParams>,
    pub total_unique_found: usize,
    pub results: Vec<ListingRecord>,
}

impl ResultsPayload {
    pub fn new(search_params: Option<SearchParams>, results: Vec<ListingRecord>) -> Self {
        Self {
            search_params,
            total_unique_found: results.len(),
            results,
        }
    }
}

/// Render `payload` in `format`. Fails with [`HarvestError::NoResults`] when empty.
pub fn render(format: ExportFormat, payload: &ResultsPayload) -> Result<Vec<u8>> {
    if payload.results.is_empty() {
        return Err(HarvestError::NoResults);
    }
    match format {
        ExportFormat::Txt => Ok(render_text(payload).into_bytes()),
        ExportFormat::Csv => render_csv(&payload.results),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(payload)?),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn render_text(payload: &ResultsPayload) -> String {
    let (category, location) = payload
        .search_params
        .as_ref()
        .map(|p| (p.category.as_str(), p.location.as_str()))
        .unwrap_or((UNAVAILABLE, UNAVAILABLE));

    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "Search results for: {} in {}", category, location);
    let _ = writeln!(out, "Total unique listings found: {}", payload.results.len());
    let _ = writeln!(out, "{}\n", "=".repeat(40));

    for r in &payload.results {
        let _ = writeln!(out, "Name: {}", r.name);
        let _ = writeln!(out, "Category: {}", or_unavailable(&r.category));
        let _ = writeln!(out, "Address: {}", or_unavailable(&r.address));
        let _ = writeln!(out, "Phone: {}", or_unavailable(&r.phone));
        let _ = writeln!(out, "Website: {}", or_unavailable(&r.website));
        let _ = writeln!(out, "Opening Hours: {}", or_unavailable(&r.opening_hours));
        let _ = writeln!(out, "Average Rating: {}", r.display_rating());
        let _ = writeln!(out, "Review Count: {}", r.display_review_count());
        let _ = writeln!(out, "Introduction: {}", or_unavailable(&r.introduction));
        let _ = writeln!(out, "Store Shopping: {}", yes_no(r.store_shopping));
        let _ = writeln!(out, "In-store Pickup: {}", yes_no(r.in_store_pickup));
        let _ = writeln!(out, "Delivery: {}", yes_no(r.delivery));
        let _ = writeln!(out, "Maps URL: {}", r.source_url);
        let _ = writeln!(out, "{}\n", "-".repeat(30));
    }
    out
}

fn render_csv(records: &[ListingRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(CSV_HEADER)?;
    for r in records {
        let rating = r.display_rating();
        let reviews = r.display_review_count();
        writer.write_record([
            r.name.as_str(),
            or_unavailable(&r.category),
            or_unavailable(&r.address),
            or_unavailable(&r.phone),
            or_unavailable(&r.website),
            or_unavailable(&r.opening_hours),
            rating.as_str(),
            reviews.as_str(),
            or_unavailable(&r.introduction),
            yes_no(r.store_shopping),
            yes_no(r.in_store_pickup),
            yes_no(r.delivery),
            r.source_url.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| HarvestError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn payload() -> ResultsPayload {
        let mut full = ListingRecord::new("Cafe; Uno", "https://maps.example/maps/place/1");
        full.category = Some("Cafe".into());
        full.address = Some("Rua 1, Porto".into());
        full.average_rating = Some(4.5);
        full.review_count = Some(120);
        full.delivery = true;
        let full = full.with_identity();

        let bare = ListingRecord::new("Bare", "https://maps.example/maps/place/2");

        let params = SearchParams::new(Some("cafe"), Some("Porto"), Some("10")).unwrap();
        ResultsPayload::new(Some(params), vec![full, bare])
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(HarvestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(ExportFormat::Csv.file_name(&at), "results_20240309_140507.csv");
    }

    #[test]
    fn test_empty_results_rejected() {
        let empty = ResultsPayload::new(None, Vec::new());
        assert!(matches!(
            render(ExportFormat::Json, &empty),
            Err(HarvestError::NoResults)
        ));
    }

    #[test]
    fn test_text_report() {
        let text = String::from_utf8(render(ExportFormat::Txt, &payload()).unwrap()).unwrap();
        assert!(text.starts_with("Search results for: cafe in Porto\n"));
        assert!(text.contains("Total unique listings found: 2"));
        assert!(text.contains("Average Rating: 4.5"));
        assert!(text.contains("Delivery: Yes"));
        assert!(text.contains("Store Shopping: No"));
        // Missing fields of the bare record
        assert!(text.contains("Phone: N/A"));
        assert!(text.contains("Review Count: N/A"));
    }

    #[test]
    fn test_csv_layout() {
        let bytes = render(ExportFormat::Csv, &payload()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let body = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(";"));
        // The delimiter inside a value is quoted
        assert!(lines[1].starts_with("\"Cafe; Uno\";Cafe;"));
        assert!(lines[2].starts_with("Bare;N/A;N/A"));
        assert!(lines[2].ends_with(";No;No;No;https://maps.example/maps/place/2"));
    }

    #[test]
    fn test_json_export() {
        let bytes = render(ExportFormat::Json, &payload()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["total_unique_found"], 2);
        assert_eq!(value["search_params"]["category"], "cafe");
        assert_eq!(value["results"][0]["average_rating"], 4.5);
        assert!(value["results"][1]["phone"].is_null());
        // Pretty-printed
        assert!(String::from_utf8(bytes).unwrap().contains("\n  "));
    }
}
