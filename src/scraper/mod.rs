//! Browser-driven harvesting of business listings from a map search.
//!
//! # Architecture
//!
//! ```text
//! SearchParams → FeedScroller → candidate URLs → ListingReconciler → ListingRecords
//! ```
//!
//! The scroller keeps scrolling the results feed until it has seen enough
//! distinct place links or the feed stops growing. The reconciler then opens
//! every candidate, extracts its fields and drops repeats by identity key.
//!
//! Both stages talk to the page only through [`PageDriver`], implemented for
//! Chrome by [`BrowserSession`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use placeharvest::scraper::{harvest, BrowserSession, CancelFlag, HarvestSettings, LogSink};
//!
//! let settings = HarvestSettings::default();
//! let session = BrowserSession::launch(settings.scraper.clone()).await?;
//! let result = harvest(&session, &settings, &params, &LogSink, &CancelFlag::new()).await;
//! session.close().await;
//! ```

mod chrome;
mod config;
mod driver;
mod extractor;
#[cfg(test)]
mod fake;
mod job;
mod progress;
mod rating;
mod reconciler;
mod scroller;

pub use chrome::BrowserSession;
pub use config::{HarvestSettings, ScraperConfig, SelectorConfig, ServiceKeywords};
pub use driver::{PageDriver, QueryKind, ScrollTarget};
pub use extractor::FieldExtractor;
pub use job::{ChromeFactory, DriverFactory, JobManager, JobState};
pub use progress::{CancelFlag, CollectingSink, LogSink, StatusSink};
pub use rating::{parse_count_label, parse_review_block, ReviewSummary};
pub use reconciler::{ListingReconciler, ReconcileOutcome, SkipReason};
pub use scroller::{FeedScroller, ScrollOutcome, ScrollStop};

use crate::app::Result;
use crate::domain::{ListingRecord, SearchParams};

/// What a finished harvest produced
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Distinct candidate links handed to the reconciler
    pub total_found: usize,
    pub records: Vec<ListingRecord>,
    pub scroll_stop: ScrollStop,
    pub cancelled: bool,
}

/// Run one complete search: scroll the feed, then reconcile the candidates.
///
/// Only setup failures (no results, browser errors while scrolling) are
/// returned as errors; per-listing failures are skipped.
pub async fn harvest<D: PageDriver + ?Sized>(
    driver: &D,
    settings: &HarvestSettings,
    params: &SearchParams,
    sink: &dyn StatusSink,
    cancel: &CancelFlag,
) -> Result<HarvestReport> {
    let query = params.query(&settings.scraper.query_template);

    let scroller = FeedScroller::new(&settings.scraper, &settings.selectors)?;
    let scrolled = scroller
        .collect_candidates(driver, &query, params.max_results, sink, cancel)
        .await?;

    let total_found = scrolled.candidates.len();
    sink.progress(30, &format!("Found {} listings, extracting details...", total_found));

    let mut reconciler = ListingReconciler::new(
        &settings.scraper,
        &settings.selectors,
        settings.keywords.clone(),
    );
    let reconciled = reconciler
        .reconcile(driver, &scrolled.candidates, params.max_results, sink, cancel)
        .await;

    tracing::info!(
        candidates = total_found,
        unique = reconciled.records.len(),
        skipped = reconciled.skipped,
        "Harvest complete"
    );

    Ok(HarvestReport {
        total_found,
        records: reconciled.records,
        scroll_stop: scrolled.stop,
        cancelled: scrolled.stop == ScrollStop::Cancelled || reconciled.cancelled,
    })
}
