use std::collections::HashSet;
use std::fmt;

use crate::domain::{CandidateEntry, IdentityKey, ListingRecord};
use crate::scraper::config::{ScraperConfig, SelectorConfig, ServiceKeywords};
use crate::scraper::driver::PageDriver;
use crate::scraper::extractor::FieldExtractor;
use crate::scraper::progress::{CancelFlag, StatusSink};
use crate::scraper::rating::{parse_count_label, parse_review_block, ReviewSummary};

/// Why a candidate produced no record. Never propagates past the candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The detail view never showed a name element
    ItemTimeout(String),
    MissingName(String),
    Duplicate(IdentityKey),
    Driver(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ItemTimeout(url) => write!(f, "detail view timed out: {}", url),
            SkipReason::MissingName(url) => write!(f, "no name found: {}", url),
            SkipReason::Duplicate(key) => {
                write!(f, "duplicate of {} / {} / {}", key.name, key.address, key.phone)
            }
            SkipReason::Driver(msg) => write!(f, "driver error: {}", msg),
        }
    }
}

#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub records: Vec<ListingRecord>,
    /// Candidates actually opened
    pub processed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

/// Opens candidates one at a time and keeps only unseen, named listings.
pub struct ListingReconciler<'a> {
    config: &'a ScraperConfig,
    selectors: &'a SelectorConfig,
    extractor: FieldExtractor,
    seen: HashSet<IdentityKey>,
}

impl<'a> ListingReconciler<'a> {
    pub fn new(
        config: &'a ScraperConfig,
        selectors: &'a SelectorConfig,
        keywords: ServiceKeywords,
    ) -> Self {
        Self {
            config,
            selectors,
            extractor: FieldExtractor::new(keywords),
            seen: HashSet::new(),
        }
    }

    /// Stops as soon as `max_results` records were accepted, even with
    /// candidates left, or when `cancel` is raised.
    pub async fn reconcile<D: PageDriver + ?Sized>(
        &mut self,
        driver: &D,
        candidates: &[CandidateEntry],
        max_results: usize,
        sink: &dyn StatusSink,
        cancel: &CancelFlag,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let total = candidates.len();
        sink.candidates_found(total);

        for (i, candidate) in candidates.iter().enumerate() {
            if outcome.records.len() >= max_results {
                tracing::info!("Collected {} unique results, stopping", max_results);
                break;
            }
            if cancel.is_cancelled() {
                tracing::info!("Cancelled after {} candidates", i);
                outcome.cancelled = true;
                break;
            }

            sink.progress(
                item_progress(i, total),
                &format!("Extracting details {}/{}...", i + 1, total),
            );
            outcome.processed += 1;

            match self.process(driver, candidate).await {
                Ok(record) => {
                    tracing::info!(
                        index = i + 1,
                        name = record.name.as_str(),
                        "Accepted listing"
                    );
                    sink.record_accepted(&record);
                    outcome.records.push(record);
                }
                Err(reason) => {
                    outcome.skipped += 1;
                    match &reason {
                        SkipReason::Duplicate(_) => tracing::info!(index = i + 1, "Skipped: {}", reason),
                        _ => tracing::warn!(index = i + 1, "Skipped: {}", reason),
                    }
                }
            }

            tokio::time::sleep(self.config.item_pause()).await;
        }

        outcome
    }

    async fn process<D: PageDriver + ?Sized>(
        &mut self,
        driver: &D,
        candidate: &CandidateEntry,
    ) -> Result<ListingRecord, SkipReason> {
        let record = self.extract_record(driver, &candidate.locator).await?;
        let key = record.identity_key();
        if key.is_nameless() {
            return Err(SkipReason::MissingName(candidate.locator.clone()));
        }
        if !self.seen.insert(key.clone()) {
            return Err(SkipReason::Duplicate(key));
        }
        Ok(record)
    }

    async fn extract_record<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        url: &str,
    ) -> Result<ListingRecord, SkipReason> {
        driver
            .navigate(url)
            .await
            .map_err(|e| SkipReason::Driver(e.to_string()))?;
        tokio::time::sleep(self.config.detail_settle()).await;

        let ready = driver
            .wait_for_any(
                &self.selectors.name,
                self.config.detail_timeout(),
                self.config.poll_interval(),
            )
            .await
            .map_err(|e| SkipReason::Driver(e.to_string()))?;
        if !ready {
            return Err(SkipReason::ItemTimeout(url.to_string()));
        }

        let sel = self.selectors;
        let ex = &self.extractor;
        let name = ex
            .extract(driver, "name", &sel.name)
            .await
            .ok_or_else(|| SkipReason::MissingName(url.to_string()))?;

        let mut record = ListingRecord::new(name, url);
        record.category = ex.extract(driver, "category", &sel.category).await;
        record.address = ex.extract(driver, "address", &sel.address).await;
        record.phone = ex.extract(driver, "phone", &sel.phone).await;
        record.website = ex.extract(driver, "website", &sel.website).await;
        record.opening_hours = ex.extract(driver, "opening_hours", &sel.opening_hours).await;
        record.introduction = ex.extract(driver, "introduction", &sel.introduction).await;

        let reviews = self.review_summary(driver).await;
        record.average_rating = reviews.average;
        record.review_count = reviews.count;

        record.set_services(ex.service_flags(driver, &sel.service_info).await);

        Ok(record.with_identity())
    }

    /// Block text first; the accessibility label only fills a missing count.
    async fn review_summary<D: PageDriver + ?Sized>(&self, driver: &D) -> ReviewSummary {
        let mut summary = self
            .extractor
            .extract(driver, "reviews", &self.selectors.review_block)
            .await
            .map(|text| parse_review_block(&text))
            .unwrap_or_default();

        if summary.count.is_none() {
            summary.count = self
                .extractor
                .extract_attribute(driver, &self.selectors.review_count_label, "aria-label")
                .await
                .and_then(|label| parse_count_label(&label));
        }
        summary
    }
}

/// 30..95 across the candidate list.
fn item_progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 30;
    }
    (30 + index * 65 / total).min(95) as u8
}
