use std::collections::HashSet;

use url::Url;

use crate::app::{HarvestError, Result};
use crate::domain::CandidateEntry;
use crate::scraper::config::{ScraperConfig, SelectorConfig};
use crate::scraper::driver::{PageDriver, ScrollTarget};
use crate::scraper::progress::{CancelFlag, StatusSink};

/// Why the scroll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStop {
    /// Enough distinct candidates were found
    GoalMet,
    /// Several consecutive scrolls revealed nothing new
    Exhausted,
    /// `max_scroll_attempts` was reached (best effort, not an error)
    AttemptLimit,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ScrollOutcome {
    /// At most `max_results` entries, in discovery order
    pub candidates: Vec<CandidateEntry>,
    /// Scroll commands issued
    pub attempts: usize,
    pub stop: ScrollStop,
}

/// Insertion-ordered set of discovered place URLs.
#[derive(Default)]
struct Discovered {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl Discovered {
    /// Merge a pass of visible links, returning how many were new.
    fn merge(&mut self, links: Vec<String>) -> usize {
        let before = self.order.len();
        for link in links {
            if self.seen.insert(link.clone()) {
                self.order.push(link);
            }
        }
        self.order.len() - before
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn into_candidates(self, max_results: usize) -> Vec<CandidateEntry> {
        self.order
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(i, url)| CandidateEntry::new(url, i))
            .collect()
    }
}

/// Drives the infinite-scroll results feed until enough entries are visible
/// or the feed stops growing.
pub struct FeedScroller<'a> {
    config: &'a ScraperConfig,
    selectors: &'a SelectorConfig,
    base: Url,
}

impl<'a> FeedScroller<'a> {
    pub fn new(config: &'a ScraperConfig, selectors: &'a SelectorConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)?;
        Ok(Self {
            config,
            selectors,
            base,
        })
    }

    /// Run the search for `query` and collect up to `max_results` candidates.
    ///
    /// Fails with [`HarvestError::NoResultsFound`] when no results appear
    /// within the configured timeout.
    pub async fn collect_candidates<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        query: &str,
        max_results: usize,
        sink: &dyn StatusSink,
        cancel: &CancelFlag,
    ) -> Result<ScrollOutcome> {
        self.start_search(driver, query, sink).await?;

        sink.progress(20, "Loading results...");
        let mut discovered = Discovered::default();
        discovered.merge(self.visible_links(driver).await?);

        if discovered.len() >= max_results {
            tracing::info!("Initial results already cover {} entries", max_results);
            return Ok(ScrollOutcome {
                candidates: discovered.into_candidates(max_results),
                attempts: 0,
                stop: ScrollStop::GoalMet,
            });
        }

        let max_streak = self.config.max_no_new_results_streak.max(1);
        let mut streak = 0;
        let mut attempts = 0;

        let stop = loop {
            if cancel.is_cancelled() {
                break ScrollStop::Cancelled;
            }
            if attempts >= self.config.max_scroll_attempts {
                tracing::info!("Reached scroll limit of {}", self.config.max_scroll_attempts);
                break ScrollStop::AttemptLimit;
            }

            let target = driver.scroll_feed(&self.selectors.feed_container).await?;
            if attempts == 0 && target == ScrollTarget::Page {
                tracing::warn!("Results feed container not found, scrolling the whole page");
            }
            tokio::time::sleep(self.config.scroll_settle()).await;
            attempts += 1;

            let newly_found = discovered.merge(self.visible_links(driver).await?);
            tracing::info!(
                attempt = attempts,
                total = discovered.len(),
                new = newly_found,
                "Scrolled results feed"
            );
            sink.progress(
                20,
                &format!("Found {} unique results so far...", discovered.len()),
            );

            if discovered.len() >= max_results {
                tracing::info!("Reached requested {} results", max_results);
                break ScrollStop::GoalMet;
            }

            if newly_found == 0 {
                streak += 1;
                tracing::warn!("No new results this scroll (streak {}/{})", streak, max_streak);
                if streak >= max_streak {
                    tracing::info!("Feed exhausted after {} scrolls", attempts);
                    break ScrollStop::Exhausted;
                }
            } else {
                streak = 0;
            }

            tokio::time::sleep(self.config.scroll_pause()).await;
        };

        tracing::info!("Scrolling finished with {} unique links", discovered.len());
        Ok(ScrollOutcome {
            candidates: discovered.into_candidates(max_results),
            attempts,
            stop,
        })
    }

    async fn start_search<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        query: &str,
        sink: &dyn StatusSink,
    ) -> Result<()> {
        sink.progress(10, "Opening map search...");
        driver.navigate(self.base.as_str()).await?;
        tokio::time::sleep(self.config.initial_load_wait()).await;

        sink.progress(15, &format!("Searching for: {}...", query));
        driver.submit_first(&self.selectors.search_input, query).await?;

        let ready = driver
            .wait_for_any(
                &self.selectors.results_ready,
                self.config.results_timeout(),
                self.config.poll_interval(),
            )
            .await?;

        if !ready {
            tracing::error!("No initial results for '{}'", query);
            return Err(HarvestError::NoResultsFound(query.to_string()));
        }
        sink.progress(18, "Results found, loading more...");
        Ok(())
    }

    /// Absolute place URLs currently visible, in document order.
    async fn visible_links<D: PageDriver + ?Sized>(&self, driver: &D) -> Result<Vec<String>> {
        let mut links = Vec::new();
        for query in &self.selectors.candidate_links {
            for href in driver.attributes(query, "href").await? {
                if let Some(url) = self.resolve(&href) {
                    links.push(url);
                }
            }
        }
        Ok(links)
    }

    fn resolve(&self, href: &str) -> Option<String> {
        if !href.contains(&self.selectors.candidate_href_marker) {
            return None;
        }
        self.base.join(href).ok().map(String::from)
    }
}
