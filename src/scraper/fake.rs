//! In-memory page driver for exercising the traversal without a browser.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{HarvestError, Result};
use crate::scraper::config::{ScraperConfig, SelectorConfig};
use crate::scraper::driver::{PageDriver, ScrollTarget};

pub const SEARCH_INPUT: &str = "search-input";
pub const RESULTS_READY: &str = "results-ready";
pub const FEED: &str = "feed";
pub const FEED_LINK: &str = "feed-link";

/// Selectors whose queries are plain keys understood by [`FakeDriver`].
pub fn selectors() -> SelectorConfig {
    let one = |s: &str| vec![s.to_string()];
    SelectorConfig {
        search_input: one(SEARCH_INPUT),
        results_ready: one(RESULTS_READY),
        feed_container: one(FEED),
        candidate_links: one(FEED_LINK),
        candidate_href_marker: "/maps/place".to_string(),
        name: one("name"),
        category: one("category"),
        address: one("address"),
        phone: one("phone"),
        website: one("website"),
        opening_hours: one("hours"),
        introduction: one("intro"),
        review_block: one("reviews"),
        review_count_label: one("review-label"),
        service_info: one("info"),
    }
}

/// Config with every wait set to zero.
pub fn instant_config() -> ScraperConfig {
    ScraperConfig {
        initial_load_wait_ms: 0,
        results_timeout_secs: 0,
        detail_timeout_secs: 0,
        scroll_settle_ms: 0,
        scroll_pause_ms: 0,
        detail_settle_ms: 0,
        item_pause_ms: 0,
        poll_interval_ms: 0,
        ..ScraperConfig::default()
    }
}

pub fn place_url(slug: &str) -> String {
    format!("https://maps.example/maps/place/{}", slug)
}

#[derive(Debug, Default, Clone)]
pub struct FakePage {
    texts: HashMap<String, Vec<String>>,
    attrs: HashMap<(String, String), Vec<String>>,
    failing: HashSet<String>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A typical listing with name, address and phone filled in.
    pub fn listing(name: &str, address: &str, phone: &str) -> Self {
        Self::new()
            .text("name", name)
            .text("address", address)
            .text("phone", phone)
    }

    pub fn text(mut self, query: &str, value: &str) -> Self {
        self.texts
            .entry(query.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn attr(mut self, query: &str, name: &str, value: &str) -> Self {
        self.attrs
            .entry((query.to_string(), name.to_string()))
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn failing_query(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }
}

#[derive(Default)]
struct FakeState {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    feed_stages: Vec<Vec<String>>,
    results_ready: bool,
    has_feed_container: bool,
    scrolls: usize,
    submitted: Vec<String>,
    visits: Vec<String>,
    broken_urls: HashSet<String>,
}

impl FakeState {
    fn visible_links(&self) -> Vec<String> {
        if self.feed_stages.is_empty() {
            return Vec::new();
        }
        let stage = self.scrolls.min(self.feed_stages.len() - 1);
        self.feed_stages[stage].clone()
    }

    fn page(&self) -> Option<&FakePage> {
        self.current.as_ref().and_then(|url| self.pages.get(url))
    }
}

#[derive(Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed contents after 0, 1, 2, ... scrolls; the last stage repeats.
    pub fn with_feed(stages: Vec<Vec<String>>) -> Self {
        let driver = Self::new();
        {
            let mut state = driver.state.lock().unwrap();
            state.results_ready = stages.iter().any(|s| !s.is_empty());
            state.has_feed_container = true;
            state.feed_stages = stages;
        }
        driver
    }

    pub fn without_feed_container(self) -> Self {
        self.state.lock().unwrap().has_feed_container = false;
        self
    }

    pub fn add_page(&self, url: &str, page: FakePage) {
        self.state.lock().unwrap().pages.insert(url.to_string(), page);
    }

    pub fn break_url(&self, url: &str) {
        self.state.lock().unwrap().broken_urls.insert(url.to_string());
    }

    pub fn goto(&self, url: &str) {
        self.state.lock().unwrap().current = Some(url.to_string());
    }

    pub fn scroll_count(&self) -> usize {
        self.state.lock().unwrap().scrolls
    }

    pub fn visits(&self) -> Vec<String> {
        self.state.lock().unwrap().visits.clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.state.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.visits.push(url.to_string());
        if state.broken_urls.contains(url) {
            return Err(HarvestError::Browser(format!("net::ERR_FAILED {}", url)));
        }
        state.current = Some(url.to_string());
        Ok(())
    }

    async fn submit_search(&self, _input_query: &str, text: &str) -> Result<()> {
        self.state.lock().unwrap().submitted.push(text.to_string());
        Ok(())
    }

    async fn exists(&self, query: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(match query {
            SEARCH_INPUT => true,
            RESULTS_READY => state.results_ready,
            FEED => state.has_feed_container,
            FEED_LINK => !state.visible_links().is_empty(),
            _ => state
                .page()
                .map(|p| p.texts.get(query).is_some_and(|t| !t.is_empty()))
                .unwrap_or(false),
        })
    }

    async fn texts(&self, query: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let Some(page) = state.page() else {
            return Ok(Vec::new());
        };
        if page.failing.contains(query) {
            return Err(HarvestError::Browser(format!("node detached: {}", query)));
        }
        Ok(page.texts.get(query).cloned().unwrap_or_default())
    }

    async fn attributes(&self, query: &str, name: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if query == FEED_LINK && name == "href" {
            return Ok(state.visible_links());
        }
        let Some(page) = state.page() else {
            return Ok(Vec::new());
        };
        if page.failing.contains(query) {
            return Err(HarvestError::Browser(format!("node detached: {}", query)));
        }
        Ok(page
            .attrs
            .get(&(query.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn scroll_feed(&self, containers: &[String]) -> Result<ScrollTarget> {
        let mut state = self.state.lock().unwrap();
        state.scrolls += 1;
        if state.has_feed_container && containers.iter().any(|c| c == FEED) {
            Ok(ScrollTarget::Feed)
        } else {
            Ok(ScrollTarget::Page)
        }
    }
}
