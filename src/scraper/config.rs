use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the browser-driven search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Page the search starts from
    pub base_url: String,

    /// Query typed into the search box; `{category}` and `{location}` are substituted
    pub query_template: String,

    /// Navigation timeout in seconds (default: 60)
    pub navigation_timeout_secs: u64,

    /// Wait after opening the base page in milliseconds (default: 5000)
    pub initial_load_wait_ms: u64,

    /// How long to wait for the first results in seconds (default: 45)
    pub results_timeout_secs: u64,

    /// How long to wait for a listing's name to appear in seconds (default: 15)
    pub detail_timeout_secs: u64,

    /// Settle delay after each scroll in milliseconds (default: 3000)
    pub scroll_settle_ms: u64,

    /// Pause between scroll attempts in milliseconds (default: 500)
    pub scroll_pause_ms: u64,

    /// Settle delay after opening a listing in milliseconds (default: 2500)
    pub detail_settle_ms: u64,

    /// Pause between listings in milliseconds (default: 500)
    pub item_pause_ms: u64,

    /// Interval between condition checks while waiting, in milliseconds (default: 250)
    pub poll_interval_ms: u64,

    /// Upper bound on scroll attempts (default: 100)
    pub max_scroll_attempts: usize,

    /// Consecutive scrolls without new entries before the feed counts as exhausted (default: 5)
    pub max_no_new_results_streak: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            base_url: "https://www.google.com/maps".to_string(),
            query_template: "{category} em {location}".to_string(),
            navigation_timeout_secs: 60,
            initial_load_wait_ms: 5000,
            results_timeout_secs: 45,
            detail_timeout_secs: 15,
            scroll_settle_ms: 3000,
            scroll_pause_ms: 500,
            detail_settle_ms: 2500,
            item_pause_ms: 500,
            poll_interval_ms: 250,
            max_scroll_attempts: 100,
            max_no_new_results_streak: 5,
        }
    }
}

impl ScraperConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn initial_load_wait(&self) -> Duration {
        Duration::from_millis(self.initial_load_wait_ms)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_secs(self.results_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_millis(self.detail_settle_ms)
    }

    pub fn item_pause(&self) -> Duration {
        Duration::from_millis(self.item_pause_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Create a config optimized for speed (may miss slow-loading entries)
    pub fn fast() -> Self {
        Self {
            initial_load_wait_ms: 2000,
            results_timeout_secs: 20,
            detail_timeout_secs: 8,
            scroll_settle_ms: 1000,
            detail_settle_ms: 1000,
            max_scroll_attempts: 50,
            max_no_new_results_streak: 3,
            ..Default::default()
        }
    }

    /// Create a config optimized for coverage (slower)
    pub fn thorough() -> Self {
        Self {
            initial_load_wait_ms: 8000,
            results_timeout_secs: 90,
            detail_timeout_secs: 30,
            scroll_settle_ms: 4000,
            detail_settle_ms: 4000,
            max_scroll_attempts: 200,
            max_no_new_results_streak: 8,
            ..Default::default()
        }
    }
}

/// On-page queries, one ordered list per logical field.
///
/// A query starting with `/` or `(` is treated as XPath, anything else as CSS.
/// The first query that yields non-empty text wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub search_input: Vec<String>,
    pub results_ready: Vec<String>,
    pub feed_container: Vec<String>,
    pub candidate_links: Vec<String>,
    /// Substring an href must contain to count as a listing link
    pub candidate_href_marker: String,
    pub name: Vec<String>,
    pub category: Vec<String>,
    pub address: Vec<String>,
    pub phone: Vec<String>,
    pub website: Vec<String>,
    pub opening_hours: Vec<String>,
    pub introduction: Vec<String>,
    pub review_block: Vec<String>,
    /// Elements whose `aria-label` carries the review count
    pub review_count_label: Vec<String>,
    pub service_info: Vec<String>,
}

fn queries(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            search_input: queries(&["#searchboxinput", "input[name=\"q\"]"]),
            results_ready: queries(&[
                "//div[contains(@aria-label, \"Resultados para\")]",
                "//div[contains(@aria-label, \"Results for\")]",
                "//a[contains(@href, \"https://www.google.com/maps/place\")]",
            ]),
            feed_container: queries(&[
                "//div[contains(@aria-label, \"Resultados para\")]/..//div[@role=\"feed\"]",
                "div[role=\"feed\"]",
            ]),
            candidate_links: queries(&["//a[contains(@href, \"https://www.google.com/maps/place\")]"]),
            candidate_href_marker: "/maps/place".to_string(),
            name: queries(&[
                "//h1[contains(@class, \"DUwDvf\")]",
                "//h1[contains(@class, \"fontHeadlineLarge\")]",
            ]),
            category: queries(&["//button[contains(@jsaction, \"category\")]"]),
            address: queries(&[
                "//button[@data-item-id=\"address\"]//div[contains(@class, \"fontBodyMedium\")]",
            ]),
            phone: queries(&[
                "//button[contains(@data-item-id, \"phone:tel:\")]//div[contains(@class, \"fontBodyMedium\")]",
            ]),
            website: queries(&[
                "//a[@data-item-id=\"authority\"]//div[contains(@class, \"fontBodyMedium\")]",
            ]),
            opening_hours: queries(&[
                "//div[contains(@aria-label, \"Horário\")]",
                "//button[contains(@data-item-id, \"oh\")]",
            ]),
            introduction: queries(&[
                "//div[contains(@class, \"WeS02d\")]//div[contains(@class, \"PYvSYb\")]",
            ]),
            review_block: queries(&["//div[contains(@class, \"F7nice\")]"]),
            review_count_label: queries(&[
                "//div[contains(@class, \"F7nice\")]//span[contains(@aria-label, \"avaliaç\")]",
                "//div[contains(@class, \"F7nice\")]//span[contains(@aria-label, \"review\")]",
            ]),
            service_info: queries(&[
                "//div[contains(@class, \"LTs0Rc\")]",
                "//div[contains(@class, \"iP2t7d\")]",
            ]),
        }
    }
}

/// Keyword sets that switch on each service flag (case-insensitive substring match).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceKeywords {
    pub store_shopping: Vec<String>,
    pub in_store_pickup: Vec<String>,
    pub delivery: Vec<String>,
}

impl Default for ServiceKeywords {
    fn default() -> Self {
        Self {
            store_shopping: queries(&["compra", "shop"]),
            in_store_pickup: queries(&["retira", "pickup"]),
            delivery: queries(&["entrega", "delivery"]),
        }
    }
}

/// Everything one harvest run needs besides its search parameters.
#[derive(Debug, Clone, Default)]
pub struct HarvestSettings {
    pub scraper: ScraperConfig,
    pub selectors: SelectorConfig,
    pub keywords: ServiceKeywords,
}
