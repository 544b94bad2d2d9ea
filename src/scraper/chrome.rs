use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::app::{HarvestError, Result};
use crate::scraper::config::ScraperConfig;
use crate::scraper::driver::{PageDriver, QueryKind, ScrollTarget};

/// One browser process with a single page, driven sequentially.
///
/// Call [`BrowserSession::close`] when done; dropping the session without
/// closing still kills the child process but skips the graceful shutdown.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    config: ScraperConfig,
}

impl BrowserSession {
    /// Launch Chrome and open a blank page
    pub async fn launch(config: ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .request_timeout(config.navigation_timeout());

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| HarvestError::browser("Failed to build browser config", e))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            HarvestError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(HarvestError::browser("Failed to create page", e));
            }
        };

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| HarvestError::browser("Failed to set user agent", e))?;
        }

        tracing::info!(headless = config.headless, "Browser session started");

        Ok(Self {
            browser,
            page,
            handler,
            config,
        })
    }

    /// Close the page and the browser, then stop the event handler
    pub async fn close(mut self) {
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!("Page close error: {}", e);
        }
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser close error: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser wait error: {}", e);
        }
        self.handler.abort();
        tracing::info!("Browser session closed");
    }

    /// Resolve a CSS or XPath query. Lookup failures count as "no match".
    async fn elements(&self, query: &str) -> Vec<Element> {
        let found = match QueryKind::of(query) {
            QueryKind::Css => self.page.find_elements(query).await,
            QueryKind::XPath => self.page.find_xpaths(query).await,
        };
        found.unwrap_or_else(|e| {
            tracing::debug!(query, "Lookup matched nothing: {}", e);
            Vec::new()
        })
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        tokio::time::timeout(self.config.navigation_timeout(), self.page.goto(url))
            .await
            .map_err(|_| HarvestError::Browser(format!("Navigation to {} timed out", url)))?
            .map_err(|e| HarvestError::browser("Navigation failed", e))?;
        Ok(())
    }

    async fn submit_search(&self, input_query: &str, text: &str) -> Result<()> {
        let input = self
            .elements(input_query)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| HarvestError::Browser(format!("No element for {}", input_query)))?;

        input
            .click()
            .await
            .map_err(|e| HarvestError::browser("Failed to focus search input", e))?;
        input
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(|e| HarvestError::browser("Failed to clear search input", e))?;
        input
            .type_str(text)
            .await
            .map_err(|e| HarvestError::browser("Failed to type query", e))?;
        input
            .press_key("Enter")
            .await
            .map_err(|e| HarvestError::browser("Failed to submit query", e))?;
        Ok(())
    }

    async fn exists(&self, query: &str) -> Result<bool> {
        Ok(!self.elements(query).await.is_empty())
    }

    async fn texts(&self, query: &str) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        for element in self.elements(query).await {
            match element.inner_text().await {
                Ok(Some(text)) => texts.push(text.trim().to_string()),
                Ok(None) => {}
                Err(e) => tracing::debug!(query, "Failed to read text: {}", e),
            }
        }
        Ok(texts)
    }

    async fn attributes(&self, query: &str, name: &str) -> Result<Vec<String>> {
        let mut values = Vec::new();
        for element in self.elements(query).await {
            match element.attribute(name).await {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {}
                Err(e) => tracing::debug!(query, name, "Failed to read attribute: {}", e),
            }
        }
        Ok(values)
    }

    async fn scroll_feed(&self, containers: &[String]) -> Result<ScrollTarget> {
        for query in containers {
            if let Some(feed) = self.elements(query).await.into_iter().next() {
                feed.call_js_fn("function() { this.scrollTop = this.scrollHeight; }", false)
                    .await
                    .map_err(|e| HarvestError::browser("Failed to scroll feed", e))?;
                return Ok(ScrollTarget::Feed);
            }
        }

        self.page
            .evaluate("window.scrollBy(0, 10000)")
            .await
            .map_err(|e| HarvestError::browser("Failed to scroll page", e))?;
        Ok(ScrollTarget::Page)
    }
}
