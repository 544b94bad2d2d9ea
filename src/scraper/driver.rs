use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::app::Result;

/// How a query string is resolved on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Css,
    XPath,
}

impl QueryKind {
    pub fn of(query: &str) -> Self {
        let q = query.trim_start();
        if q.starts_with('/') || q.starts_with('(') {
            QueryKind::XPath
        } else {
            QueryKind::Css
        }
    }
}

/// What a scroll command was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    /// The dedicated scrollable results container
    Feed,
    /// Fallback: the whole page
    Page,
}

/// Page automation capabilities the traversal needs.
///
/// Lookups that match nothing return empty results rather than errors; an
/// `Err` means the browser itself misbehaved.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the page to `url` and wait for the load event
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Type `text` into the element matched by `input_query` and press Enter
    async fn submit_search(&self, input_query: &str, text: &str) -> Result<()>;

    /// Whether at least one element matches `query`
    async fn exists(&self, query: &str) -> Result<bool>;

    /// Trimmed inner text of every element matching `query`, in document order
    async fn texts(&self, query: &str) -> Result<Vec<String>>;

    /// Value of attribute `name` on every matching element that has it
    async fn attributes(&self, query: &str, name: &str) -> Result<Vec<String>>;

    /// Scroll the first matching container to its bottom, or the page if none matches
    async fn scroll_feed(&self, containers: &[String]) -> Result<ScrollTarget>;

    /// Poll until any of `queries` matches. Returns `false` on timeout.
    async fn wait_for_any(
        &self,
        queries: &[String],
        timeout: Duration,
        poll: Duration,
    ) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            for query in queries {
                if self.exists(query).await? {
                    return Ok(true);
                }
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Submit through the first input query that is present on the page.
    async fn submit_first(&self, input_queries: &[String], text: &str) -> Result<()> {
        for query in input_queries {
            if self.exists(query).await? {
                return self.submit_search(query, text).await;
            }
        }
        Err(crate::app::HarvestError::Browser(
            "search input not found".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_kind() {
        assert_eq!(QueryKind::of("//h1"), QueryKind::XPath);
        assert_eq!(QueryKind::of("(//a)[1]"), QueryKind::XPath);
        assert_eq!(QueryKind::of("  //div"), QueryKind::XPath);
        assert_eq!(QueryKind::of("div[role=\"feed\"]"), QueryKind::Css);
        assert_eq!(QueryKind::of("#searchboxinput"), QueryKind::Css);
    }
}
