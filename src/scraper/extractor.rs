use crate::domain::ServiceFlags;
use crate::scraper::config::ServiceKeywords;
use crate::scraper::driver::PageDriver;

/// Field extractor over a configurable, ordered query list per field
pub struct FieldExtractor {
    keywords: ServiceKeywords,
}

impl FieldExtractor {
    pub fn new(keywords: ServiceKeywords) -> Self {
        Self { keywords }
    }

    /// Try each query in order and return the first non-empty text.
    ///
    /// `None` means the field is unavailable. Driver errors are logged and
    /// treated like a miss so one bad field never sinks the record.
    pub async fn extract<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        field: &str,
        queries: &[String],
    ) -> Option<String> {
        for query in queries {
            match driver.texts(query).await {
                Ok(texts) => {
                    if let Some(text) = texts.into_iter().find(|t| !t.trim().is_empty()) {
                        return Some(text.trim().to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(field, query = query.as_str(), "Extraction failed: {}", e);
                }
            }
        }
        tracing::debug!(field, "Field unavailable");
        None
    }

    /// First value of attribute `name` across `queries`.
    pub async fn extract_attribute<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        queries: &[String],
        name: &str,
    ) -> Option<String> {
        for query in queries {
            match driver.attributes(query, name).await {
                Ok(values) => {
                    if let Some(v) = values.into_iter().find(|v| !v.trim().is_empty()) {
                        return Some(v);
                    }
                }
                Err(e) => tracing::warn!(query = query.as_str(), "Attribute read failed: {}", e),
            }
        }
        None
    }

    /// Scan every informational element for service keywords.
    pub async fn service_flags<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        queries: &[String],
    ) -> ServiceFlags {
        let mut texts = Vec::new();
        for query in queries {
            match driver.texts(query).await {
                Ok(found) => texts.extend(found),
                Err(e) => tracing::warn!(query = query.as_str(), "Service info read failed: {}", e),
            }
        }
        self.match_services(&texts)
    }

    /// Case-insensitive substring match of `texts` against the keyword sets.
    pub fn match_services(&self, texts: &[String]) -> ServiceFlags {
        let mut flags = ServiceFlags::default();
        for text in texts {
            let text = text.to_lowercase();
            flags.store_shopping |= contains_any(&text, &self.keywords.store_shopping);
            flags.in_store_pickup |= contains_any(&text, &self.keywords.in_store_pickup);
            flags.delivery |= contains_any(&text, &self.keywords.delivery);
        }
        flags
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .filter(|n| !n.is_empty())
        .any(|n| haystack.contains(&n.to_lowercase()))
}
