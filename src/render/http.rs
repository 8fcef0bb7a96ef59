use super::PageRenderer;
use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h4.links").unwrap());

/// Renders landing pages with a plain HTTP fetch.
///
/// The share-link block is the first `pre.links` sibling following an
/// `h4.links` heading whose text contains `label`.
pub struct HttpPageRenderer {
    client: Client,
    label: String,
}

impl HttpPageRenderer {
    pub fn new(client: Client, label: impl Into<String>) -> Self {
        Self {
            client,
            label: label.into(),
        }
    }

    async fn fetch(&self, uri: &str) -> Result<String> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .context(format!("Failed to GET {}", uri))?
            .error_for_status()
            .context(format!("Bad status from {}", uri))?;

        response.text().await.context("Failed to read page body")
    }
}

#[async_trait::async_trait]
impl PageRenderer for HttpPageRenderer {
    async fn render_and_extract(&self, uri: &str, wait_budget: Duration) -> Result<Option<Vec<String>>> {
        let html = match tokio::time::timeout(wait_budget, self.fetch(uri)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::debug!("Render of {} exceeded {:?}", uri, wait_budget);
                return Ok(None);
            }
        };

        Ok(extract_link_block(&html, &self.label))
    }
}

/// Non-empty trimmed lines of the labelled link block.
pub(crate) fn extract_link_block(html: &str, label: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);

    let block = document
        .select(&HEADING_SELECTOR)
        .filter(|heading| heading.text().collect::<String>().contains(label))
        .find_map(|heading| {
            heading
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "pre" && el.value().classes().any(|c| c == "links"))
        })?;

    let text: String = block.text().collect();
    Some(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
