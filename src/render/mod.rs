//! Landing-page rendering and share-link extraction.

mod http;

pub use http::HttpPageRenderer;

use anyhow::Result;
use scenegrab_common::paths::has_media_marker;
use std::sync::Arc;
use std::time::Duration;

/// Capability that turns a landing page into its raw share-link block.
#[async_trait::async_trait]
pub trait PageRenderer: Send + Sync {
    /// Lines of the page's share-link block, or `None` when the block does
    /// not appear within `wait_budget`.
    async fn render_and_extract(&self, uri: &str, wait_budget: Duration) -> Result<Option<Vec<String>>>;
}

/// Share-link lookup for accepted releases.
pub struct LinkResolver {
    renderer: Arc<dyn PageRenderer>,
    wait_budget: Duration,
}

impl LinkResolver {
    pub fn new(renderer: Arc<dyn PageRenderer>, wait_budget: Duration) -> Self {
        Self {
            renderer,
            wait_budget,
        }
    }

    /// Media share-links on the page at `uri`.
    ///
    /// Render failures and missing blocks give an empty list.
    pub async fn resolve(&self, uri: &str) -> Vec<String> {
        match self.renderer.render_and_extract(uri, self.wait_budget).await {
            Ok(Some(lines)) => {
                let links: Vec<String> = lines.into_iter().filter(|l| has_media_marker(l)).collect();
                tracing::debug!("Found {} media links on {}", links.len(), uri);
                links
            }
            Ok(None) => {
                tracing::warn!("No link block on {}", uri);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to render {}: {:#}", uri, e);
                Vec::new()
            }
        }
    }
}
