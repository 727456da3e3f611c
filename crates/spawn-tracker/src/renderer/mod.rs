//! Renderer abstraction for producing a page's rendered markup.
//!
//! The pipeline only depends on the `Renderer` capability, so extraction and
//! persistence can run against fixture markup without launching a browser.

pub mod chromium;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{TrackerError, TrackerResult};

/// Markup captured from one render. Lives only for the duration of a run.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// The URL that was rendered.
    pub url: String,
    /// `document.documentElement.outerHTML` after the settle wait.
    pub html: String,
}

/// Something that can turn a URL into rendered markup.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `url` and return its markup, releasing any session it opened.
    async fn render(&self, url: &str) -> TrackerResult<RenderedDocument>;
}

/// Replays markup saved by an earlier run instead of launching a browser.
pub struct SnapshotRenderer {
    path: PathBuf,
}

impl SnapshotRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Renderer for SnapshotRenderer {
    async fn render(&self, url: &str) -> TrackerResult<RenderedDocument> {
        let html = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            TrackerError::Fetch(format!(
                "failed to read snapshot {}: {e}",
                self.path.display()
            ))
        })?;
        tracing::info!("Replaying {} for {url}", self.path.display());

        Ok(RenderedDocument {
            url: url.to_string(),
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_snapshot_renderer_returns_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html><body>42</body></html>").unwrap();

        let doc = SnapshotRenderer::new(&path)
            .render("https://example.com")
            .await
            .unwrap();
        assert_eq!(doc.url, "https://example.com");
        assert!(doc.html.contains("42"));
    }

    #[tokio::test]
    async fn test_snapshot_renderer_missing_file_is_fetch_error() {
        let dir = TempDir::new().unwrap();
        let renderer = SnapshotRenderer::new(dir.path().join("absent.html"));

        let err = renderer.render("https://example.com").await.unwrap_err();
        assert!(matches!(err, TrackerError::Fetch(_)));
    }
}
