//! Chromium-based renderer using chromiumoxide.

use super::{RenderedDocument, Renderer};
use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// How long Chromium gets to acknowledge close and exit before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Desktop Chrome user agent presented to the target site.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Find the Chromium binary path.
///
/// Returns `None` when nothing is found, in which case chromiumoxide falls
/// back to its own detection.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Configured path
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!("configured Chromium {} does not exist", path.display());
    }

    // 2. SPAWN_TRACKER_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("SPAWN_TRACKER_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Renders pages in a headless Chromium launched fresh for every call.
pub struct ChromiumRenderer {
    chromium_path: Option<PathBuf>,
    settle: Duration,
    navigation_timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            chromium_path: config.chromium_path.clone(),
            settle: config.settle,
            navigation_timeout: config.navigation_timeout,
        }
    }

    async fn launch(&self) -> TrackerResult<(Browser, JoinHandle<()>)> {
        let user_agent = format!("--user-agent={USER_AGENT}");

        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(user_agent.as_str());
        if let Some(path) = find_chromium(self.chromium_path.as_deref()) {
            tracing::info!("Using Chromium at {}", path.display());
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| TrackerError::Fetch(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| TrackerError::Fetch(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            // Event errors are per-message; keep polling until the connection ends.
            while handler.next().await.is_some() {}
        });

        Ok((browser, handler_task))
    }

    /// Navigate, wait for client-side rendering, and read the markup.
    async fn capture(&self, browser: &Browser, url: &str) -> TrackerResult<String> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| TrackerError::Fetch(format!("failed to create new page: {e}")))?;

        let start = Instant::now();
        let result = async {
            match tokio::time::timeout(self.navigation_timeout, page.goto(url)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(TrackerError::Fetch(format!("navigation failed: {e}"))),
                Err(_) => {
                    return Err(TrackerError::Fetch(format!(
                        "navigation timed out after {}ms",
                        self.navigation_timeout.as_millis()
                    )))
                }
            }
            tracing::info!("Loaded {url} in {}ms", start.elapsed().as_millis());

            tokio::time::sleep(self.settle).await;

            page.evaluate("document.documentElement.outerHTML")
                .await
                .map_err(|e| TrackerError::Fetch(format!("failed to get HTML: {e}")))?
                .into_value::<String>()
                .map_err(|e| TrackerError::Fetch(format!("failed to convert HTML result: {e:?}")))
        }
        .await;

        if let Err(e) = page.close().await {
            tracing::warn!("failed to close page: {e}");
        }
        result
    }
}

/// The parts of a browser session needed to release it.
#[async_trait]
trait BrowserProcess: Send {
    async fn close(&mut self) -> Result<(), String>;
    async fn wait(&mut self) -> std::io::Result<()>;
    async fn kill(&mut self) -> Option<std::io::Result<()>>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<(), String> {
        Browser::close(self)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn wait(&mut self) -> std::io::Result<()> {
        Browser::wait(self).await.map(|_| ())
    }

    async fn kill(&mut self) -> Option<std::io::Result<()>> {
        Browser::kill(self).await
    }
}

/// Ask the browser to close and reap it, killing it if it does not exit
/// within `grace` or the close command cannot be delivered.
async fn release<P: BrowserProcess>(process: &mut P, grace: Duration) {
    let closed = match tokio::time::timeout(grace, process.close()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!("failed to close Chromium: {e}");
            false
        }
        Err(_) => {
            tracing::warn!("Chromium did not acknowledge close within {}ms", grace.as_millis());
            false
        }
    };

    if closed {
        match tokio::time::timeout(grace, process.wait()).await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => tracing::warn!("failed to wait for Chromium exit: {e}"),
            Err(_) => tracing::warn!("Chromium did not exit within {}ms", grace.as_millis()),
        }
    }

    if let Some(Err(e)) = process.kill().await {
        tracing::warn!("failed to kill Chromium: {e}");
    }
}

/// Release the browser and stop the CDP handler.
async fn shutdown(mut browser: Browser, handler_task: JoinHandle<()>) {
    release(&mut browser, EXIT_GRACE).await;
    handler_task.abort();
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> TrackerResult<RenderedDocument> {
        let (browser, handler_task) = self.launch().await?;

        let result = self.capture(&browser, url).await;
        shutdown(browser, handler_task).await;

        Ok(RenderedDocument {
            url: url.to_string(),
            html: result?,
        })
    }
}
