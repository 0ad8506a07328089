use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use forge_common::error::ForgeError;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions};
use image::imageops::FilterType;
use tracing::debug;

use super::VisualSnapshotter;

const THUMB_WIDTH: u32 = 150;
const THUMB_HEIGHT: u32 = 100;
const BROWSER_IDLE: Duration = Duration::from_secs(60);

/// One headless Chrome instance, launched lazily and reused across captures.
///
/// `headless_chrome` is synchronous, so all browser work happens on the
/// blocking pool.
#[derive(Default)]
pub struct ChromeSnapshotter {
    browser: Arc<Mutex<Option<Browser>>>,
}

impl ChromeSnapshotter {
    pub fn new() -> Self {
        Self::default()
    }

    fn browser(slot: &Mutex<Option<Browser>>) -> anyhow::Result<Browser> {
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(browser) = slot.as_ref() {
            return Ok(browser.clone());
        }

        let options = LaunchOptions::default_builder()
            .headless(true)
            .idle_browser_timeout(BROWSER_IDLE)
            .build()
            .map_err(|e| anyhow::anyhow!("browser launch options: {e}"))?;
        let browser = Browser::new(options)?;
        debug!("launched headless browser");
        *slot = Some(browser.clone());
        Ok(browser)
    }

    fn capture_sync(slot: &Mutex<Option<Browser>>, url: &str, output: &Path) -> anyhow::Result<()> {
        let browser: Browser = Self::browser(slot)?;

        let tab = match browser.new_tab() {
            Ok(tab) => tab,
            Err(e) => {
                // The browser may have died since the last capture.
                slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                return Err(e);
            }
        };

        let png: anyhow::Result<Vec<u8>> = tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .and_then(|tab| tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true));
        let _ = tab.close(true);

        image::load_from_memory(&png?)?
            .resize_exact(THUMB_WIDTH, THUMB_HEIGHT, FilterType::Lanczos3)
            .save(output)?;
        Ok(())
    }
}

#[async_trait]
impl VisualSnapshotter for ChromeSnapshotter {
    async fn capture(&self, url: &str, output: &Path) -> Result<(), ForgeError> {
        let slot = Arc::clone(&self.browser);
        let target: String = url.to_string();
        let output: PathBuf = output.to_path_buf();

        tokio::task::spawn_blocking(move || Self::capture_sync(&slot, &target, &output))
            .await
            .map_err(|e| ForgeError::capture(url, e))?
            .map_err(|e| ForgeError::capture(url, e))
    }
}
