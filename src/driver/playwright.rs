//! Playwright backend for the automation driver.
//!
//! Every session launches its own Chromium instance with a fresh context
//! pinned to the configured locale and time zone, so nothing (cookies,
//! storage, history) survives from one attempt to the next. Closing the
//! session closes the browser.

use super::{DriverError, DriverResult, Locator, Page, SessionFactory, SessionOptions};
use async_trait::async_trait;
use camino::Utf8Path;
use playwright_rs::api::LaunchOptions;
use playwright_rs::protocol::{
    Browser, BrowserContextOptions, GotoOptions, Locator as PwLocator, Page as PwPage,
    Playwright, ScreenshotOptions, WaitUntil,
};
use std::time::Duration;

/// Poll interval used while waiting on the page
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the document must stay unchanged, with no new network
/// responses, before the page counts as idle
const IDLE_QUIET: Duration = Duration::from_millis(500);

/// Load state, address and finished resource count of the current document
const PAGE_STATE_EXPR: &str = "`${document.readyState}|${window.location.href}|${performance.getEntriesByType('resource').length}`";

fn driver_error(context: &str, err: impl std::fmt::Display) -> DriverError {
    DriverError::Other(format!("{}: {}", context, err))
}

/// Launches one Chromium browser per session
pub struct PlaywrightSessionFactory {
    playwright: Playwright,
    options: SessionOptions,
}

impl PlaywrightSessionFactory {
    /// Start the Playwright driver server
    pub async fn launch(options: SessionOptions) -> DriverResult<Self> {
        let playwright = Playwright::launch()
            .await
            .map_err(|e| DriverError::Connection(format!("failed to start Playwright: {}", e)))?;

        tracing::info!(
            "Playwright driver started (headless: {}, locale: {}, zone: {})",
            options.headless,
            options.locale,
            options.timezone_id
        );
        Ok(Self {
            playwright,
            options,
        })
    }

    async fn open_page(&self, browser: &Browser) -> DriverResult<PwPage> {
        let context_options = BrowserContextOptions::builder()
            .locale(self.options.locale.clone())
            .timezone_id(self.options.timezone_id.clone())
            .build();

        let context = browser
            .new_context_with_options(context_options)
            .await
            .map_err(|e| DriverError::Session(format!("failed to create context: {}", e)))?;

        context
            .new_page()
            .await
            .map_err(|e| DriverError::Session(format!("failed to open page: {}", e)))
    }
}

#[async_trait]
impl SessionFactory for PlaywrightSessionFactory {
    async fn open(&self) -> DriverResult<Box<dyn Page>> {
        let launch_options = LaunchOptions::default().headless(self.options.headless);

        let browser = self
            .playwright
            .chromium()
            .launch_with_options(launch_options)
            .await
            .map_err(|e| DriverError::Session(format!("failed to launch Chromium: {}", e)))?;

        let page = match self.open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::warn!("Failed to close browser after page error: {}", close_err);
                }
                return Err(e);
            }
        };

        tracing::debug!("Opened browser session ({} {})", browser.name(), browser.version());
        Ok(Box::new(PlaywrightPage { browser, page }))
    }
}

/// One browser with a single page
pub struct PlaywrightPage {
    browser: Browser,
    page: PwPage,
}

impl PlaywrightPage {
    async fn resolve(&self, locator: &Locator) -> PwLocator {
        let mut segments = locator.segments().iter();

        // Locators always carry at least one segment
        let first = segments
            .next()
            .map(|s| (s.selector.as_str(), s.nth))
            .unwrap_or(("body", None));

        let mut current = self.page.locator(first.0).await;
        if let Some(index) = first.1 {
            current = current.nth(index.try_into().unwrap_or(0));
        }

        for segment in segments {
            current = current.locator(&segment.selector);
            if let Some(index) = segment.nth {
                current = current.nth(index.try_into().unwrap_or(0));
            }
        }

        current
    }

    async fn current_url(&self) -> String {
        self.page
            .evaluate_value("window.location.href")
            .await
            .unwrap_or_else(|_| self.page.url())
    }

    /// Empty while the execution context is being replaced by a navigation
    async fn page_state(&self) -> String {
        self.page
            .evaluate_value(PAGE_STATE_EXPR)
            .await
            .unwrap_or_default()
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        let options = GotoOptions {
            wait_until: Some(WaitUntil::NetworkIdle),
            ..Default::default()
        };

        self.page
            .goto(url, Some(options))
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn wait_for_idle(&self) -> DriverResult<()> {
        let mut last = String::new();
        let mut quiet_since = tokio::time::Instant::now();

        loop {
            let state = self.page_state().await;
            if state != last {
                last = state;
                quiet_since = tokio::time::Instant::now();
            } else if last.starts_with("complete|") && quiet_since.elapsed() >= IDLE_QUIET {
                return Ok(());
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn fill(&self, locator: &Locator, value: &str) -> DriverResult<()> {
        self.resolve(locator)
            .await
            .fill(value, None)
            .await
            .map_err(|e| driver_error(&format!("fill {}", locator), e))
    }

    async fn click(&self, locator: &Locator) -> DriverResult<()> {
        self.resolve(locator)
            .await
            .click(None)
            .await
            .map_err(|e| driver_error(&format!("click {}", locator), e))
    }

    async fn click_and_wait_for_navigation(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> DriverResult<()> {
        let before = self.current_url().await;
        self.click(locator).await?;

        let navigated = async {
            while self.current_url().await == before {
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
            self.wait_for_idle().await
        };

        tokio::time::timeout(timeout, navigated)
            .await
            .map_err(|_| DriverError::Timeout {
                what: format!("navigation after clicking {}", locator),
                timeout,
            })?
    }

    async fn count(&self, locator: &Locator) -> DriverResult<usize> {
        let count = self
            .resolve(locator)
            .await
            .count()
            .await
            .map_err(|e| driver_error(&format!("count {}", locator), e))?;
        Ok(count as usize)
    }

    async fn text_content(&self, locator: &Locator) -> DriverResult<Option<String>> {
        self.resolve(locator)
            .await
            .text_content()
            .await
            .map_err(|e| driver_error(&format!("text of {}", locator), e))
    }

    async fn is_visible(&self, locator: &Locator) -> DriverResult<bool> {
        self.resolve(locator)
            .await
            .is_visible()
            .await
            .map_err(|e| driver_error(&format!("visibility of {}", locator), e))
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.count(locator).await? > 0 {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    what: locator.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn page_text(&self) -> DriverResult<String> {
        self.page
            .locator("body")
            .await
            .inner_text()
            .await
            .map_err(|e| driver_error("read page text", e))
    }

    async fn screenshot(&self, path: &Utf8Path) -> DriverResult<()> {
        let options = ScreenshotOptions {
            full_page: Some(true),
            ..Default::default()
        };

        let bytes = self
            .page
            .screenshot(Some(options))
            .await
            .map_err(|e| DriverError::Screenshot(e.to_string()))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| DriverError::Screenshot(format!("{}: {}", path, e)))
    }

    async fn close(&self) -> DriverResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| DriverError::Session(format!("failed to close browser: {}", e)))
    }
}
