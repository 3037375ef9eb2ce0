use super::{DriverResult, Locator, Page};
use async_trait::async_trait;
use camino::Utf8Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Empty page that only counts how often it was closed
pub(crate) struct CountingPage {
    closes: Arc<AtomicUsize>,
}

impl CountingPage {
    pub(crate) fn new(closes: &Arc<AtomicUsize>) -> Self {
        Self {
            closes: Arc::clone(closes),
        }
    }
}

#[async_trait]
impl Page for CountingPage {
    async fn goto(&self, _url: &str) -> DriverResult<()> {
        Ok(())
    }

    async fn wait_for_idle(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn fill(&self, _locator: &Locator, _value: &str) -> DriverResult<()> {
        Ok(())
    }

    async fn click(&self, _locator: &Locator) -> DriverResult<()> {
        Ok(())
    }

    async fn click_and_wait_for_navigation(
        &self,
        _locator: &Locator,
        _timeout: Duration,
    ) -> DriverResult<()> {
        Ok(())
    }

    async fn count(&self, _locator: &Locator) -> DriverResult<usize> {
        Ok(0)
    }

    async fn text_content(&self, _locator: &Locator) -> DriverResult<Option<String>> {
        Ok(None)
    }

    async fn is_visible(&self, _locator: &Locator) -> DriverResult<bool> {
        Ok(false)
    }

    async fn wait_for(&self, _locator: &Locator, _timeout: Duration) -> DriverResult<()> {
        Ok(())
    }

    async fn page_text(&self) -> DriverResult<String> {
        Ok(String::new())
    }

    async fn screenshot(&self, _path: &Utf8Path) -> DriverResult<()> {
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
