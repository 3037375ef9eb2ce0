//! Automation driver seam.
//!
//! The booking flow never talks to a browser directly. It drives a [`Page`]
//! obtained from a [`SessionFactory`], so the backend (a headless browser, an
//! HTTP replay, or a scripted fake in tests) can be swapped without touching
//! the flow itself.
//!
//! # Components
//!
//! - [`Locator`]: chained selector description, resolved by the backend
//! - [`Page`]: navigation, form interaction, element queries and screenshots
//!   against one isolated session
//! - [`SessionFactory`]: opens a brand-new, fully isolated session per call
//! - [`SessionOptions`]: headless mode, locale and time zone of every session
//! - [`filter_by_text`] / [`first_visible`]: runtime disambiguation helpers for
//!   layouts that render the same control once per breakpoint
//!
//! The Playwright backend lives in [`playwright`] behind the `playwright`
//! cargo feature.

pub mod locator;
#[cfg(feature = "playwright")]
pub mod playwright;
#[cfg(test)]
pub(crate) mod testing;

pub use locator::{Locator, Segment};

use crate::models::SiteSettings;
use async_trait::async_trait;
use camino::Utf8Path;
use chrono_tz::Tz;
use std::time::Duration;
use thiserror::Error;

/// Faults raised by a driver backend.
///
/// Display strings must keep the words the transient-failure check matches on
/// ("timeout", "navigation", "connection", "network", "element not found",
/// "element is not visible").
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Timeout after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element is not visible: {0}")]
    NotVisible(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("{0}")]
    Other(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// How every session of a run is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub headless: bool,
    /// Browser locale; the site renders day names in it
    pub locale: String,
    /// IANA zone the browser reports to the site
    pub timezone_id: String,
}

impl SessionOptions {
    pub fn new(settings: &SiteSettings, zone: Tz, headless: bool) -> Self {
        Self {
            headless,
            locale: settings.locale.clone(),
            timezone_id: zone.name().to_string(),
        }
    }
}

/// One isolated, interactive session against the booking site.
///
/// Every method that talks to the remote page is a suspension point. Methods
/// that act on a [`Locator`] act on its first match unless the locator was
/// narrowed with [`Locator::nth`].
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate and return once the page is idle
    async fn goto(&self, url: &str) -> DriverResult<()>;

    /// Return once no navigation or DOM update is in flight. Does not time
    /// out on its own.
    async fn wait_for_idle(&self) -> DriverResult<()>;

    async fn fill(&self, locator: &Locator, value: &str) -> DriverResult<()>;

    /// Scroll into view if needed, then click
    async fn click(&self, locator: &Locator) -> DriverResult<()>;

    /// Click a control that submits the page, then return once the browser
    /// has navigated away and the new page is idle.
    ///
    /// Fails with [`DriverError::Timeout`] if no navigation completes within
    /// `timeout`.
    async fn click_and_wait_for_navigation(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> DriverResult<()>;

    async fn count(&self, locator: &Locator) -> DriverResult<usize>;

    async fn text_content(&self, locator: &Locator) -> DriverResult<Option<String>>;

    async fn is_visible(&self, locator: &Locator) -> DriverResult<bool>;

    /// Wait until at least one element matches
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

    /// Visible text of the whole page
    async fn page_text(&self) -> DriverResult<String>;

    /// Full-page screenshot written to `path`
    async fn screenshot(&self, path: &Utf8Path) -> DriverResult<()>;

    /// Release the session and everything it holds
    async fn close(&self) -> DriverResult<()>;
}

/// Opens fresh sessions.
///
/// Each call must return a session that shares no state (cookies, storage,
/// navigation history) with any previously opened one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> DriverResult<Box<dyn Page>>;
}

#[async_trait]
impl<T: SessionFactory + ?Sized> SessionFactory for Box<T> {
    async fn open(&self) -> DriverResult<Box<dyn Page>> {
        (**self).open().await
    }
}

/// Every element matched by `base` whose text content satisfies `keep`,
/// as individually narrowed locators in document order.
pub async fn filter_by_text<F>(
    page: &dyn Page,
    base: &Locator,
    keep: F,
) -> DriverResult<Vec<Locator>>
where
    F: Fn(&str) -> bool + Sync,
{
    let count = page.count(base).await?;
    let mut matches = Vec::new();

    for index in 0..count {
        let candidate = base.clone().nth(index);
        let text = page.text_content(&candidate).await?.unwrap_or_default();
        if keep(&text) {
            matches.push(candidate);
        }
    }

    Ok(matches)
}

/// First candidate that is currently visible.
///
/// Responsive layouts render duplicates of the same control for different
/// breakpoints; only one of them is visible at a time.
pub async fn first_visible(
    page: &dyn Page,
    candidates: &[Locator],
) -> DriverResult<Option<Locator>> {
    for candidate in candidates {
        if page.is_visible(candidate).await? {
            return Ok(Some(candidate.clone()));
        }
    }
    Ok(None)
}
