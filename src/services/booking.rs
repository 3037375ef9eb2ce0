use crate::driver::{self, DriverError, DriverResult, Locator, Page};
use crate::models::{AttemptOutcome, SiteSettings, TargetConfig};
use crate::services::classifier::{Classification, OutcomeClassifier, is_retryable_error};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Member credentials for the booking site
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Faults raised while booking a single class
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Could not find {name} class at {time_slot} on {day_name}")]
    TargetNotFound {
        name: String,
        time_slot: String,
        day_name: String,
    },

    #[error("Found {0} matching class block(s) but none were visible")]
    NotInteractable(usize),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Runs one registration attempt on an already opened session.
///
/// Implementations never fail: every fault is folded into the returned
/// [`AttemptOutcome`].
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, page: &dyn Page, target: &TargetConfig) -> AttemptOutcome;
}

/// Best-effort diagnostic screenshots, one file per class and step
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: Utf8PathBuf,
    enabled: bool,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<Utf8PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(".", false)
    }

    /// Path of the snapshot for `target_id` at `step`
    pub fn path_for(&self, target_id: &str, step: &str) -> Utf8PathBuf {
        self.dir.join(format!("{}-{}.png", target_id, step))
    }

    /// Capture a screenshot. Failures are logged and otherwise ignored.
    pub async fn capture(&self, page: &dyn Page, target_id: &str, step: &str) {
        if !self.enabled {
            return;
        }

        let path = self.path_for(target_id, step);
        match page.screenshot(&path).await {
            Ok(()) => tracing::debug!("Screenshot saved: {}", path),
            Err(e) => tracing::warn!("Could not save screenshot {}: {}", path, e),
        }
    }
}

/// Books one class on the member portal.
///
/// The flow for one attempt:
/// 1. Log in with the configured credentials
/// 2. Open the lessons schedule
/// 3. Advance the schedule one period (whichever "next" control is visible)
/// 4. Find the lesson block: inside the matching day section first, then
///    anywhere on the page; pick the first visible match
/// 5. Open the lesson and wait for the register button
/// 6. Click register
/// 7. Classify the resulting page text
///
/// A screenshot is taken at every step. Any fault is caught, screenshotted,
/// and turned into a failed outcome whose retryability depends on the fault
/// message.
pub struct BookingEngine {
    settings: SiteSettings,
    credentials: Credentials,
    classifier: OutcomeClassifier,
    snapshots: SnapshotWriter,
}

impl BookingEngine {
    /// Build an engine, compiling the outcome patterns from `settings`
    pub fn new(settings: SiteSettings, credentials: Credentials) -> Result<Self, regex::Error> {
        let classifier = OutcomeClassifier::new(&settings.patterns)?;
        let snapshots = SnapshotWriter::new(
            settings.snapshot_dir.clone(),
            settings.snapshots_enabled,
        );
        Ok(Self::with_parts(settings, credentials, classifier, snapshots))
    }

    pub fn with_parts(
        settings: SiteSettings,
        credentials: Credentials,
        classifier: OutcomeClassifier,
        snapshots: SnapshotWriter,
    ) -> Self {
        Self {
            settings,
            credentials,
            classifier,
            snapshots,
        }
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    /// Fail with a timeout if `op` outlasts the default timeout
    async fn bounded<T>(
        &self,
        what: &str,
        op: impl Future<Output = DriverResult<T>>,
    ) -> DriverResult<T> {
        let limit = self.settings.default_timeout();
        tokio::time::timeout(limit, op)
            .await
            .map_err(|_| DriverError::Timeout {
                what: what.to_string(),
                timeout: limit,
            })?
    }

    async fn login(&self, page: &dyn Page) -> Result<(), BookingError> {
        let selectors = &self.settings.selectors;

        tracing::info!("Step 1: Logging in as {}...", self.credentials.email);
        self.bounded("login page", page.goto(&self.settings.login_url))
            .await?;
        page.fill(&Locator::new(&selectors.email_input), &self.credentials.email)
            .await?;
        page.fill(
            &Locator::new(&selectors.password_input),
            &self.credentials.password,
        )
        .await?;
        // the next navigation would abort a login still in flight
        page.click_and_wait_for_navigation(
            &Locator::new(&selectors.login_submit),
            self.settings.default_timeout(),
        )
        .await?;

        tracing::info!("Login successful");
        Ok(())
    }

    /// Click the visible "next period" control, if the layout has one
    async fn advance_period(&self, page: &dyn Page) -> Result<(), BookingError> {
        let buttons = Locator::new(&self.settings.selectors.next_period);
        let count = page.count(&buttons).await?;

        if count == 0 {
            tracing::info!("No next week button found, assuming already on correct week");
            return Ok(());
        }

        let candidates: Vec<Locator> = (0..count).map(|i| buttons.clone().nth(i)).collect();
        match driver::first_visible(page, &candidates).await? {
            Some(button) => {
                page.click(&button).await?;
                settle(self.settings.period_settle_ms).await;
                self.bounded("next week", page.wait_for_idle()).await?;
                settle(self.settings.period_extra_settle_ms).await;
                tracing::info!("Navigated to next week");
            }
            None => {
                tracing::warn!(
                    "Found {} next week button(s) but none were visible, staying on current week",
                    count
                );
            }
        }

        Ok(())
    }

    /// Locate the first visible lesson block for `target`
    async fn locate_target(
        &self,
        page: &dyn Page,
        target: &TargetConfig,
    ) -> Result<Locator, BookingError> {
        let selectors = &self.settings.selectors;
        let is_target = |text: &str| {
            contains_text(text, &target.name) && contains_text(text, &target.time_slot)
        };

        let headings = Locator::new(&selectors.day_heading);
        let heading_count = page.count(&headings).await?;
        tracing::debug!("Found {} total day headers", heading_count);

        let mut matches = Vec::new();
        for index in 0..heading_count {
            let heading = headings.clone().nth(index);
            let heading_text = page.text_content(&heading).await?.unwrap_or_default();
            if heading_text.trim().to_lowercase() != target.day_name.trim().to_lowercase() {
                continue;
            }

            tracing::debug!(
                "Found matching day header \"{}\" at index {}",
                heading_text.trim(),
                index
            );
            let day_lessons = heading
                .then(&selectors.day_container)
                .nth(0)
                .then(&selectors.lesson_block);
            matches = driver::filter_by_text(page, &day_lessons, is_target).await?;
            tracing::info!(
                "Found {} matching class(es) in {} section",
                matches.len(),
                target.day_name
            );
            if !matches.is_empty() {
                break;
            }
        }

        if matches.is_empty() {
            tracing::info!("Day-specific search failed. Searching entire page...");
            let all_lessons = Locator::new(&selectors.lesson_block);
            matches = driver::filter_by_text(page, &all_lessons, is_target).await?;
        }

        tracing::info!("Total matching blocks found: {}", matches.len());
        if matches.is_empty() {
            return Err(BookingError::TargetNotFound {
                name: target.name.clone(),
                time_slot: target.time_slot.clone(),
                day_name: target.day_name.clone(),
            });
        }

        driver::first_visible(page, &matches)
            .await?
            .ok_or(BookingError::NotInteractable(matches.len()))
    }

    async fn run(
        &self,
        page: &dyn Page,
        target: &TargetConfig,
    ) -> Result<AttemptOutcome, BookingError> {
        let id = target.id.as_str();
        let selectors = &self.settings.selectors;

        tracing::info!(
            "=== Booking {} on {} at {} ===",
            target.name,
            target.day_name,
            target.time_slot
        );

        self.login(page).await?;
        self.snapshots.capture(page, id, "step0-logged-in").await;

        tracing::info!("Step 2: Navigating to lessons page...");
        self.bounded("lessons page", page.goto(&self.settings.lessons_url))
            .await?;
        self.snapshots.capture(page, id, "step1-lessons-page").await;

        tracing::info!("Step 3: Navigating to next week...");
        self.advance_period(page).await?;
        self.snapshots.capture(page, id, "step2-next-week").await;

        tracing::info!(
            "Step 4: Finding {} class on {} at {}...",
            target.name,
            target.day_name,
            target.time_slot
        );
        let block = self.locate_target(page, target).await?;
        self.snapshots.capture(page, id, "step2b-class-located").await;

        tracing::info!("Step 5: Opening class block {}...", block);
        page.click(&block).await?;
        let register_button = Locator::new(&selectors.register_button);
        page.wait_for(&register_button, self.settings.modal_timeout())
            .await?;
        self.snapshots.capture(page, id, "step3-modal-open").await;

        tracing::info!("Step 6: Clicking register button...");
        page.click(&register_button).await?;
        settle(self.settings.result_settle_ms).await;
        self.snapshots.capture(page, id, "step4-after-register").await;

        tracing::info!("Step 7: Reading result...");
        let text = page.page_text().await?;
        let classification = self.classifier.classify(&text);
        match classification {
            Classification::Booked => {
                tracing::info!("SUCCESS! Booking appears to have succeeded.")
            }
            Classification::AlreadyRegistered => {
                tracing::info!("Already registered for this class")
            }
            Classification::FullOrError => {
                tracing::warn!("Class appears to be full or error occurred")
            }
            Classification::Unknown => tracing::warn!(
                "UNKNOWN: No clear success or error message. Check screenshots."
            ),
        }
        self.snapshots.capture(page, id, "booking-result").await;

        Ok(classification.into_outcome())
    }
}

#[async_trait]
impl Registrar for BookingEngine {
    async fn register(&self, page: &dyn Page, target: &TargetConfig) -> AttemptOutcome {
        match self.run(page, target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                tracing::error!("Error booking {}: {}", target.name, message);

                self.snapshots
                    .capture(page, &target.id, "error-screenshot")
                    .await;

                let retryable = is_retryable_error(&message);
                AttemptOutcome::failed(message, retryable).with_detail(format!("{:?}", e))
            }
        }
    }
}

/// Case-insensitive, whitespace-normalised substring match
pub fn contains_text(haystack: &str, needle: &str) -> bool {
    let normalize = |s: &str| {
        s.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    };
    normalize(haystack).contains(&normalize(needle))
}

async fn settle(millis: u64) {
    if millis > 0 {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}
