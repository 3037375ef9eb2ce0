use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Site settings from `config/settings.yaml`
///
/// Describes the booking site: where to log in, which selectors identify the
/// interesting controls, and how long to let the page settle between steps.
/// Every field has a default matching the gym's current member portal, so the
/// file is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub login_url: String,
    pub lessons_url: String,

    pub selectors: Selectors,

    /// Timeout for every driver operation that waits on the page
    pub default_timeout_ms: u64,

    /// Timeout for the register button to appear after opening a lesson
    pub modal_timeout_ms: u64,

    /// Settle time after advancing the schedule by one period
    pub period_settle_ms: u64,

    /// Additional settle time once the page reports idle after advancing
    pub period_extra_settle_ms: u64,

    /// Settle time after clicking the register button
    pub result_settle_ms: u64,

    /// Pause between two classes of the same run
    pub between_targets_ms: u64,

    pub headless: bool,

    /// Browser locale; day headings are matched in this language
    pub locale: String,

    pub snapshots_enabled: bool,
    pub snapshot_dir: Utf8PathBuf,

    pub patterns: OutcomePatterns,
}

/// Selectors for the controls the booking flow touches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub email_input: String,
    pub password_input: String,
    pub login_submit: String,

    /// Advances the schedule one period; rendered once per layout breakpoint
    pub next_period: String,

    pub day_heading: String,

    /// Resolves a day heading to the container holding that day's lessons
    pub day_container: String,

    pub lesson_block: String,
    pub register_button: String,
}

/// Case-insensitive regexes used to classify the page after registering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomePatterns {
    pub success: String,
    pub already_registered: String,
    pub full: String,
    pub error: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            login_url: "https://sportcentrumdetrits.dewi-online.nl/member/login".to_string(),
            lessons_url: "https://sportcentrumdetrits.dewi-online.nl/member/lessons".to_string(),
            selectors: Selectors::default(),
            default_timeout_ms: 30_000,
            modal_timeout_ms: 10_000,
            period_settle_ms: 2_000,
            period_extra_settle_ms: 1_000,
            result_settle_ms: 2_000,
            between_targets_ms: 2_000,
            headless: true,
            locale: "nl-NL".to_string(),
            snapshots_enabled: true,
            snapshot_dir: Utf8PathBuf::from("."),
            patterns: OutcomePatterns::default(),
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            email_input: r#"input#email[name="email"]"#.to_string(),
            password_input: r#"input#password[name="password"]"#.to_string(),
            login_submit: r#"button[type="submit"]:has-text("Inloggen")"#.to_string(),
            next_period: r#"button[wire\:click="nextPeriod"]"#.to_string(),
            day_heading: ".text-lg.font-semibold, .text-xl.font-semibold".to_string(),
            day_container: r#"xpath=ancestor::div[contains(@class, "bg-white")]"#.to_string(),
            lesson_block: r#"[wire\:click*="showLessonModal"]"#.to_string(),
            register_button: r#"button[wire\:click="registerForLesson"]"#.to_string(),
        }
    }
}

impl Default for OutcomePatterns {
    fn default() -> Self {
        Self {
            success: "ingeschreven|success|gelukt".to_string(),
            already_registered: "reeds|already|al ingeschreven".to_string(),
            full: "vol|full".to_string(),
            error: "vol|error|fout".to_string(),
        }
    }
}

impl SiteSettings {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn modal_timeout(&self) -> Duration {
        Duration::from_millis(self.modal_timeout_ms)
    }

    pub fn between_targets(&self) -> Duration {
        Duration::from_millis(self.between_targets_ms)
    }
}
