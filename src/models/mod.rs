//! Data models for bookfast.
//!
//! - [`ClassConfig`]: the class document (`config/classes.json`) with its
//!   [`GlobalSettings`] release schedule and ordered [`TargetConfig`] list
//! - [`SiteSettings`]: booking-site URLs, selectors, timeouts and outcome patterns
//!   (`config/settings.yaml`)
//! - [`AttemptOutcome`], [`TargetResult`], [`RunSummary`]: what a run produces
//!
//! Configuration types are read-only for the duration of a run. Outcomes are
//! created once and never mutated afterwards.

pub mod config;
pub mod outcome;
pub mod settings;

pub use config::{
    ClassConfig, ConfigError, GlobalSettings, MAX_RETRIES_LIMIT, RetryPolicy, TargetConfig,
};
pub use outcome::{AttemptOutcome, RunSummary, TargetResult};
pub use settings::{OutcomePatterns, Selectors, SiteSettings};
