// bookfast - Gym class booking at registration open
//
// This is the library crate containing the booking flow and data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod cli;
pub mod config;
pub mod driver;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AttemptOutcome, ClassConfig, RunSummary, SiteSettings, TargetConfig, TargetResult};
pub use services::{BookingEngine, RetryHandler, Sequencer};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
