//! Services module - the booking flow itself.
//!
//! Everything here is independent of the command line and of any concrete
//! browser backend. Pages come in through the [`crate::driver`] seam.
//!
//! # Components
//!
//! - [`scheduler`]: Release Gate. Computes the next release instant in the
//!   configured zone and waits for it (coarse steps while far away, fine steps
//!   close to it).
//! - [`booking`]: Target Registration Procedure ([`BookingEngine`]). Logs in,
//!   moves the listing forward one period, finds the class for the target day
//!   and time, registers and classifies what the site answered.
//! - [`classifier`]: maps confirmation text to an outcome and decides whether a
//!   fault message looks transient.
//! - [`retry`]: Retry Orchestrator ([`RetryHandler`]). One fresh session per
//!   attempt, always released, fixed delay between attempts.
//! - [`sequencer`]: runs targets strictly one after another ([`Sequencer`]).
//!
//! # Usage Example
//!
//! ```ignore
//! use bookfast::services::{BookingEngine, RetryHandler, Sequencer};
//!
//! let engine = BookingEngine::new(settings, credentials)?;
//! let handler = RetryHandler::new(session_factory, engine);
//! let sequencer = Sequencer::new(handler, Duration::from_millis(2000));
//!
//! let summary = sequencer.run_all(&targets).await;
//! summary.log_report();
//! ```

pub mod booking;
pub mod classifier;
pub mod retry;
pub mod scheduler;
pub mod sequencer;

pub use booking::{BookingEngine, BookingError, Credentials, Registrar, SnapshotWriter};
pub use classifier::{Classification, OutcomeClassifier, is_retryable_error};
pub use retry::{RetryHandler, SessionGuard};
pub use scheduler::{Clock, ReleaseGate, SystemClock, await_release, next_release, weekday_in};
pub use sequencer::Sequencer;
