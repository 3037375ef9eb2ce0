use crate::models::{AttemptOutcome, OutcomePatterns};
use regex::{Regex, RegexBuilder};

/// Substrings (lowercase) of fault messages that indicate a transient failure
pub const RETRYABLE_ERROR_PATTERNS: &[&str] = &[
    "timeout",
    "network",
    "connection",
    "element not found",
    "element is not visible",
    "modal",
    "navigation",
];

/// What the page said after the register button was clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Booked,
    AlreadyRegistered,
    FullOrError,
    Unknown,
}

impl Classification {
    pub fn into_outcome(self) -> AttemptOutcome {
        match self {
            Self::Booked => AttemptOutcome::succeeded("Booking successful"),
            Self::AlreadyRegistered => AttemptOutcome::succeeded("Already registered"),
            Self::FullOrError => AttemptOutcome::failed_terminal("Class full or error"),
            Self::Unknown => AttemptOutcome::failed_retryable("No confirmation message found"),
        }
    }
}

/// Classifies page text after registering.
///
/// Patterns are checked in a fixed priority order: success, already
/// registered, full, error. The first one that matches anywhere in the text
/// wins; nothing matching means the result is unknown (and retryable).
#[derive(Debug, Clone)]
pub struct OutcomeClassifier {
    success: Regex,
    already_registered: Regex,
    full: Regex,
    error: Regex,
}

impl OutcomeClassifier {
    /// Compile the given patterns, case-insensitively
    pub fn new(patterns: &OutcomePatterns) -> Result<Self, regex::Error> {
        Ok(Self {
            success: compile(&patterns.success)?,
            already_registered: compile(&patterns.already_registered)?,
            full: compile(&patterns.full)?,
            error: compile(&patterns.error)?,
        })
    }

    pub fn classify(&self, text: &str) -> Classification {
        if self.success.is_match(text) {
            Classification::Booked
        } else if self.already_registered.is_match(text) {
            Classification::AlreadyRegistered
        } else if self.full.is_match(text) || self.error.is_match(text) {
            Classification::FullOrError
        } else {
            Classification::Unknown
        }
    }
}

impl Default for OutcomeClassifier {
    fn default() -> Self {
        Self::new(&OutcomePatterns::default()).expect("Invalid default outcome patterns")
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Whether a fault message looks transient
pub fn is_retryable_error(message: &str) -> bool {
    let message = message.to_lowercase();
    RETRYABLE_ERROR_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_text() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify("Je bent ingeschreven voor Pilates"),
            Classification::Booked
        );
        assert_eq!(classifier.classify("Gelukt!"), Classification::Booked);
    }

    #[test]
    fn test_success_wins_over_unrelated_text() {
        let classifier = OutcomeClassifier::default();
        // "vol" and "fout" also appear, success still has priority
        let text = "Inschrijving gelukt. Volgende week: foutloos trainen!";
        assert_eq!(classifier.classify(text), Classification::Booked);
    }

    #[test]
    fn test_already_registered() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify("U bent reeds aangemeld"),
            Classification::AlreadyRegistered
        );
        assert!(Classification::AlreadyRegistered.into_outcome().is_success());
    }

    #[test]
    fn test_full_and_error_are_terminal() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(classifier.classify("Deze les is VOL"), Classification::FullOrError);
        assert_eq!(
            classifier.classify("Er ging iets fout"),
            Classification::FullOrError
        );

        let outcome = Classification::FullOrError.into_outcome();
        assert!(!outcome.is_success());
        assert!(!outcome.is_retryable());
    }

    #[test]
    fn test_unknown_is_retryable() {
        let classifier = OutcomeClassifier::default();
        let outcome = classifier.classify("Lesrooster").into_outcome();
        assert!(!outcome.is_success());
        assert!(outcome.is_retryable());
    }

    #[test]
    fn test_custom_patterns() {
        let patterns = OutcomePatterns {
            success: "booked".to_string(),
            already_registered: "duplicate".to_string(),
            full: "waitlist".to_string(),
            error: "oops".to_string(),
        };
        let classifier = OutcomeClassifier::new(&patterns).unwrap();
        assert_eq!(classifier.classify("BOOKED"), Classification::Booked);
        assert_eq!(classifier.classify("on the waitlist"), Classification::FullOrError);
        assert_eq!(classifier.classify("ingeschreven"), Classification::Unknown);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let patterns = OutcomePatterns {
            success: "(".to_string(),
            ..OutcomePatterns::default()
        };
        assert!(OutcomeClassifier::new(&patterns).is_err());
    }

    #[test]
    fn test_retryable_error_messages() {
        assert!(is_retryable_error("Timeout 30000ms exceeded"));
        assert!(is_retryable_error("net::ERR_CONNECTION_RESET during navigation"));
        assert!(is_retryable_error("Element is not visible: button"));
        assert!(is_retryable_error("Modal did not open"));
        assert!(!is_retryable_error("Could not find Pilates class at 08:30 on zaterdag"));
        assert!(!is_retryable_error("Invalid credentials"));
    }
}
