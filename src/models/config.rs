use chrono::NaiveTime;
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on `maxRetries` accepted from the class document
pub const MAX_RETRIES_LIMIT: u32 = 10;

static TIME_SLOT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-1][0-9]|2[0-3]):([0-5][0-9])$").expect("Invalid time slot regex")
});

static CLASS_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("Invalid class id regex"));

/// Errors found while validating the class document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration missing \"version\" field")]
    MissingVersion,

    #[error("Unknown timezone \"{0}\"")]
    InvalidTimezone(String),

    #[error("Invalid \"bookingStartTime\" \"{0}\" (expected HH:MM:SS)")]
    InvalidReleaseTime(String),

    #[error("Class at index {0} missing \"id\" field")]
    MissingId(usize),

    #[error("Class id \"{0}\" must contain only lowercase letters, numbers, and hyphens")]
    InvalidId(String),

    #[error("Duplicate class id \"{0}\"")]
    DuplicateId(String),

    #[error("Class \"{id}\" missing \"{field}\" field")]
    MissingField { id: String, field: &'static str },

    #[error("Class \"{id}\" has invalid \"timeSlot\" \"{value}\" (expected HH:MM)")]
    InvalidTimeSlot { id: String, value: String },

    #[error("Class \"{id}\" has invalid \"dayOfWeek\" {value} (must be 0-6)")]
    InvalidDayOfWeek { id: String, value: u8 },

    #[error("Class \"{id}\" has \"maxRetries\" {value} (must be between 0 and 10)")]
    TooManyRetries { id: String, value: u32 },
}

/// Class document from `config/classes.json`
///
/// This is the file the admin page edits. It carries the release schedule and
/// the ordered list of classes to book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassConfig {
    pub version: String,

    #[serde(rename = "globalSettings")]
    pub global_settings: GlobalSettings,

    pub classes: Vec<TargetConfig>,
}

/// Release schedule shared by every class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// IANA zone name, e.g. `Europe/Amsterdam`
    pub timezone: String,

    /// Time of day (HH:MM:SS) at which registration opens
    #[serde(rename = "bookingStartTime", alias = "releaseTime")]
    pub release_time: String,
}

impl GlobalSettings {
    /// Parse the configured zone
    pub fn zone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Parse the configured release time of day
    pub fn release_time_of_day(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.release_time, "%H:%M:%S")
            .map_err(|_| ConfigError::InvalidReleaseTime(self.release_time.clone()))
    }
}

/// One bookable class occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfig {
    /// Stable id, used for snapshot filenames and log correlation
    pub id: String,

    pub enabled: bool,

    #[serde(rename = "className", alias = "name")]
    pub name: String,

    /// Start time as shown on the schedule (HH:MM)
    pub time_slot: String,

    /// 0 = Sunday ... 6 = Saturday
    pub day_of_week: u8,

    /// Day heading as shown on the schedule, e.g. `zaterdag`
    pub day_name: String,

    #[serde(rename = "retryConfig", alias = "retryPolicy")]
    pub retry_policy: RetryPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl RetryPolicy {
    /// Initial attempt plus retries
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl ClassConfig {
    /// Validate the whole document.
    ///
    /// Serde has already enforced presence and type of every required field;
    /// this checks the values. The first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::MissingVersion);
        }

        self.global_settings.zone()?;
        self.global_settings.release_time_of_day()?;

        let mut seen = HashSet::new();
        for (index, class) in self.classes.iter().enumerate() {
            class.validate(index)?;
            if !seen.insert(class.id.as_str()) {
                return Err(ConfigError::DuplicateId(class.id.clone()));
            }
        }

        Ok(())
    }

    /// Enabled classes held on the given weekday (0 = Sunday), in document order
    pub fn classes_for_day(&self, day_of_week: u8) -> Vec<TargetConfig> {
        self.classes
            .iter()
            .filter(|c| c.enabled && c.day_of_week == day_of_week)
            .cloned()
            .collect()
    }

    /// All enabled classes, in document order
    pub fn enabled_classes(&self) -> Vec<TargetConfig> {
        self.classes.iter().filter(|c| c.enabled).cloned().collect()
    }

    /// Look up an enabled class by id
    pub fn find_enabled(&self, id: &str) -> Option<&TargetConfig> {
        self.classes.iter().find(|c| c.enabled && c.id == id)
    }
}

impl TargetConfig {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::MissingId(index));
        }
        if !CLASS_ID_PATTERN.is_match(&self.id) {
            return Err(ConfigError::InvalidId(self.id.clone()));
        }
        if self.name.trim().is_empty() {
            return Err(self.missing("className"));
        }
        if self.day_name.trim().is_empty() {
            return Err(self.missing("dayName"));
        }
        if !TIME_SLOT_PATTERN.is_match(&self.time_slot) {
            return Err(ConfigError::InvalidTimeSlot {
                id: self.id.clone(),
                value: self.time_slot.clone(),
            });
        }
        if self.day_of_week > 6 {
            return Err(ConfigError::InvalidDayOfWeek {
                id: self.id.clone(),
                value: self.day_of_week,
            });
        }
        if self.retry_policy.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::TooManyRetries {
                id: self.id.clone(),
                value: self.retry_policy.max_retries,
            });
        }
        Ok(())
    }

    fn missing(&self, field: &'static str) -> ConfigError {
        ConfigError::MissingField {
            id: self.id.clone(),
            field,
        }
    }
}
