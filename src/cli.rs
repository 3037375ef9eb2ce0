use crate::config::{DEFAULT_CLASSES_PATH, DEFAULT_SETTINGS_PATH};
use crate::models::{ClassConfig, TargetConfig};
use crate::services::Credentials;
use anyhow::{Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;

/// Command line of the `bookfast` binary
#[derive(Parser, Debug)]
#[command(
    name = "bookfast",
    about = "Books gym classes the moment registration opens",
    version
)]
pub struct Cli {
    /// Start immediately with a visible browser instead of waiting for the release time
    #[arg(long)]
    pub test: bool,

    /// Only book the enabled class with this id
    #[arg(long, value_name = "ID")]
    pub class: Option<String>,

    /// Book every enabled class regardless of weekday
    #[arg(long, conflicts_with = "class")]
    pub all_days: bool,

    /// Class document
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CLASSES_PATH)]
    pub config: Utf8PathBuf,

    /// Site settings (URLs, selectors, timeouts)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: Utf8PathBuf,

    /// Directory for rolling log files
    #[arg(long, value_name = "DIR", default_value = "logs")]
    pub log_dir: Utf8PathBuf,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Account email
    #[arg(long, env = "GYM_EMAIL", hide_env_values = true)]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "GYM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Cli {
    /// Whether the browser should run without a window
    pub fn headless(&self, configured: bool) -> bool {
        configured && !self.headed && !self.test
    }

    /// Classes to book in this run.
    ///
    /// `--class` picks a single enabled class by id, `--all-days` every enabled
    /// class; otherwise the enabled classes scheduled on `day_of_week`.
    pub fn select_targets(&self, config: &ClassConfig, day_of_week: u8) -> Vec<TargetConfig> {
        if let Some(id) = &self.class {
            return config.find_enabled(id).cloned().into_iter().collect();
        }
        if self.all_days {
            return config.enabled_classes();
        }
        config.classes_for_day(day_of_week)
    }

    /// Credentials from the command line or environment
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok(Credentials::new(email.clone(), password.clone()))
            }
            _ => bail!("Missing credentials: set GYM_EMAIL and GYM_PASSWORD"),
        }
    }
}
