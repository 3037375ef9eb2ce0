use crate::models::{ClassConfig, SiteSettings};
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default class document, relative to the working directory
pub const DEFAULT_CLASSES_PATH: &str = "config/classes.json";

/// Default site settings file, relative to the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.yaml";

/// Configuration manager for the class document and site settings.
///
/// Manages two files:
/// - Class document (`classes.json`): release schedule and the classes to book.
///   Required; a missing or invalid document stops the run before anything is
///   scheduled.
/// - Site settings (`settings.yaml`): URLs, selectors and timing for the
///   booking site. Optional; defaults are used when absent.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    classes_path: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for explicit file locations.
    pub fn new<P: AsRef<Utf8Path>, Q: AsRef<Utf8Path>>(classes_path: P, settings_path: Q) -> Self {
        Self {
            classes_path: classes_path.as_ref().to_path_buf(),
            settings_path: settings_path.as_ref().to_path_buf(),
        }
    }

    /// Create a ConfigManager reading `classes.json` and `settings.yaml` from one directory.
    pub fn from_dir<P: AsRef<Utf8Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref();
        Self::new(
            config_dir.join("classes.json"),
            config_dir.join("settings.yaml"),
        )
    }

    /// Load, parse and validate the class document.
    ///
    /// # Errors
    /// Fails if the file is missing, is not valid JSON, lacks a required field,
    /// or carries a value that does not validate.
    pub fn load_class_config(&self) -> Result<ClassConfig> {
        if !self.classes_path.exists() {
            bail!("Configuration file not found: {}", self.classes_path);
        }

        let file_contents = fs::read_to_string(&self.classes_path)
            .with_context(|| format!("Failed to read configuration: {}", self.classes_path))?;

        let config: ClassConfig = serde_json::from_str(&file_contents).with_context(|| {
            format!("Invalid JSON in configuration file: {}", self.classes_path)
        })?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration file: {}", self.classes_path))?;

        tracing::info!(
            "Loaded configuration with {} class(es) from {}",
            config.classes.len(),
            self.classes_path
        );
        Ok(config)
    }

    /// Save the class document as pretty-printed JSON.
    pub fn save_class_config(&self, config: &ClassConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)
            .context("Failed to serialize class configuration to JSON")?;

        if let Some(parent) = self.classes_path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent))?;
            }
        }

        fs::write(&self.classes_path, json)
            .with_context(|| format!("Failed to write configuration: {}", self.classes_path))?;

        tracing::info!("Saved class configuration to {}", self.classes_path);
        Ok(())
    }

    /// Load the site settings.
    ///
    /// # Returns
    /// The loaded SiteSettings, or defaults if the file doesn't exist
    pub fn load_site_settings(&self) -> Result<SiteSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Site settings file not found at {}, using defaults",
                self.settings_path
            );
            return Ok(SiteSettings::default());
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read site settings: {}", self.settings_path))?;

        let settings: SiteSettings = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse site settings: {}", self.settings_path))?;

        tracing::info!("Loaded site settings from {}", self.settings_path);
        Ok(settings)
    }

    pub fn classes_path(&self) -> &Utf8Path {
        &self.classes_path
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(DEFAULT_CLASSES_PATH, DEFAULT_SETTINGS_PATH)
    }
}
