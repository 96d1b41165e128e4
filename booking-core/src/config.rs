//! # Booking Config
//!
//! Runtime settings of the booking core, stored as YAML.
//!
//! ## YAML Format
//!
//! ```yaml
//! api_base_url: "http://localhost:3000"
//! request_timeout_secs: 30
//! slot_page_size: 200
//! slot_max_pages: 50
//! generic_error_message: "Something went wrong. Please try again."
//! ```
//!
//! Missing keys take their defaults, so an empty file is a valid config.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::backend::domain::errors::ValidationError;
use crate::backend::domain::slot_catalog::{SlotPaging, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};

pub const DEFAULT_GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Base URL of the booking backend, without a trailing slash
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub slot_page_size: u32,
    /// Hard cap on slot listing pages per fetch
    pub slot_max_pages: u32,
    /// Shown when a remote failure carries no message of its own
    pub generic_error_message: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
            slot_page_size: DEFAULT_PAGE_SIZE,
            slot_max_pages: DEFAULT_MAX_PAGES,
            generic_error_message: DEFAULT_GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

impl BookingConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: BookingConfig = serde_yaml::from_str(yaml).context("Failed to parse booking config")?;
        Ok(config)
    }

    /// Load from a YAML file, falling back to defaults if it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No booking config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let yaml_content =
            fs::read_to_string(path).with_context(|| format!("Failed to read booking config {:?}", path))?;
        let config = Self::from_yaml_str(&yaml_content)?;
        debug!("Loaded booking config from {:?}", path);
        Ok(config)
    }

    /// Write to a YAML file via a temp file and rename
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let yaml_content = serde_yaml::to_string(self)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, path)?;
        debug!("Saved booking config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ValidationError::InvalidConfig("api_base_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidConfig("request_timeout_secs must be positive".to_string()));
        }
        if self.slot_page_size == 0 {
            return Err(ValidationError::InvalidConfig("slot_page_size must be positive".to_string()));
        }
        if self.slot_max_pages == 0 {
            return Err(ValidationError::InvalidConfig("slot_max_pages must be positive".to_string()));
        }
        Ok(())
    }

    pub fn slot_paging(&self) -> SlotPaging {
        SlotPaging {
            page_size: self.slot_page_size,
            max_pages: self.slot_max_pages,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }
}
