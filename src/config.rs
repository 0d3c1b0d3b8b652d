//! Report run configuration

use std::path::Path;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Configuration for a portfolio report run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Calendar year to bill (default: current year)
    #[serde(default = "default_year")]
    pub year: i32,

    /// Bill clients on the rayon thread pool (default: true)
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Attach each client's twelve-month schedule to the report
    #[serde(default)]
    pub include_client_detail: bool,
}

fn default_year() -> i32 {
    chrono::Local::now().year()
}
fn default_parallel() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            parallel: default_parallel(),
            include_client_detail: false,
        }
    }
}

impl ReportConfig {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_path(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
