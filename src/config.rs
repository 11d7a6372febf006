//! Engine configuration loaded from TOML
//!
//! Every section is optional; missing keys take their defaults.
//!
//! ```toml
//! dependent = "cycles"
//!
//! [histogram]
//! subdivisions = 6
//! interpolation = "gaussian"
//!
//! [search]
//! criterion = "bic"
//! require_significant_terms = true
//!
//! [[family]]
//! name = "size"
//! members = ["N", "N2", "log(N)"]
//!
//! [[family]]
//! name = "constant"
//! members = ["Constant"]
//! ```

use crate::error::{EngineError, Result};
use crate::histogram::{Interpolation, SemilogHistogram, MAX_SUBDIVISIONS};
use crate::model::{Family, FamilyAssignment, SearchConfig, DEFAULT_DEPENDENT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Histogram construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Linear bins per octave (NDB)
    pub subdivisions: u32,
    pub interpolation: Interpolation,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            subdivisions: 4,
            interpolation: Interpolation::Linear,
        }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(format!(
                "subdivisions must be at most {}, got {}",
                MAX_SUBDIVISIONS, self.subdivisions
            ));
        }
        Ok(())
    }

    /// Empty histogram with these parameters
    pub fn build(&self) -> Result<SemilogHistogram> {
        Ok(SemilogHistogram::new(self.subdivisions)?.with_interpolation(self.interpolation))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Metric the model search explains
    pub dependent: String,
    pub histogram: HistogramConfig,
    pub search: SearchConfig,
    /// Explicit families; empty means one family per metric group
    #[serde(rename = "family")]
    pub families: Vec<Family>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dependent: DEFAULT_DEPENDENT.to_string(),
            histogram: HistogramConfig::default(),
            search: SearchConfig::default(),
            families: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dependent.is_empty() {
            return Err(EngineError::InvalidConfig(
                "dependent metric name is empty".to_string(),
            ));
        }
        self.histogram.validate().map_err(EngineError::InvalidConfig)?;
        self.search.validate().map_err(EngineError::InvalidConfig)?;
        Ok(())
    }

    /// Families to search, or `None` to derive them from metric groups
    pub fn family_assignment(&self) -> Option<FamilyAssignment> {
        if self.families.is_empty() {
            return None;
        }
        Some(
            self.families
                .iter()
                .cloned()
                .fold(FamilyAssignment::new(), FamilyAssignment::with),
        )
    }
}
