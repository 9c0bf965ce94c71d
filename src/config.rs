//! Analysis configuration loaded from TOML
//!
//! Every field is optional; a missing table keeps the built-in tolerance
//! bands and an empty CPU reference table.

use crate::classify::Tolerances;
use crate::perf_reference::{CpuReference, PerfReference};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tolerances plus the CPU performance reference table
///
/// # Example TOML
/// ```toml
/// [tolerances.disk_random]
/// min = 5.0
/// max = 20.0
///
/// [[cpu_reference]]
/// model = "Intel(R) Xeon(R) CPU E5-2650 0 @ 2.00GHz"
/// bogomips = 63840.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub tolerances: Tolerances,
    pub cpu_reference: Vec<CpuReference>,
}

impl AnalysisConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid TOML, or holds
    /// an invalid tolerance band.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(content).context("Failed to parse TOML analysis config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tolerances.validate()?;
        if let Some(entry) = self.cpu_reference.iter().find(|e| e.model.trim().is_empty()) {
            anyhow::bail!("CPU reference entry without a model: {:?}", entry);
        }
        Ok(())
    }

    pub fn perf_reference(&self) -> PerfReference<'_> {
        PerfReference::new(&self.cpu_reference)
    }
}
