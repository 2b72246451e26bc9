//! Analysis parameters shared by every engine call.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normalization constants and unit labels for the analysis engines.
///
/// Unit labels are descriptive only; they are copied into the derived
/// results' `units` map and never enter a computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Path length produced by a pressure difference of `p_norm`.
    pub l_norm: f64,

    /// Reference pressure difference.
    pub p_norm: f64,

    pub l_norm_units: String,
    pub p_norm_units: String,
    pub allan_var_units: String,
    pub frequency_units: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            l_norm: 2000.0,
            p_norm: 1.0,
            l_norm_units: "mm".to_string(),
            p_norm_units: "bar".to_string(),
            allan_var_units: "Phase".to_string(),
            frequency_units: "Hz".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Read a (possibly partial) JSON config file; absent fields keep
    /// their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_str(&text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Scale factor applied to pressure differences.
    pub fn scale(&self) -> f64 {
        self.l_norm / self.p_norm
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.l_norm.is_finite() && self.l_norm > 0.0) {
            return Err(Error::Configuration(format!(
                "L_norm must be positive, got {}",
                self.l_norm
            )));
        }
        if !(self.p_norm.is_finite() && self.p_norm > 0.0) {
            return Err(Error::Configuration(format!(
                "p_norm must be positive, got {}",
                self.p_norm
            )));
        }
        Ok(())
    }
}
