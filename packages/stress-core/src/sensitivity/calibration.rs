//! Registry overrides loaded from JSON.

use crate::types::AssetClass;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// One explicit (asset class, factor) correlation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationEntry {
    pub asset_class: AssetClass,
    pub factor_id: String,
    pub value: f64,
}

/// A set of coefficient overrides for a [`SensitivityRegistry`](super::SensitivityRegistry).
///
/// File format:
///
/// ```json
/// {
///   "asset_class_betas": { "equity": 1.1 },
///   "sector_betas": { "Technology": 1.3 },
///   "correlations": [
///     { "asset_class": "equity", "factor_id": "interest_rate", "value": -0.6 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Calibration {
    #[serde(default)]
    pub asset_class_betas: BTreeMap<AssetClass, f64>,
    #[serde(default)]
    pub sector_betas: BTreeMap<String, f64>,
    #[serde(default)]
    pub correlations: Vec<CorrelationEntry>,
}

impl Calibration {
    /// Get the default calibration file path.
    ///
    /// Default path: `~/.stress/calibration.json`
    /// Can be overridden with `STRESS_CALIBRATION_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("STRESS_CALIBRATION_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".stress/calibration.json"))
            .unwrap_or_else(|| PathBuf::from("calibration.json"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file is an empty calibration.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let calibration: Self = serde_json::from_str(&content)?;
        calibration.validate()?;
        Ok(calibration)
    }

    /// Save to a specific path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Whether the calibration overrides nothing.
    pub fn is_empty(&self) -> bool {
        self.asset_class_betas.is_empty()
            && self.sector_betas.is_empty()
            && self.correlations.is_empty()
    }

    /// Reject NaN or infinite coefficients.
    pub fn validate(&self) -> Result<()> {
        for (asset_class, beta) in &self.asset_class_betas {
            if !beta.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "beta for asset class {} is not finite: {}",
                    asset_class, beta
                )));
            }
        }
        for (sector, beta) in &self.sector_betas {
            if !beta.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "beta for sector '{}' is not finite: {}",
                    sector, beta
                )));
            }
        }
        for entry in &self.correlations {
            if !entry.value.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "correlation for {}/{} is not finite: {}",
                    entry.asset_class, entry.factor_id, entry.value
                )));
            }
        }
        Ok(())
    }
}
