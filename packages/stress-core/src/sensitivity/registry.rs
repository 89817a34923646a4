//! Coefficient tables with deterministic fallbacks.

use super::calibration::{Calibration, CorrelationEntry};
use crate::factors::{CREDIT, FOREIGN_EXCHANGE, INFLATION, INTEREST_RATE, VOLATILITY};
use crate::types::AssetClass;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Beta for an asset class with no entry.
pub const DEFAULT_ASSET_CLASS_BETA: f64 = 1.0;

/// Beta for a missing or unrecognized sector.
pub const DEFAULT_SECTOR_BETA: f64 = 1.0;

/// Correlation for an (asset class, factor) pair with no entry.
pub const DEFAULT_CORRELATION: f64 = 0.5;

const SEED_ASSET_CLASS_BETAS: [(AssetClass, f64); 10] = [
    (AssetClass::Equity, 1.0),
    (AssetClass::FixedIncome, 0.2),
    (AssetClass::Commodity, 0.6),
    (AssetClass::Currency, 0.3),
    (AssetClass::Crypto, 2.5),
    (AssetClass::Option, 1.5),
    (AssetClass::Future, 1.2),
    (AssetClass::Etf, 0.9),
    (AssetClass::MutualFund, 0.8),
    (AssetClass::Other, 1.0),
];

const SEED_SECTOR_BETAS: [(&str, f64); 11] = [
    ("Technology", 1.2),
    ("Financial Services", 1.1),
    ("Healthcare", 0.8),
    ("Consumer Cyclical", 1.1),
    ("Consumer Defensive", 0.6),
    ("Energy", 1.3),
    ("Industrials", 1.0),
    ("Basic Materials", 1.2),
    ("Communication Services", 0.9),
    ("Utilities", 0.5),
    ("Real Estate", 0.7),
];

const SEED_CORRELATIONS: [(AssetClass, &str, f64); 20] = [
    (AssetClass::Equity, INTEREST_RATE, -0.7),
    (AssetClass::Equity, CREDIT, -0.8),
    (AssetClass::Equity, VOLATILITY, -0.6),
    (AssetClass::Equity, INFLATION, -0.3),
    (AssetClass::Equity, FOREIGN_EXCHANGE, 0.2),
    (AssetClass::FixedIncome, INTEREST_RATE, 0.9),
    (AssetClass::FixedIncome, CREDIT, 0.7),
    (AssetClass::FixedIncome, VOLATILITY, 0.2),
    (AssetClass::FixedIncome, INFLATION, 0.6),
    (AssetClass::FixedIncome, FOREIGN_EXCHANGE, 0.1),
    (AssetClass::Commodity, INTEREST_RATE, -0.2),
    (AssetClass::Commodity, CREDIT, -0.3),
    (AssetClass::Commodity, VOLATILITY, -0.2),
    (AssetClass::Commodity, INFLATION, -0.7),
    (AssetClass::Commodity, FOREIGN_EXCHANGE, -0.4),
    (AssetClass::Crypto, INTEREST_RATE, -0.5),
    (AssetClass::Crypto, CREDIT, -0.4),
    (AssetClass::Crypto, VOLATILITY, -0.8),
    (AssetClass::Crypto, INFLATION, 0.2),
    (AssetClass::Crypto, FOREIGN_EXCHANGE, 0.3),
];

/// Lookup tables for the three kinds of sensitivity coefficient.
///
/// Seeded with defaults on construction and optionally overridden before a run.
/// The engine borrows the registry immutably for the whole run, so a
/// calibration can never change mid-evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityRegistry {
    asset_class_betas: HashMap<AssetClass, f64>,
    sector_betas: HashMap<String, f64>,
    correlations: HashMap<AssetClass, HashMap<String, f64>>,
}

impl SensitivityRegistry {
    /// Create a registry seeded with the default coefficient tables.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        for (asset_class, beta) in SEED_ASSET_CLASS_BETAS {
            registry.set_asset_class_beta(asset_class, beta);
        }
        for (sector, beta) in SEED_SECTOR_BETAS {
            registry.set_sector_beta(sector, beta);
        }
        for (asset_class, factor_id, correlation) in SEED_CORRELATIONS {
            registry.set_correlation(asset_class, factor_id, correlation);
        }

        registry
    }

    /// Create a registry with no entries; every lookup returns its fallback.
    pub fn empty() -> Self {
        Self {
            asset_class_betas: HashMap::new(),
            sector_betas: HashMap::new(),
            correlations: HashMap::new(),
        }
    }

    /// Create a seeded registry and overlay a calibration on it.
    pub fn with_calibration(calibration: &Calibration) -> Result<Self> {
        let mut registry = Self::new();
        registry.apply(calibration)?;
        Ok(registry)
    }

    /// Market-factor beta of an asset class.
    pub fn asset_class_beta(&self, asset_class: AssetClass) -> f64 {
        self.asset_class_betas
            .get(&asset_class)
            .copied()
            .unwrap_or(DEFAULT_ASSET_CLASS_BETA)
    }

    pub fn set_asset_class_beta(&mut self, asset_class: AssetClass, beta: f64) {
        self.asset_class_betas.insert(asset_class, beta);
    }

    /// Market-factor beta of a sector, falling back to 1.0.
    pub fn sector_beta(&self, sector: &str) -> f64 {
        self.sector_beta_entry(sector).unwrap_or(DEFAULT_SECTOR_BETA)
    }

    /// Sector beta only if the sector has an entry.
    pub fn sector_beta_entry(&self, sector: &str) -> Option<f64> {
        self.sector_betas.get(sector).copied()
    }

    pub fn set_sector_beta(&mut self, sector: &str, beta: f64) {
        self.sector_betas.insert(sector.to_string(), beta);
    }

    /// Sensitivity of an asset class to a non-market factor.
    pub fn correlation(&self, asset_class: AssetClass, factor_id: &str) -> f64 {
        self.correlations
            .get(&asset_class)
            .and_then(|by_factor| by_factor.get(factor_id))
            .copied()
            .unwrap_or(DEFAULT_CORRELATION)
    }

    pub fn set_correlation(&mut self, asset_class: AssetClass, factor_id: &str, value: f64) {
        self.correlations
            .entry(asset_class)
            .or_default()
            .insert(factor_id.to_string(), value);
    }

    /// Overlay a calibration. All-or-nothing: a non-finite coefficient
    /// anywhere leaves the registry untouched.
    pub fn apply(&mut self, calibration: &Calibration) -> Result<()> {
        calibration.validate()?;

        for (asset_class, beta) in &calibration.asset_class_betas {
            self.set_asset_class_beta(*asset_class, *beta);
        }
        for (sector, beta) in &calibration.sector_betas {
            self.set_sector_beta(sector, *beta);
        }
        for entry in &calibration.correlations {
            self.set_correlation(entry.asset_class, &entry.factor_id, entry.value);
        }

        tracing::debug!(
            asset_class_betas = calibration.asset_class_betas.len(),
            sector_betas = calibration.sector_betas.len(),
            correlations = calibration.correlations.len(),
            "Applied sensitivity calibration"
        );
        Ok(())
    }

    /// Snapshot of every explicit entry, in a stable order.
    pub fn calibration(&self) -> Calibration {
        let asset_class_betas: BTreeMap<AssetClass, f64> = self
            .asset_class_betas
            .iter()
            .map(|(k, v)| (*k, *v))
            .collect();
        let sector_betas: BTreeMap<String, f64> = self
            .sector_betas
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        let mut correlations: Vec<CorrelationEntry> = self
            .correlations
            .iter()
            .flat_map(|(asset_class, by_factor)| {
                by_factor.iter().map(|(factor_id, value)| CorrelationEntry {
                    asset_class: *asset_class,
                    factor_id: factor_id.clone(),
                    value: *value,
                })
            })
            .collect();
        correlations.sort_by(|a, b| {
            a.asset_class
                .cmp(&b.asset_class)
                .then_with(|| a.factor_id.cmp(&b.factor_id))
        });

        Calibration {
            asset_class_betas,
            sector_betas,
            correlations,
        }
    }

    /// Fail if any stored coefficient is NaN or infinite.
    ///
    /// The setters accept any value, so the engine calls this before each run.
    pub fn validate(&self) -> Result<()> {
        for (asset_class, beta) in &self.asset_class_betas {
            if !beta.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "registry beta for asset class {} is not finite: {}",
                    asset_class, beta
                )));
            }
        }
        for (sector, beta) in &self.sector_betas {
            if !beta.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "registry beta for sector {} is not finite: {}",
                    sector, beta
                )));
            }
        }
        for (asset_class, by_factor) in &self.correlations {
            for (factor_id, value) in by_factor {
                if !value.is_finite() {
                    return Err(Error::InvalidInput(format!(
                        "registry correlation {}/{} is not finite: {}",
                        asset_class, factor_id, value
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for SensitivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
