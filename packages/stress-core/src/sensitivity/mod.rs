//! Sensitivity coefficients.
//!
//! Holds the per-asset-class betas, per-sector betas, and per-(asset class, factor)
//! correlations the engine multiplies shocks by, plus the calibration file that
//! overrides them.

mod calibration;
mod registry;

pub use calibration::{Calibration, CorrelationEntry};
pub use registry::{
    SensitivityRegistry, DEFAULT_ASSET_CLASS_BETA, DEFAULT_CORRELATION, DEFAULT_SECTOR_BETA,
};
