//! Stress Core - Portfolio stress testing and risk-factor sensitivity engine.
//!
//! Given a portfolio of positions and a hypothetical market scenario (a set of
//! risk-factor shocks), this crate computes the change in value for every
//! position and for the portfolio as a whole:
//!
//! - **Sensitivity registry**: asset-class betas, sector betas, and
//!   asset-class/factor correlations with fixed fallbacks
//! - **Factor impact**: shock unit conversion times position sensitivity
//! - **Position evaluation**: per-factor impacts summed into a stressed value
//! - **Scenario engine**: validation, per-position evaluation, portfolio aggregation
//! - **Scenario catalog**: built-in historical and hypothetical stress events
//!
//! # Example
//!
//! ```rust
//! use stress_core::{
//!     AssetClass, Portfolio, Position, RiskFactorShift, RiskScenario, ScenarioEngine,
//!     SensitivityRegistry,
//! };
//!
//! let portfolio = Portfolio::new("demo", 500.0).with_position(
//!     Position::new("XYZ", AssetClass::Equity, 1000.0).with_sector("Technology"),
//! );
//! let scenario = RiskScenario::new("selloff", "Equity selloff")
//!     .with_factor(RiskFactorShift::percentage("market", -0.10));
//!
//! let registry = SensitivityRegistry::new();
//! let engine = ScenarioEngine::new(&registry);
//! let result = engine.run_stress_test(&portfolio, &scenario).unwrap();
//!
//! assert!((result.portfolio_value_after - 1380.0).abs() < 1e-9);
//! ```

pub mod factors;
pub mod scenarios;
pub mod sensitivity;
pub mod stress;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, AssetClass, FactorImpact, Portfolio, Position, PositionStressResult,
    RiskFactorShift, RiskScenario, ScenarioMetadata, ShiftType, StressTestResult,
};

// Re-export main functionality
pub use scenarios::{get_scenario, list_scenarios, scenario_ids, ScenarioCatalog};
pub use sensitivity::{Calibration, CorrelationEntry, SensitivityRegistry};
pub use stress::{evaluate_position, factor_impact, worst_scenario, EngineConfig, ScenarioEngine};

/// Error types for stress-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Non-finite result: {0}")]
    NonFiniteResult(String),
}

/// Result type for stress-core operations.
pub type Result<T> = std::result::Result<T, Error>;
