//! Stress testing.
//!
//! Data flows one way: the [`ScenarioEngine`] evaluates each position with
//! [`evaluate_position`], which sums one [`factor_impact`] per shock, which in
//! turn reads coefficients from the [`SensitivityRegistry`](crate::SensitivityRegistry).

mod config;
mod engine;
mod impact;
mod parallel;
mod position;

pub use config::EngineConfig;
pub use engine::{validate_portfolio, validate_scenario, worst_scenario, ScenarioEngine};
pub use impact::{
    factor_impact, sensitivity, shift_magnitude, CREDIT_IMPACT_PER_100BP,
    GENERIC_IMPACT_PER_UNIT, INFLATION_IMPACT_PER_POINT, INTEREST_RATE_IMPACT_PER_100BP,
};
pub use position::evaluate_position;
