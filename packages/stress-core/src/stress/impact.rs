//! Factor impact calculation.
//!
//! A shock is first converted to a position-independent decimal magnitude,
//! then scaled by the position's sensitivity to that factor.

use crate::factors::{CREDIT, INFLATION, INTEREST_RATE, MARKET};
use crate::sensitivity::SensitivityRegistry;
use crate::types::{FactorImpact, Position, RiskFactorShift, ShiftType};

/// Impact of a +100bp absolute interest-rate shift.
pub const INTEREST_RATE_IMPACT_PER_100BP: f64 = -0.05;

/// Impact of a +100bp absolute credit-spread shift.
pub const CREDIT_IMPACT_PER_100BP: f64 = -0.03;

/// Impact of a +1 point absolute inflation shift.
pub const INFLATION_IMPACT_PER_POINT: f64 = -0.02;

/// Impact per unit for absolute shifts of any other factor.
pub const GENERIC_IMPACT_PER_UNIT: f64 = 0.01;

const BASIS_POINTS_PER_STEP: f64 = 100.0;

/// Convert a shock into a decimal fraction, independent of any position.
///
/// Percentage shifts pass through. Absolute shifts use a per-factor rule:
/// rates and credit are in basis points, inflation in percentage points, and
/// anything else moves 1% per unit.
pub fn shift_magnitude(shift: &RiskFactorShift) -> f64 {
    let value = shift.shift_value;

    match shift.shift_type {
        ShiftType::Percentage => value,
        ShiftType::Absolute => match shift.factor_id.as_str() {
            INTEREST_RATE => INTEREST_RATE_IMPACT_PER_100BP * (value / BASIS_POINTS_PER_STEP),
            CREDIT => CREDIT_IMPACT_PER_100BP * (value / BASIS_POINTS_PER_STEP),
            INFLATION => INFLATION_IMPACT_PER_POINT * value,
            _ => value * GENERIC_IMPACT_PER_UNIT,
        },
    }
}

/// Sensitivity of a position to a factor.
///
/// The market factor uses the asset-class beta, scaled by the sector beta
/// when the position has a sector the registry knows. Every other factor uses
/// the asset-class/factor correlation.
pub fn sensitivity(position: &Position, factor_id: &str, registry: &SensitivityRegistry) -> f64 {
    if factor_id == MARKET {
        let beta = registry.asset_class_beta(position.asset_class);
        let sector_beta = position
            .sector
            .as_deref()
            .and_then(|sector| registry.sector_beta_entry(sector))
            .unwrap_or(1.0);
        beta * sector_beta
    } else {
        registry.correlation(position.asset_class, factor_id)
    }
}

/// Contribution of one shock to one position.
///
/// Unknown factors are never rejected; they fall through to the generic unit
/// conversion and the default correlation.
pub fn factor_impact(
    position: &Position,
    shift: &RiskFactorShift,
    registry: &SensitivityRegistry,
) -> FactorImpact {
    let magnitude = shift_magnitude(shift);
    let sensitivity = sensitivity(position, &shift.factor_id, registry);

    // A zero shock contributes nothing whatever the sensitivity
    let impact = if magnitude == 0.0 {
        0.0
    } else {
        magnitude * sensitivity
    };

    FactorImpact {
        factor_id: shift.factor_id.clone(),
        shift_magnitude: magnitude,
        sensitivity,
        impact,
    }
}
