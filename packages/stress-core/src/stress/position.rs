//! Stressed valuation of a single position.

use super::impact::factor_impact;
use crate::sensitivity::SensitivityRegistry;
use crate::types::{FactorImpact, Position, PositionStressResult, RiskFactorShift};

/// Apply every shock in `factors` to one position.
///
/// The total impact is the plain sum of per-factor impacts, accumulated in
/// factor order so repeated calls give bit-identical output. A position with
/// zero value reports a `percentage_change` of `0.0`.
pub fn evaluate_position(
    position: &Position,
    factors: &[RiskFactorShift],
    registry: &SensitivityRegistry,
) -> PositionStressResult {
    let factor_impacts: Vec<FactorImpact> = factors
        .iter()
        .map(|shift| factor_impact(position, shift, registry))
        .collect();

    let total_impact = factor_impacts.iter().fold(0.0, |acc, f| acc + f.impact);

    let value_before = position.value;
    let value_after = value_before * (1.0 + total_impact);
    let absolute_change = value_after - value_before;
    let percentage_change = if value_before != 0.0 {
        absolute_change / value_before
    } else {
        0.0
    };

    PositionStressResult {
        symbol: position.symbol.clone(),
        asset_class: position.asset_class,
        value_before,
        value_after,
        absolute_change,
        percentage_change,
        total_impact,
        factor_impacts,
    }
}
