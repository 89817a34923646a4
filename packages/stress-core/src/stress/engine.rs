//! Scenario engine: runs a scenario against a whole portfolio.

use super::config::EngineConfig;
use super::parallel::maybe_parallel_map;
use super::position::evaluate_position;
use crate::sensitivity::SensitivityRegistry;
use crate::types::{Portfolio, PositionStressResult, RiskScenario, StressTestResult};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Relative gap between `total_value` and cash plus positions that gets logged.
const TOTAL_VALUE_TOLERANCE: f64 = 1e-9;

/// Runs scenarios against portfolios using a fixed registry snapshot.
///
/// The registry is borrowed for the engine's lifetime, so it cannot be
/// recalibrated while a run is in flight.
#[derive(Debug, Clone)]
pub struct ScenarioEngine<'a> {
    registry: &'a SensitivityRegistry,
    config: EngineConfig,
}

impl<'a> ScenarioEngine<'a> {
    /// Create an engine with the default config.
    pub fn new(registry: &'a SensitivityRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: &'a SensitivityRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &SensitivityRegistry {
        self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one scenario against a portfolio, stamped with the current time.
    pub fn run_stress_test(
        &self,
        portfolio: &Portfolio,
        scenario: &RiskScenario,
    ) -> Result<StressTestResult> {
        self.run_stress_test_at(portfolio, scenario, Utc::now())
    }

    /// Run one scenario against a portfolio with an explicit timestamp.
    ///
    /// Inputs and registry coefficients are validated before any computation;
    /// on error no partial result is produced. The "before" value is `portfolio.total_value`
    /// verbatim, even when it disagrees with cash plus position values.
    pub fn run_stress_test_at(
        &self,
        portfolio: &Portfolio,
        scenario: &RiskScenario,
        timestamp: DateTime<Utc>,
    ) -> Result<StressTestResult> {
        validate_scenario(scenario)?;
        validate_portfolio(portfolio)?;
        self.registry.validate()?;

        tracing::debug!(
            scenario = %scenario.id,
            portfolio = %portfolio.id,
            positions = portfolio.positions.len(),
            factors = scenario.factors.len(),
            "Running stress test"
        );

        let computed_total = portfolio.computed_total_value();
        let gap = (portfolio.total_value - computed_total).abs();
        if gap > TOTAL_VALUE_TOLERANCE * computed_total.abs().max(1.0) {
            tracing::warn!(
                portfolio = %portfolio.id,
                total_value = portfolio.total_value,
                computed_total,
                "Portfolio total_value disagrees with cash plus positions; using total_value as-is"
            );
        }

        let factors = &scenario.factors;
        let registry = self.registry;
        let position_results: Vec<PositionStressResult> =
            maybe_parallel_map(&portfolio.positions, &self.config, |position| {
                evaluate_position(position, factors, registry)
            });

        // Summed sequentially in portfolio order regardless of how positions were evaluated
        let mut positions_after = 0.0;
        for result in &position_results {
            ensure_finite(&result.symbol, "stressed value", result.value_after)?;
            ensure_finite(&result.symbol, "absolute change", result.absolute_change)?;
            ensure_finite(&result.symbol, "percentage change", result.percentage_change)?;
            tracing::trace!(
                symbol = %result.symbol,
                total_impact = result.total_impact,
                value_after = result.value_after,
                "Evaluated position"
            );
            positions_after += result.value_after;
        }

        let portfolio_value_before = portfolio.total_value;
        let portfolio_value_after = portfolio.cash + positions_after;
        let absolute_change = portfolio_value_after - portfolio_value_before;
        let percentage_change = if portfolio_value_before != 0.0 {
            absolute_change / portfolio_value_before
        } else {
            0.0
        };

        let label = format!("portfolio {}", portfolio.id);
        ensure_finite(&label, "stressed value", portfolio_value_after)?;
        ensure_finite(&label, "absolute change", absolute_change)?;
        ensure_finite(&label, "percentage change", percentage_change)?;

        tracing::debug!(
            scenario = %scenario.id,
            absolute_change,
            percentage_change,
            "Stress test complete"
        );

        Ok(StressTestResult {
            scenario_id: scenario.id.clone(),
            scenario_name: scenario.name.clone(),
            portfolio_id: portfolio.id.clone(),
            cash: portfolio.cash,
            portfolio_value_before,
            portfolio_value_after,
            absolute_change,
            percentage_change,
            position_results,
            timestamp,
            metadata: scenario.metadata(),
        })
    }

    /// Run several scenarios in order, sharing one timestamp.
    ///
    /// Fails on the first invalid scenario.
    pub fn run_many(
        &self,
        portfolio: &Portfolio,
        scenarios: &[RiskScenario],
    ) -> Result<Vec<StressTestResult>> {
        let timestamp = Utc::now();
        scenarios
            .iter()
            .map(|scenario| self.run_stress_test_at(portfolio, scenario, timestamp))
            .collect()
    }
}

fn ensure_finite(subject: &str, quantity: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::NonFiniteResult(format!(
            "{} of {} is {}",
            quantity, subject, value
        )))
    }
}

/// The result with the most negative absolute change.
pub fn worst_scenario(results: &[StressTestResult]) -> Option<&StressTestResult> {
    results
        .iter()
        .min_by(|a, b| a.absolute_change.total_cmp(&b.absolute_change))
}

/// Reject a malformed scenario before any computation.
pub fn validate_scenario(scenario: &RiskScenario) -> Result<()> {
    if scenario.id.trim().is_empty() {
        return Err(Error::InvalidScenario("scenario id is empty".to_string()));
    }

    if let Some(probability) = scenario.probability {
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidScenario(format!(
                "probability of {} must be within [0, 1], got {}",
                scenario.id, probability
            )));
        }
    }

    for (index, factor) in scenario.factors.iter().enumerate() {
        if factor.factor_id.trim().is_empty() {
            return Err(Error::InvalidScenario(format!(
                "factor #{} of {} has an empty factor id",
                index, scenario.id
            )));
        }
        if !factor.shift_value.is_finite() {
            return Err(Error::InvalidInput(format!(
                "shift value for factor {} in {} is not finite: {}",
                factor.factor_id, scenario.id, factor.shift_value
            )));
        }
    }

    Ok(())
}

/// Reject non-finite or ambiguous portfolio data before any computation.
///
/// Duplicate symbols are compared case-insensitively.
pub fn validate_portfolio(portfolio: &Portfolio) -> Result<()> {
    if !portfolio.cash.is_finite() {
        return Err(Error::InvalidInput(format!(
            "cash of portfolio {} is not finite: {}",
            portfolio.id, portfolio.cash
        )));
    }
    if !portfolio.total_value.is_finite() {
        return Err(Error::InvalidInput(format!(
            "total value of portfolio {} is not finite: {}",
            portfolio.id, portfolio.total_value
        )));
    }

    let mut seen = HashSet::with_capacity(portfolio.positions.len());
    for position in &portfolio.positions {
        if position.symbol.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "portfolio {} has a position with an empty symbol",
                portfolio.id
            )));
        }
        if !position.value.is_finite() {
            return Err(Error::InvalidInput(format!(
                "value of {} is not finite: {}",
                position.symbol, position.value
            )));
        }
        // Symbols differing only in case name the same instrument
        if !seen.insert(position.symbol.to_uppercase()) {
            return Err(Error::InvalidInput(format!(
                "duplicate position symbol {}",
                position.symbol
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{INTEREST_RATE, MARKET};
    use crate::types::{AssetClass, Position, RiskFactorShift};
    use approx::assert_relative_eq;

    fn sample_portfolio() -> Portfolio {
        Portfolio::new("p1", 500.0).with_position(
            Position::new("XYZ", AssetClass::Equity, 1000.0).with_sector("Technology"),
        )
    }

    fn market_drop() -> RiskScenario {
        RiskScenario::new("market_drop", "Market drop")
            .with_description("Broad 10% equity selloff")
            .with_probability(0.05)
            .with_factor(RiskFactorShift::percentage(MARKET, -0.10))
    }

    #[test]
    fn test_portfolio_aggregation() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);

        let result = engine
            .run_stress_test(&sample_portfolio(), &market_drop())
            .unwrap();

        assert_eq!(result.scenario_id, "market_drop");
        assert_eq!(result.portfolio_id, "p1");
        assert_relative_eq!(result.portfolio_value_before, 1500.0);
        assert_relative_eq!(result.portfolio_value_after, 1380.0, epsilon = 1e-9);
        assert_relative_eq!(result.absolute_change, -120.0, epsilon = 1e-9);
        assert_relative_eq!(result.percentage_change, -0.08, epsilon = 1e-12);
        assert_eq!(result.cash, 500.0);
        assert_eq!(result.position_results.len(), 1);
    }

    #[test]
    fn test_metadata_echoes_scenario() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);

        let result = engine
            .run_stress_test(&sample_portfolio(), &market_drop())
            .unwrap();

        assert_eq!(result.metadata.name, "Market drop");
        assert_eq!(result.metadata.description, "Broad 10% equity selloff");
        assert_eq!(result.metadata.probability, Some(0.05));
        assert!(!result.metadata.is_historical);
    }

    #[test]
    fn test_results_keep_portfolio_order() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let portfolio = Portfolio::new("p2", 0.0)
            .with_position(Position::new("ZZZ", AssetClass::Crypto, 300.0))
            .with_position(Position::new("AAA", AssetClass::FixedIncome, 700.0))
            .with_position(Position::new("MMM", AssetClass::Etf, 100.0));

        let result = engine.run_stress_test(&portfolio, &market_drop()).unwrap();

        let symbols: Vec<&str> = result
            .position_results
            .iter()
            .map(|r| r.symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["ZZZ", "AAA", "MMM"]);
    }

    #[test]
    fn test_total_value_passthrough() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let mut portfolio = sample_portfolio();
        portfolio.total_value = 2000.0;

        let result = engine.run_stress_test(&portfolio, &market_drop()).unwrap();

        assert_relative_eq!(result.portfolio_value_before, 2000.0);
        assert_relative_eq!(result.portfolio_value_after, 1380.0, epsilon = 1e-9);
        assert_relative_eq!(result.absolute_change, -620.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_value_portfolio() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let portfolio = Portfolio::new("empty", 0.0);

        let result = engine.run_stress_test(&portfolio, &market_drop()).unwrap();

        assert_eq!(result.portfolio_value_after, 0.0);
        assert_eq!(result.percentage_change, 0.0);
    }

    #[test]
    fn test_rejects_empty_scenario_id() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let scenario = RiskScenario::new("  ", "Blank");

        let result = engine.run_stress_test(&sample_portfolio(), &scenario);
        assert!(matches!(result, Err(Error::InvalidScenario(_))));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let scenario = market_drop().with_probability(1.5);
        assert!(matches!(
            validate_scenario(&scenario),
            Err(Error::InvalidScenario(_))
        ));

        let scenario = market_drop().with_probability(f64::NAN);
        assert!(matches!(
            validate_scenario(&scenario),
            Err(Error::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_shift() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let scenario =
            market_drop().with_factor(RiskFactorShift::absolute(INTEREST_RATE, f64::NAN));

        let result = engine.run_stress_test(&sample_portfolio(), &scenario);
        match result {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains(INTEREST_RATE)),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_finite_position_naming_symbol() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let mut portfolio = sample_portfolio();
        portfolio.positions[0].value = f64::INFINITY;

        let result = engine.run_stress_test(&portfolio, &market_drop());
        match result {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("XYZ")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_finite_cash() {
        let mut portfolio = sample_portfolio();
        portfolio.cash = f64::NAN;
        assert!(matches!(
            validate_portfolio(&portfolio),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_symbols() {
        let portfolio =
            sample_portfolio().with_position(Position::new("xyz", AssetClass::Equity, 1.0));
        assert!(matches!(
            validate_portfolio(&portfolio),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_case_variant_duplicates_from_json() {
        let portfolio: Portfolio = serde_json::from_str(
            r#"{
                "id": "p3",
                "cash": 0.0,
                "total_value": 300.0,
                "positions": [
                    { "symbol": "aapl", "asset_class": "equity", "value": 100.0 },
                    { "symbol": "AAPL", "asset_class": "equity", "value": 200.0 }
                ]
            }"#,
        )
        .unwrap();

        match validate_portfolio(&portfolio) {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("AAPL")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_symbol_echoed_verbatim() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let portfolio = Portfolio::new("p4", 0.0)
            .with_position(Position::new("brk.b", AssetClass::Equity, 50.0));

        let result = engine.run_stress_test(&portfolio, &market_drop()).unwrap();
        assert_eq!(result.position_results[0].symbol, "brk.b");
    }

    #[test]
    fn test_rejects_non_finite_coefficient() {
        let mut registry = SensitivityRegistry::new();
        registry.set_asset_class_beta(AssetClass::Equity, f64::INFINITY);
        let engine = ScenarioEngine::new(&registry);

        let result = engine.run_stress_test(&sample_portfolio(), &market_drop());
        match result {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("equity")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_position_change_overflow_fails() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let portfolio = Portfolio::new("huge", 0.0)
            .with_position(Position::new("BIG", AssetClass::Equity, 1e308));
        let scenario = RiskScenario::new("wipeout", "Wipeout")
            .with_factor(RiskFactorShift::percentage(MARKET, -2.0));

        match engine.run_stress_test(&portfolio, &scenario) {
            Err(Error::NonFiniteResult(msg)) => {
                assert!(msg.contains("BIG"));
                assert!(msg.contains("absolute change"));
            }
            other => panic!("expected NonFiniteResult, got {:?}", other),
        }
    }

    #[test]
    fn test_portfolio_change_overflow_fails() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let mut portfolio = Portfolio::new("skewed", 0.0)
            .with_position(Position::new("BIG", AssetClass::Equity, 1e308));
        portfolio.total_value = -1e308;
        let scenario = RiskScenario::new("flat", "Flat");

        match engine.run_stress_test(&portfolio, &scenario) {
            Err(Error::NonFiniteResult(msg)) => {
                assert!(msg.contains("portfolio skewed"));
                assert!(msg.contains("absolute change"));
            }
            other => panic!("expected NonFiniteResult, got {:?}", other),
        }
    }

    #[test]
    fn test_run_many_and_worst_scenario() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let scenarios = vec![
            market_drop(),
            RiskScenario::new("rally", "Rally")
                .with_factor(RiskFactorShift::percentage(MARKET, 0.05)),
            RiskScenario::new("crash", "Crash")
                .with_factor(RiskFactorShift::percentage(MARKET, -0.30)),
        ];

        let results = engine.run_many(&sample_portfolio(), &scenarios).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].timestamp, results[2].timestamp);
        assert_eq!(worst_scenario(&results).unwrap().scenario_id, "crash");
        assert!(worst_scenario(&[]).is_none());
    }

    #[test]
    fn test_run_many_fails_fast() {
        let registry = SensitivityRegistry::new();
        let engine = ScenarioEngine::new(&registry);
        let scenarios = vec![market_drop(), RiskScenario::new("", "Broken")];

        let result = engine.run_many(&sample_portfolio(), &scenarios);
        assert!(matches!(result, Err(Error::InvalidScenario(_))));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let registry = SensitivityRegistry::new();
        let mut portfolio = Portfolio::new("big", 1000.0);
        for i in 0..400 {
            let asset_class = AssetClass::ALL[i % AssetClass::ALL.len()];
            portfolio.add_position(Position::new(
                &format!("SYM{}", i),
                asset_class,
                100.0 + i as f64 * 3.7,
            ));
        }
        let scenario = market_drop().with_factor(RiskFactorShift::absolute(INTEREST_RATE, 75.0));
        let timestamp = Utc::now();

        let sequential = ScenarioEngine::with_config(&registry, EngineConfig::sequential())
            .run_stress_test_at(&portfolio, &scenario, timestamp)
            .unwrap();
        let parallel =
            ScenarioEngine::with_config(&registry, EngineConfig::new().with_threshold(1))
                .run_stress_test_at(&portfolio, &scenario, timestamp)
                .unwrap();

        assert_eq!(sequential, parallel);
    }
}
